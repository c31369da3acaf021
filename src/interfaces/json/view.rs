//! External shape of a reservation.
//!
//! Pure structural mapping from the stored record plus its related user,
//! field and validator records. Every input maps to a view.

use crate::application::validation::Related;
use crate::domain::ports::UserRecord;
use crate::domain::reservation::{
    Checkpoint, FieldId, PaymentMode, PaymentStatus, ProofSlot, Reservation, ReservationId,
    ReservationStatus, UserId, Validation,
};
use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AdminRef {
    pub id: UserId,
    pub name: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserRef {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldRef {
    pub id: FieldId,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReservationView {
    pub id: ReservationId,
    pub user_id: UserId,
    pub field_id: FieldId,
    pub field_name: Option<String>,
    pub reservation_date: String,
    pub start_time: String,
    pub end_time: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_price: Decimal,
    pub status: ReservationStatus,
    pub payment_status: PaymentStatus,
    pub payment_type: PaymentMode,
    #[serde(with = "rust_decimal::serde::float_option")]
    pub payment_amount: Option<Decimal>,
    pub payment_proof: Option<String>,
    pub dp_proof: Option<String>,
    pub pelunasan_proof: Option<String>,
    pub payment_notes: Option<String>,
    pub notes: Option<String>,
    pub payment_validated_by: Option<UserId>,
    pub payment_validated_at: Option<String>,
    pub payment_validated_admin: Option<AdminRef>,
    pub dp_validated_by: Option<UserId>,
    pub dp_validated_at: Option<String>,
    pub dp_validated_admin: Option<AdminRef>,
    pub pelunasan_validated_by: Option<UserId>,
    pub pelunasan_validated_at: Option<String>,
    pub pelunasan_validated_admin: Option<AdminRef>,
    pub created_at: String,
    pub updated_at: String,
    pub user: Option<UserRef>,
    pub field: Option<FieldRef>,
}

/// Formats an instant the way clients expect: RFC 3339, millisecond
/// precision, `Z` suffix.
pub fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn date(day: NaiveDate) -> String {
    format!("{}T00:00:00.000Z", day.format("%Y-%m-%d"))
}

fn admin(validation: Option<&Validation>, record: Option<&UserRecord>) -> Option<AdminRef> {
    validation.map(|v| {
        // The validator block exists whenever the stamp does, even if the
        // user record has since disappeared.
        let record = record.filter(|r| r.id == v.validator_id);
        AdminRef {
            id: v.validator_id,
            name: record.map(|r| r.name.clone()),
            email: record.map(|r| r.email.clone()),
        }
    })
}

pub fn project(reservation: &Reservation, related: &Related) -> ReservationView {
    let checkpoints = &reservation.checkpoints;
    let dp = checkpoints.get(Checkpoint::DownPayment);
    let pelunasan = checkpoints.get(Checkpoint::Pelunasan);
    let full = checkpoints.get(Checkpoint::Full);

    ReservationView {
        id: reservation.id,
        user_id: reservation.user_id,
        field_id: reservation.field_id,
        field_name: related.field.as_ref().map(|f| f.name.clone()),
        reservation_date: date(reservation.reservation_date),
        start_time: reservation.start_time.format("%H:%M").to_string(),
        end_time: reservation.end_time.format("%H:%M").to_string(),
        total_price: reservation.total_price,
        status: reservation.status,
        payment_status: reservation.payment_status,
        payment_type: reservation.mode(),
        payment_amount: reservation.paid_amount,
        payment_proof: reservation.payment.primary_proof().map(str::to_string),
        dp_proof: reservation
            .payment
            .proof(ProofSlot::DownPayment)
            .map(str::to_string),
        pelunasan_proof: reservation
            .payment
            .proof(ProofSlot::Pelunasan)
            .map(str::to_string),
        payment_notes: reservation.payment_notes.clone(),
        notes: reservation.notes.clone(),
        payment_validated_by: full.map(|v| v.validator_id),
        payment_validated_at: full.map(|v| timestamp(v.validated_at)),
        payment_validated_admin: admin(full, related.payment_validator.as_ref()),
        dp_validated_by: dp.map(|v| v.validator_id),
        dp_validated_at: dp.map(|v| timestamp(v.validated_at)),
        dp_validated_admin: admin(dp, related.dp_validator.as_ref()),
        pelunasan_validated_by: pelunasan.map(|v| v.validator_id),
        pelunasan_validated_at: pelunasan.map(|v| timestamp(v.validated_at)),
        pelunasan_validated_admin: admin(pelunasan, related.pelunasan_validator.as_ref()),
        created_at: timestamp(reservation.created_at),
        updated_at: timestamp(reservation.updated_at),
        user: related.user.as_ref().map(|u| UserRef {
            id: u.id,
            name: u.name.clone(),
            email: u.email.clone(),
            phone: u.phone.clone(),
        }),
        field: related.field.as_ref().map(|f| FieldRef {
            id: f.id,
            name: f.name.clone(),
        }),
    }
}
