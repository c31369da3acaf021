use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

pub type ReservationId = u32;
pub type UserId = u32;
pub type FieldId = u32;

/// How the customer chose to pay. Fixed when the booking is created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMode {
    /// Down payment now, final settlement (pelunasan) later.
    Dp,
    Full,
}

impl PaymentMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMode::Dp => "DP",
            PaymentMode::Full => "FULL",
        }
    }
}

impl fmt::Display for PaymentMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    #[default]
    Unpaid,
    DpSubmitted,
    DpValidated,
    DpRejected,
    PelunasanSubmitted,
    PelunasanValidated,
    PelunasanRejected,
    FullValidated,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Unpaid => "UNPAID",
            PaymentStatus::DpSubmitted => "DP_SUBMITTED",
            PaymentStatus::DpValidated => "DP_VALIDATED",
            PaymentStatus::DpRejected => "DP_REJECTED",
            PaymentStatus::PelunasanSubmitted => "PELUNASAN_SUBMITTED",
            PaymentStatus::PelunasanValidated => "PELUNASAN_VALIDATED",
            PaymentStatus::PelunasanRejected => "PELUNASAN_REJECTED",
            PaymentStatus::FullValidated => "FULL_VALIDATED",
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReservationStatus {
    #[default]
    Pending,
    Confirmed,
    Rejected,
    Cancelled,
}

/// The three points at which an administrator signs off on a payment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Checkpoint {
    DownPayment,
    Pelunasan,
    Full,
}

impl Checkpoint {
    pub fn mode(&self) -> PaymentMode {
        match self {
            Checkpoint::DownPayment | Checkpoint::Pelunasan => PaymentMode::Dp,
            Checkpoint::Full => PaymentMode::Full,
        }
    }

    pub fn validated_status(&self) -> PaymentStatus {
        match self {
            Checkpoint::DownPayment => PaymentStatus::DpValidated,
            Checkpoint::Pelunasan => PaymentStatus::PelunasanValidated,
            Checkpoint::Full => PaymentStatus::FullValidated,
        }
    }

    /// Whether validating this checkpoint completes the payment for its mode.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Checkpoint::Pelunasan | Checkpoint::Full)
    }
}

/// Who signed off on a checkpoint, and when.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Validation {
    pub validator_id: UserId,
    pub validated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Checkpoints {
    pub down_payment: Option<Validation>,
    pub pelunasan: Option<Validation>,
    pub full: Option<Validation>,
}

impl Checkpoints {
    pub fn get(&self, checkpoint: Checkpoint) -> Option<&Validation> {
        match checkpoint {
            Checkpoint::DownPayment => self.down_payment.as_ref(),
            Checkpoint::Pelunasan => self.pelunasan.as_ref(),
            Checkpoint::Full => self.full.as_ref(),
        }
    }

    pub fn set(&mut self, checkpoint: Checkpoint, validation: Option<Validation>) {
        match checkpoint {
            Checkpoint::DownPayment => self.down_payment = validation,
            Checkpoint::Pelunasan => self.pelunasan = validation,
            Checkpoint::Full => self.full = validation,
        }
    }
}

/// Identifies one uploaded proof reference on a reservation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProofSlot {
    DownPayment,
    Pelunasan,
    /// Older uploads stored every receipt here; DP bookings may still carry one.
    Legacy,
    Full,
}

/// Payment evidence, keyed by the payment mode so that only the proofs that
/// make sense for a mode can exist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "payment_mode", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentPlan {
    Dp {
        #[serde(default)]
        dp_proof: Option<String>,
        #[serde(default)]
        pelunasan_proof: Option<String>,
        #[serde(default)]
        legacy_proof: Option<String>,
    },
    Full {
        #[serde(default)]
        full_proof: Option<String>,
    },
}

impl PaymentPlan {
    pub fn dp() -> Self {
        PaymentPlan::Dp {
            dp_proof: None,
            pelunasan_proof: None,
            legacy_proof: None,
        }
    }

    pub fn full() -> Self {
        PaymentPlan::Full { full_proof: None }
    }

    pub fn mode(&self) -> PaymentMode {
        match self {
            PaymentPlan::Dp { .. } => PaymentMode::Dp,
            PaymentPlan::Full { .. } => PaymentMode::Full,
        }
    }

    pub fn proof(&self, slot: ProofSlot) -> Option<&str> {
        match (self, slot) {
            (PaymentPlan::Dp { dp_proof, .. }, ProofSlot::DownPayment) => dp_proof.as_deref(),
            (PaymentPlan::Dp { pelunasan_proof, .. }, ProofSlot::Pelunasan) => {
                pelunasan_proof.as_deref()
            }
            (PaymentPlan::Dp { legacy_proof, .. }, ProofSlot::Legacy) => legacy_proof.as_deref(),
            (PaymentPlan::Full { full_proof }, ProofSlot::Full) => full_proof.as_deref(),
            _ => None,
        }
    }

    /// Sets a proof reference. Slots that do not exist for this mode are ignored.
    pub fn set_proof(&mut self, slot: ProofSlot, value: Option<String>) {
        match (self, slot) {
            (PaymentPlan::Dp { dp_proof, .. }, ProofSlot::DownPayment) => *dp_proof = value,
            (PaymentPlan::Dp { pelunasan_proof, .. }, ProofSlot::Pelunasan) => {
                *pelunasan_proof = value
            }
            (PaymentPlan::Dp { legacy_proof, .. }, ProofSlot::Legacy) => *legacy_proof = value,
            (PaymentPlan::Full { full_proof }, ProofSlot::Full) => *full_proof = value,
            _ => {}
        }
    }

    /// The receipt shown as "the" payment proof: the full-payment proof, or
    /// the legacy field on DP bookings.
    pub fn primary_proof(&self) -> Option<&str> {
        match self {
            PaymentPlan::Dp { legacy_proof, .. } => legacy_proof.as_deref(),
            PaymentPlan::Full { full_proof } => full_proof.as_deref(),
        }
    }

    /// Whether the payer has uploaded something an admin can act on for the
    /// given checkpoint. A DP checkpoint accepts the legacy proof as well.
    pub fn has_evidence_for(&self, checkpoint: Checkpoint) -> bool {
        match checkpoint {
            Checkpoint::DownPayment => {
                self.proof(ProofSlot::DownPayment).is_some()
                    || self.proof(ProofSlot::Legacy).is_some()
            }
            Checkpoint::Pelunasan => self.proof(ProofSlot::Pelunasan).is_some(),
            Checkpoint::Full => self.proof(ProofSlot::Full).is_some(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reservation {
    pub id: ReservationId,
    pub user_id: UserId,
    pub field_id: FieldId,
    pub reservation_date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub total_price: Decimal,
    #[serde(default)]
    pub notes: Option<String>,
    pub payment: PaymentPlan,
    #[serde(default)]
    pub payment_status: PaymentStatus,
    #[serde(default)]
    pub status: ReservationStatus,
    #[serde(default)]
    pub checkpoints: Checkpoints,
    #[serde(default)]
    pub paid_amount: Option<Decimal>,
    #[serde(default)]
    pub payment_notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Bumped by every applied patch.
    #[serde(default)]
    pub revision: u64,
}

impl Reservation {
    /// A freshly booked reservation: unpaid, pending, no proofs.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: ReservationId,
        user_id: UserId,
        field_id: FieldId,
        reservation_date: NaiveDate,
        start_time: NaiveTime,
        end_time: NaiveTime,
        total_price: Decimal,
        payment: PaymentPlan,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            user_id,
            field_id,
            reservation_date,
            start_time,
            end_time,
            total_price,
            notes: None,
            payment,
            payment_status: PaymentStatus::Unpaid,
            status: ReservationStatus::Pending,
            checkpoints: Checkpoints::default(),
            paid_amount: None,
            payment_notes: None,
            created_at,
            updated_at: created_at,
            revision: 0,
        }
    }

    pub fn mode(&self) -> PaymentMode {
        self.payment.mode()
    }

    /// The checkpoint currently waiting for an administrator, if any.
    pub fn pending_checkpoint(&self) -> Option<Checkpoint> {
        match (self.mode(), self.payment_status) {
            (PaymentMode::Dp, PaymentStatus::DpSubmitted) => Some(Checkpoint::DownPayment),
            (PaymentMode::Dp, PaymentStatus::PelunasanSubmitted) => Some(Checkpoint::Pelunasan),
            (PaymentMode::Full, PaymentStatus::Unpaid)
                if self.payment.has_evidence_for(Checkpoint::Full) =>
            {
                Some(Checkpoint::Full)
            }
            _ => None,
        }
    }
}

/// Field changes produced by a payment transition.
///
/// Only what is listed here is written; everything else on the record,
/// including the payment mode, stays as it was.
#[derive(Debug, Clone, PartialEq)]
pub struct ReservationPatch {
    pub payment_status: PaymentStatus,
    pub status: Option<ReservationStatus>,
    pub cleared_proofs: Vec<ProofSlot>,
    pub checkpoints: Vec<(Checkpoint, Option<Validation>)>,
    pub paid_amount: Option<Decimal>,
    pub payment_notes: Option<String>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl ReservationPatch {
    pub fn new(payment_status: PaymentStatus) -> Self {
        Self {
            payment_status,
            status: None,
            cleared_proofs: Vec::new(),
            checkpoints: Vec::new(),
            paid_amount: None,
            payment_notes: None,
            updated_at: None,
        }
    }

    pub fn apply(&self, reservation: &mut Reservation) {
        reservation.payment_status = self.payment_status;
        if let Some(status) = self.status {
            reservation.status = status;
        }
        for slot in &self.cleared_proofs {
            reservation.payment.set_proof(*slot, None);
        }
        for (checkpoint, validation) in &self.checkpoints {
            reservation.checkpoints.set(*checkpoint, *validation);
        }
        if let Some(amount) = self.paid_amount {
            reservation.paid_amount = Some(amount);
        }
        if let Some(notes) = &self.payment_notes {
            reservation.payment_notes = Some(notes.clone());
        }
        if let Some(updated_at) = self.updated_at {
            reservation.updated_at = updated_at;
        }
        reservation.revision += 1;
    }
}
