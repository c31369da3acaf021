#![allow(dead_code)]

use async_trait::async_trait;
use booking_payments::application::validation::{
    Validated, ValidationBody, ValidationHandler, ValidationRequest,
};
use booking_payments::domain::payment::PaymentAction;
use booking_payments::domain::ports::{
    Caller, ExpectedState, FieldRecord, ReservationStore, ReservationStoreBox, Role,
    UpdateOutcome, UserRecord,
};
use booking_payments::domain::reservation::{
    PaymentPlan, PaymentStatus, Reservation, ReservationId, ReservationPatch,
};
use booking_payments::error::{PaymentError, Result};
use booking_payments::infrastructure::clock::FixedClock;
use booking_payments::infrastructure::in_memory::{
    InMemoryDirectory, InMemoryReservationStore, StaticTokenAuthenticator,
};
use booking_payments::interfaces::json::response::ValidationResponse;
use booking_payments::interfaces::json::view::ReservationView;
use chrono::{NaiveDate, NaiveTime, TimeZone, Utc};
use rust_decimal_macros::dec;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::Barrier;

pub const ADMIN_TOKEN: &str = "admin-token";
pub const ADMIN_ID: u32 = 7;

pub fn booking(id: ReservationId, payment: PaymentPlan, status: PaymentStatus) -> Reservation {
    let mut r = Reservation::new(
        id,
        5,
        3,
        NaiveDate::from_ymd_opt(2025, 11, 8).unwrap(),
        NaiveTime::from_hms_opt(19, 0, 0).unwrap(),
        NaiveTime::from_hms_opt(21, 0, 0).unwrap(),
        dec!(300000),
        payment,
        Utc.with_ymd_and_hms(2025, 11, 1, 8, 0, 0).unwrap(),
    );
    r.payment_status = status;
    r
}

pub fn dp_plan(dp: Option<&str>, pelunasan: Option<&str>, legacy: Option<&str>) -> PaymentPlan {
    PaymentPlan::Dp {
        dp_proof: dp.map(str::to_string),
        pelunasan_proof: pelunasan.map(str::to_string),
        legacy_proof: legacy.map(str::to_string),
    }
}

pub fn full_plan(proof: Option<&str>) -> PaymentPlan {
    PaymentPlan::Full {
        full_proof: proof.map(str::to_string),
    }
}

pub fn request(
    reservation_id: ReservationId,
    action: PaymentAction,
    admin_notes: Option<&str>,
) -> ValidationRequest {
    ValidationRequest {
        reservation_id,
        token: Some(ADMIN_TOKEN.to_string()),
        body: ValidationBody {
            action,
            admin_notes: admin_notes.map(str::to_string),
        },
    }
}

/// The external view of a handled request.
pub fn view(validated: &Validated) -> ReservationView {
    ValidationResponse::from(validated).reservation
}

pub async fn handler(store: ReservationStoreBox) -> ValidationHandler {
    let directory = InMemoryDirectory::new();
    directory
        .add_user(UserRecord {
            id: ADMIN_ID,
            name: "Admin".into(),
            email: "admin@example.com".into(),
            phone: None,
        })
        .await;
    directory
        .add_field(FieldRecord {
            id: 3,
            name: "Futsal A".into(),
        })
        .await;
    let auth = StaticTokenAuthenticator::default().with_token(
        ADMIN_TOKEN,
        Caller {
            user_id: ADMIN_ID,
            role: Role::Admin,
        },
    );
    ValidationHandler::new(store, Box::new(directory), Box::new(auth)).with_clock(Box::new(
        FixedClock(Utc.with_ymd_and_hms(2025, 11, 7, 12, 0, 0).unwrap()),
    ))
}

/// Counts conditional updates reaching the wrapped store.
#[derive(Clone, Default)]
pub struct CountingStore {
    pub inner: InMemoryReservationStore,
    pub writes: Arc<AtomicUsize>,
}

impl CountingStore {
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ReservationStore for CountingStore {
    async fn find_by_id(&self, id: ReservationId) -> Result<Option<Reservation>> {
        self.inner.find_by_id(id).await
    }

    async fn conditional_update(
        &self,
        id: ReservationId,
        expected: ExpectedState,
        patch: &ReservationPatch,
    ) -> Result<UpdateOutcome> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.inner.conditional_update(id, expected, patch).await
    }

    async fn insert(&self, reservation: Reservation) -> Result<()> {
        self.inner.insert(reservation).await
    }
}

/// Holds every reader until `parties` loads have happened, so that
/// concurrent requests all decide on the same snapshot.
#[derive(Clone)]
pub struct BarrierStore {
    pub inner: InMemoryReservationStore,
    pub barrier: Arc<Barrier>,
    /// Writes moving to this status are delayed, which fixes who commits first.
    pub held: Option<(PaymentStatus, Duration)>,
}

impl BarrierStore {
    pub fn new(parties: usize) -> Self {
        Self {
            inner: InMemoryReservationStore::new(),
            barrier: Arc::new(Barrier::new(parties)),
            held: None,
        }
    }

    pub fn holding(mut self, status: PaymentStatus, delay: Duration) -> Self {
        self.held = Some((status, delay));
        self
    }
}

#[async_trait]
impl ReservationStore for BarrierStore {
    async fn find_by_id(&self, id: ReservationId) -> Result<Option<Reservation>> {
        let found = self.inner.find_by_id(id).await;
        self.barrier.wait().await;
        found
    }

    async fn conditional_update(
        &self,
        id: ReservationId,
        expected: ExpectedState,
        patch: &ReservationPatch,
    ) -> Result<UpdateOutcome> {
        if let Some((status, delay)) = self.held {
            if patch.payment_status == status {
                tokio::time::sleep(delay).await;
            }
        }
        self.inner.conditional_update(id, expected, patch).await
    }

    async fn insert(&self, reservation: Reservation) -> Result<()> {
        self.inner.insert(reservation).await
    }
}

/// Reads succeed, writes fail like a lost database connection.
#[derive(Clone, Default)]
pub struct FailingWriteStore {
    pub inner: InMemoryReservationStore,
}

#[async_trait]
impl ReservationStore for FailingWriteStore {
    async fn find_by_id(&self, id: ReservationId) -> Result<Option<Reservation>> {
        self.inner.find_by_id(id).await
    }

    async fn conditional_update(
        &self,
        _id: ReservationId,
        _expected: ExpectedState,
        _patch: &ReservationPatch,
    ) -> Result<UpdateOutcome> {
        Err(PaymentError::Persistence(Box::new(std::io::Error::new(
            std::io::ErrorKind::ConnectionReset,
            "connection reset by peer",
        ))))
    }

    async fn insert(&self, reservation: Reservation) -> Result<()> {
        self.inner.insert(reservation).await
    }
}
