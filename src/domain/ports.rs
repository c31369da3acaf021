use super::reservation::{FieldId, PaymentStatus, Reservation, ReservationId, ReservationPatch, UserId};
use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The stored state a transition was decided on.
///
/// Transitions such as `UNPAID -> UNPAID` leave the payment status
/// unchanged, so the revision is what detects an intervening write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExpectedState {
    pub payment_status: PaymentStatus,
    pub revision: u64,
}

impl ExpectedState {
    pub fn of(reservation: &Reservation) -> Self {
        Self {
            payment_status: reservation.payment_status,
            revision: reservation.revision,
        }
    }

    pub fn matches(&self, stored: &Reservation) -> bool {
        stored.payment_status == self.payment_status && stored.revision == self.revision
    }
}

/// Result of a conditional update.
#[derive(Debug, Clone, PartialEq)]
pub enum UpdateOutcome {
    Updated(Reservation),
    /// The stored record changed since it was read.
    Conflict { actual: PaymentStatus },
}

#[async_trait]
pub trait ReservationStore: Send + Sync {
    async fn find_by_id(&self, id: ReservationId) -> Result<Option<Reservation>>;

    /// Applies `patch` only if the stored record still matches `expected`.
    /// Check and write happen as one step.
    async fn conditional_update(
        &self,
        id: ReservationId,
        expected: ExpectedState,
        patch: &ReservationPatch,
    ) -> Result<UpdateOutcome>;

    async fn insert(&self, reservation: Reservation) -> Result<()>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: UserId,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldRecord {
    pub id: FieldId,
    pub name: String,
}

/// Lookup of the records a reservation refers to.
#[async_trait]
pub trait Directory: Send + Sync {
    async fn user(&self, id: UserId) -> Result<Option<UserRecord>>;
    async fn field(&self, id: FieldId) -> Result<Option<FieldRecord>>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Admin,
    User,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Caller {
    pub user_id: UserId,
    pub role: Role,
}

impl Caller {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

#[async_trait]
pub trait Authenticator: Send + Sync {
    /// Resolves a bearer token to a caller. Unknown tokens yield `None`.
    async fn authenticate(&self, token: &str) -> Result<Option<Caller>>;
}

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

pub type ReservationStoreBox = Box<dyn ReservationStore>;
pub type DirectoryBox = Box<dyn Directory>;
pub type AuthenticatorBox = Box<dyn Authenticator>;
pub type ClockBox = Box<dyn Clock>;
