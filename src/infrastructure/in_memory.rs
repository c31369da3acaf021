use crate::domain::ports::{
    Authenticator, Caller, Directory, ExpectedState, FieldRecord, ReservationStore,
    UpdateOutcome, UserRecord,
};
use crate::domain::reservation::{FieldId, Reservation, ReservationId, ReservationPatch, UserId};
use crate::error::{PaymentError, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// A thread-safe in-memory store for reservations.
///
/// Uses `Arc<RwLock<HashMap<ReservationId, Reservation>>>` to allow shared
/// concurrent access. Conditional updates hold the write guard across the
/// state check and the write.
#[derive(Default, Clone)]
pub struct InMemoryReservationStore {
    reservations: Arc<RwLock<HashMap<ReservationId, Reservation>>>,
}

impl InMemoryReservationStore {
    /// Creates a new, empty in-memory reservation store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ReservationStore for InMemoryReservationStore {
    async fn find_by_id(&self, id: ReservationId) -> Result<Option<Reservation>> {
        let reservations = self.reservations.read().await;
        Ok(reservations.get(&id).cloned())
    }

    async fn conditional_update(
        &self,
        id: ReservationId,
        expected: ExpectedState,
        patch: &ReservationPatch,
    ) -> Result<UpdateOutcome> {
        let mut reservations = self.reservations.write().await;
        let reservation = reservations
            .get_mut(&id)
            .ok_or(PaymentError::NotFound(id))?;

        if !expected.matches(reservation) {
            return Ok(UpdateOutcome::Conflict {
                actual: reservation.payment_status,
            });
        }

        patch.apply(reservation);
        Ok(UpdateOutcome::Updated(reservation.clone()))
    }

    async fn insert(&self, reservation: Reservation) -> Result<()> {
        let mut reservations = self.reservations.write().await;
        reservations.insert(reservation.id, reservation);
        Ok(())
    }
}

/// Users and fields held in memory.
#[derive(Default, Clone)]
pub struct InMemoryDirectory {
    users: Arc<RwLock<HashMap<UserId, UserRecord>>>,
    fields: Arc<RwLock<HashMap<FieldId, FieldRecord>>>,
}

impl InMemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add_user(&self, user: UserRecord) {
        self.users.write().await.insert(user.id, user);
    }

    pub async fn add_field(&self, field: FieldRecord) {
        self.fields.write().await.insert(field.id, field);
    }
}

#[async_trait]
impl Directory for InMemoryDirectory {
    async fn user(&self, id: UserId) -> Result<Option<UserRecord>> {
        Ok(self.users.read().await.get(&id).cloned())
    }

    async fn field(&self, id: FieldId) -> Result<Option<FieldRecord>> {
        Ok(self.fields.read().await.get(&id).cloned())
    }
}

/// Resolves callers from a fixed token table.
#[derive(Default, Clone)]
pub struct StaticTokenAuthenticator {
    tokens: HashMap<String, Caller>,
}

impl StaticTokenAuthenticator {
    pub fn new(tokens: HashMap<String, Caller>) -> Self {
        Self { tokens }
    }

    pub fn with_token(mut self, token: impl Into<String>, caller: Caller) -> Self {
        self.tokens.insert(token.into(), caller);
        self
    }
}

#[async_trait]
impl Authenticator for StaticTokenAuthenticator {
    async fn authenticate(&self, token: &str) -> Result<Option<Caller>> {
        Ok(self.tokens.get(token).copied())
    }
}
