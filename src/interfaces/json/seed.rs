use crate::domain::ports::{Caller, FieldRecord, ReservationStore, UserRecord};
use crate::domain::reservation::Reservation;
use crate::error::Result;
use crate::infrastructure::in_memory::{InMemoryDirectory, StaticTokenAuthenticator};
use serde::Deserialize;
use std::collections::HashMap;
use std::io::Read;

/// Initial data for a run: who exists, which tokens they hold, and the
/// reservations to act on.
#[derive(Debug, Default, Deserialize)]
pub struct Seed {
    #[serde(default)]
    pub users: Vec<UserRecord>,
    #[serde(default)]
    pub fields: Vec<FieldRecord>,
    #[serde(default)]
    pub tokens: HashMap<String, Caller>,
    #[serde(default)]
    pub reservations: Vec<Reservation>,
}

impl Seed {
    pub fn from_reader<R: Read>(source: R) -> Result<Self> {
        Ok(serde_json::from_reader(source)?)
    }

    /// Loads the seed into the given collaborators.
    ///
    /// Reservations already present in the store are left untouched, so a
    /// persistent store keeps the state of earlier runs.
    pub async fn install(
        self,
        store: &dyn ReservationStore,
        directory: &InMemoryDirectory,
    ) -> Result<StaticTokenAuthenticator> {
        for user in self.users {
            directory.add_user(user).await;
        }
        for field in self.fields {
            directory.add_field(field).await;
        }
        for reservation in self.reservations {
            if store.find_by_id(reservation.id).await?.is_some() {
                tracing::debug!(reservation_id = reservation.id, "already stored, skipping seed");
                continue;
            }
            store.insert(reservation).await?;
        }
        Ok(StaticTokenAuthenticator::new(self.tokens))
    }
}
