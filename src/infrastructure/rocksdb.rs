use crate::domain::ports::{ExpectedState, ReservationStore, UpdateOutcome};
use crate::domain::reservation::{Reservation, ReservationId, ReservationPatch};
use crate::error::{PaymentError, Result};
use async_trait::async_trait;
use rocksdb::{ColumnFamilyDescriptor, DB, Options};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Column Family for storing reservation records.
pub const CF_RESERVATIONS: &str = "reservations";

/// A persistent reservation store using RocksDB.
///
/// Records are stored as JSON under big-endian id keys. RocksDB has no
/// compare-and-set on plain values, so conditional updates run their
/// read-check-write under an async mutex shared by all clones.
#[derive(Clone)]
pub struct RocksDBStore {
    db: Arc<DB>,
    write_lock: Arc<Mutex<()>>,
}

impl RocksDBStore {
    /// Opens or creates a RocksDB instance at the specified path.
    ///
    /// Ensures that the "reservations" column family exists.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let cf_reservations = ColumnFamilyDescriptor::new(CF_RESERVATIONS, Options::default());
        let db = DB::open_cf_descriptors(&opts, path, vec![cf_reservations])?;

        Ok(Self {
            db: Arc::new(db),
            write_lock: Arc::new(Mutex::new(())),
        })
    }

    fn read(&self, id: ReservationId) -> Result<Option<Reservation>> {
        let cf = self.cf()?;
        match self.db.get_cf(cf, id.to_be_bytes())? {
            Some(bytes) => {
                let reservation = serde_json::from_slice(&bytes).map_err(|e| {
                    PaymentError::Persistence(Box::new(std::io::Error::new(
                        std::io::ErrorKind::InvalidData,
                        format!("Deserialization error: {}", e),
                    )))
                })?;
                Ok(Some(reservation))
            }
            None => Ok(None),
        }
    }

    fn write(&self, reservation: &Reservation) -> Result<()> {
        let cf = self.cf()?;
        let value = serde_json::to_vec(reservation).map_err(|e| {
            PaymentError::Persistence(Box::new(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!("Serialization error: {}", e),
            )))
        })?;
        self.db.put_cf(cf, reservation.id.to_be_bytes(), value)?;
        Ok(())
    }

    fn cf(&self) -> Result<&rocksdb::ColumnFamily> {
        self.db.cf_handle(CF_RESERVATIONS).ok_or_else(|| {
            PaymentError::Persistence(Box::new(std::io::Error::other(
                "Reservations column family not found",
            )))
        })
    }
}

#[async_trait]
impl ReservationStore for RocksDBStore {
    async fn find_by_id(&self, id: ReservationId) -> Result<Option<Reservation>> {
        self.read(id)
    }

    async fn conditional_update(
        &self,
        id: ReservationId,
        expected: ExpectedState,
        patch: &ReservationPatch,
    ) -> Result<UpdateOutcome> {
        let _guard = self.write_lock.lock().await;

        let mut reservation = self.read(id)?.ok_or(PaymentError::NotFound(id))?;
        if !expected.matches(&reservation) {
            return Ok(UpdateOutcome::Conflict {
                actual: reservation.payment_status,
            });
        }

        patch.apply(&mut reservation);
        self.write(&reservation)?;
        tracing::debug!(reservation_id = id, "reservation persisted to rocksdb");
        Ok(UpdateOutcome::Updated(reservation))
    }

    async fn insert(&self, reservation: Reservation) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        self.write(&reservation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::reservation::{PaymentPlan, PaymentStatus};
    use chrono::{NaiveDate, NaiveTime, TimeZone, Utc};
    use rust_decimal_macros::dec;
    use tempfile::tempdir;

    fn reservation() -> Reservation {
        let mut r = Reservation::new(
            42,
            1,
            1,
            NaiveDate::from_ymd_opt(2025, 11, 8).unwrap(),
            NaiveTime::from_hms_opt(8, 0, 0).unwrap(),
            NaiveTime::from_hms_opt(10, 0, 0).unwrap(),
            dec!(200000),
            PaymentPlan::Dp {
                dp_proof: Some("file.png".into()),
                pelunasan_proof: None,
                legacy_proof: None,
            },
            Utc.with_ymd_and_hms(2025, 11, 1, 0, 0, 0).unwrap(),
        );
        r.payment_status = PaymentStatus::DpSubmitted;
        r
    }

    #[tokio::test]
    async fn test_rocksdb_open_cf() {
        let dir = tempdir().unwrap();
        let store = RocksDBStore::open(dir.path()).expect("Failed to open RocksDB");

        assert!(store.db.cf_handle(CF_RESERVATIONS).is_some());
    }

    #[tokio::test]
    async fn test_rocksdb_reservation_store() {
        let dir = tempdir().unwrap();
        let store = RocksDBStore::open(dir.path()).unwrap();

        store.insert(reservation()).await.unwrap();
        let retrieved = store.find_by_id(42).await.unwrap().unwrap();
        assert_eq!(retrieved, reservation());

        assert!(store.find_by_id(2).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_rocksdb_conditional_update() {
        let dir = tempdir().unwrap();
        let store = RocksDBStore::open(dir.path()).unwrap();
        store.insert(reservation()).await.unwrap();

        let read = ExpectedState::of(&reservation());
        let patch = ReservationPatch::new(PaymentStatus::DpValidated);
        let first = store.conditional_update(42, read, &patch).await.unwrap();
        assert!(matches!(first, UpdateOutcome::Updated(_)));
        assert_eq!(store.find_by_id(42).await.unwrap().unwrap().revision, 1);

        let second = store
            .conditional_update(42, read, &patch)
            .await
            .unwrap();
        assert_eq!(
            second,
            UpdateOutcome::Conflict {
                actual: PaymentStatus::DpValidated
            }
        );
    }
}
