use crate::domain::reservation::{PaymentMode, PaymentStatus, ReservationId};
use thiserror::Error;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Error, Debug)]
pub enum PaymentError {
    #[error("Unauthorized")]
    Unauthorized,
    #[error("Reservation {0} not found")]
    NotFound(ReservationId),
    #[error("{action} does not apply to {mode} payments")]
    InvalidMode {
        action: &'static str,
        mode: PaymentMode,
    },
    #[error("No proof available for {action}")]
    NoEvidence { action: &'static str },
    #[error("{action} is not allowed while payment status is {status}")]
    InvalidTransition {
        action: &'static str,
        status: PaymentStatus,
    },
    #[error("Reservation {id} was modified concurrently: read as {expected}, now {actual}")]
    Conflict {
        id: ReservationId,
        expected: PaymentStatus,
        actual: PaymentStatus,
    },
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
    #[error("Persistence error: {0}")]
    Persistence(BoxError),
    #[error("Internal error: {0}")]
    Internal(BoxError),
}

impl PaymentError {
    /// HTTP status code the error maps to at the request boundary.
    pub fn status_code(&self) -> u16 {
        match self {
            PaymentError::Unauthorized => 401,
            PaymentError::NotFound(_) => 404,
            PaymentError::InvalidMode { .. }
            | PaymentError::NoEvidence { .. }
            | PaymentError::InvalidTransition { .. }
            | PaymentError::Conflict { .. }
            | PaymentError::InvalidRequest(_) => 400,
            PaymentError::Persistence(_) | PaymentError::Internal(_) => 500,
        }
    }

    /// Stable name of the error kind, kept for monitoring even when the
    /// caller only sees a generic message.
    pub fn kind(&self) -> &'static str {
        match self {
            PaymentError::Unauthorized => "Unauthorized",
            PaymentError::NotFound(_) => "NotFound",
            PaymentError::InvalidMode { .. } => "InvalidModeError",
            PaymentError::NoEvidence { .. } => "NoEvidenceError",
            PaymentError::InvalidTransition { .. } => "InvalidTransitionError",
            PaymentError::Conflict { .. } => "ConflictError",
            PaymentError::InvalidRequest(_) => "InvalidRequest",
            PaymentError::Persistence(_) => "PersistenceError",
            PaymentError::Internal(_) => "InternalError",
        }
    }

    pub fn is_internal(&self) -> bool {
        self.status_code() >= 500
    }
}

impl From<serde_json::Error> for PaymentError {
    fn from(e: serde_json::Error) -> Self {
        PaymentError::InvalidRequest(e.to_string())
    }
}

impl From<std::io::Error> for PaymentError {
    fn from(e: std::io::Error) -> Self {
        PaymentError::Persistence(Box::new(e))
    }
}

#[cfg(feature = "storage-rocksdb")]
impl From<rocksdb::Error> for PaymentError {
    fn from(e: rocksdb::Error) -> Self {
        PaymentError::Persistence(Box::new(e))
    }
}

pub type Result<T> = std::result::Result<T, PaymentError>;
