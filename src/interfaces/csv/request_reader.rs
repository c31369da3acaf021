use crate::domain::reservation::ReservationId;
use crate::error::{PaymentError, Result};
use serde::Deserialize;
use std::io::Read;

/// One validation request from a batch file.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RequestRecord {
    pub reservation_id: ReservationId,
    /// Bearer token of the caller; empty means anonymous.
    pub token: Option<String>,
    /// Raw action name; checked when the body is parsed.
    pub action: String,
    pub admin_notes: Option<String>,
}

/// Reads validation requests from a CSV source.
///
/// Columns: `reservation_id, token, action, admin_notes`. Whitespace is
/// trimmed and trailing columns may be omitted.
pub struct RequestReader<R: Read> {
    reader: csv::Reader<R>,
}

impl<R: Read> RequestReader<R> {
    pub fn new(source: R) -> Self {
        let reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(source);
        Self { reader }
    }

    /// Lazily deserializes requests so that large batches stream.
    pub fn requests(self) -> impl Iterator<Item = Result<RequestRecord>> {
        self.reader.into_deserialize().map(|result| {
            result.map_err(|e| PaymentError::InvalidRequest(format!("CSV error: {}", e)))
        })
    }
}
