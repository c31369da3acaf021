use super::view::{self, ReservationView};
use crate::application::validation::Validated;
use crate::domain::reservation::ReservationId;
use crate::error::{PaymentError, Result};
use serde::Serialize;
use std::io::Write;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationResponse {
    pub message: String,
    pub reservation: ReservationView,
}

impl From<&Validated> for ValidationResponse {
    fn from(validated: &Validated) -> Self {
        Self {
            message: validated.message.to_string(),
            reservation: view::project(&validated.reservation, &validated.related),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorBody {
    pub error: String,
    pub kind: &'static str,
}

impl From<&PaymentError> for ErrorBody {
    fn from(e: &PaymentError) -> Self {
        let error = if e.is_internal() {
            "Internal server error".to_string()
        } else {
            e.to_string()
        };
        Self {
            error,
            kind: e.kind(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Body {
    Ok(ValidationResponse),
    Error(ErrorBody),
}

/// A handled request as it would go back over the wire.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Outcome {
    pub reservation_id: ReservationId,
    pub status: u16,
    pub body: Body,
}

impl Outcome {
    pub fn from_result(
        reservation_id: ReservationId,
        result: &std::result::Result<Validated, PaymentError>,
    ) -> Self {
        match result {
            Ok(validated) => Self {
                reservation_id,
                status: 200,
                body: Body::Ok(validated.into()),
            },
            Err(e) => Self {
                reservation_id,
                status: e.status_code(),
                body: Body::Error(e.into()),
            },
        }
    }
}

/// Writes outcomes as JSON lines.
pub struct OutcomeWriter<W: Write> {
    writer: W,
}

impl<W: Write> OutcomeWriter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn write_outcome(&mut self, outcome: &Outcome) -> Result<()> {
        serde_json::to_writer(&mut self.writer, outcome)
            .map_err(|e| PaymentError::Internal(Box::new(e)))?;
        self.writer.write_all(b"\n")?;
        Ok(())
    }

    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}
