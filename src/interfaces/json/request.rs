use crate::application::validation::ValidationBody;
use crate::error::Result;
use serde_json::Value;

/// Parses a validation request body. Unknown actions and malformed bodies
/// are `InvalidRequest`.
pub fn parse_body(body: Value) -> Result<ValidationBody> {
    Ok(serde_json::from_value(body)?)
}
