//! Request body parsing
//!
//! Browsers and serverless shims send the same payload as a JSON object, as a
//! JSON string holding the object, or not at all.

use serde_json::{Map, Value};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BodyError {
    #[error("{0}")]
    InvalidJson(#[from] serde_json::Error),
}

/// Parse a raw body: empty ⇒ `{}`, JSON string ⇒ parsed again
pub fn parse_body(raw: &[u8]) -> Result<Value, BodyError> {
    if raw.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Object(Map::new()));
    }

    match serde_json::from_slice::<Value>(raw)? {
        Value::String(inner) => Ok(serde_json::from_str(&inner)?),
        value => Ok(value),
    }
}
