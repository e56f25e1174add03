//! Request body shape checks.
//!
//! Bodies are parsed as loose JSON first and then checked field by field, so
//! every rejection names the field at fault.

use serde_json::{Map, Value};
use thiserror::Error;

/// Why a request body was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Invalid JSON")]
    InvalidJson,

    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("Invalid field {field}: {reason}")]
    InvalidField { field: &'static str, reason: String },

    #[error("Text zu kurz. {word_count} Wörter, mindestens {minimum} erforderlich.")]
    TooShort { word_count: usize, minimum: usize },
}

impl ValidationError {
    /// The offending field, when there is one.
    pub fn field(&self) -> Option<&'static str> {
        match self {
            ValidationError::MissingField(f) => Some(*f),
            ValidationError::InvalidField { field, .. } => Some(*field),
            ValidationError::TooShort { .. } => Some("text"),
            ValidationError::InvalidJson => None,
        }
    }

    pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        ValidationError::InvalidField {
            field,
            reason: reason.into(),
        }
    }
}

/// Parse a request body into a JSON object. An empty body is an empty object.
pub fn parse_object(body: &[u8]) -> Result<Map<String, Value>, ValidationError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Map::new());
    }
    match serde_json::from_slice(body) {
        Ok(Value::Object(map)) => Ok(map),
        _ => Err(ValidationError::InvalidJson),
    }
}

/// Treat JSON `null` like an absent field.
fn present<'a>(obj: &'a Map<String, Value>, field: &str) -> Option<&'a Value> {
    obj.get(field).filter(|v| !v.is_null())
}

/// A required string that is not blank.
pub fn require_text<'a>(obj: &'a Map<String, Value>, field: &'static str) -> Result<&'a str, ValidationError> {
    match present(obj, field) {
        None => Err(ValidationError::MissingField(field)),
        Some(Value::String(s)) if s.trim().is_empty() => Err(ValidationError::MissingField(field)),
        Some(Value::String(s)) => Ok(s.as_str()),
        Some(_) => Err(ValidationError::invalid(field, "expected a string")),
    }
}

/// An optional string; blank counts as absent.
pub fn optional_text<'a>(
    obj: &'a Map<String, Value>,
    field: &'static str,
) -> Result<Option<&'a str>, ValidationError> {
    match present(obj, field) {
        None => Ok(None),
        Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.as_str())),
        Some(_) => Err(ValidationError::invalid(field, "expected a string")),
    }
}

/// A required JSON object.
pub fn require_object<'a>(
    obj: &'a Map<String, Value>,
    field: &'static str,
) -> Result<&'a Map<String, Value>, ValidationError> {
    match present(obj, field) {
        None => Err(ValidationError::MissingField(field)),
        Some(Value::Object(map)) => Ok(map),
        Some(_) => Err(ValidationError::invalid(field, "expected an object")),
    }
}

/// Whitespace-separated word count of trimmed text.
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}
