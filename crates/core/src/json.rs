//! # Structural JSON
//!
//! Credentials are handled as insertion-ordered JSON objects. The crate
//! enables `serde_json`'s `preserve_order` feature so a parsed document
//! re-serializes with its keys in the order they were read or set.

pub use serde_json::{Map, Value};

use crate::{Error, Result};

/// Parse `text` into a JSON object.
///
/// # Errors
///
/// Returns [`Error::MalformedInput`] when `text` is not JSON, or when it is
/// JSON but not an object.
pub fn parse_object(text: &str) -> Result<Map<String, Value>> {
    let value: Value =
        serde_json::from_str(text).map_err(|e| Error::MalformedInput(e.to_string()))?;
    into_object(value)
}

/// Unwrap a JSON object.
///
/// # Errors
///
/// Returns [`Error::MalformedInput`] when `value` is not an object.
pub fn into_object(value: Value) -> Result<Map<String, Value>> {
    match value {
        Value::Object(map) => Ok(map),
        other => Err(Error::MalformedInput(format!("expected a JSON object, found {}", kind(&other)))),
    }
}

/// Deep-merge `overlay` into `target`.
///
/// Where both sides hold an object for the same key the merge recurses.
/// Otherwise the overlay value replaces the target value. Keys only present
/// in `target` are left untouched, and keys new to `target` are appended in
/// `overlay` order.
pub fn merge(target: &mut Map<String, Value>, overlay: &Map<String, Value>) {
    for (key, value) in overlay {
        match (target.get_mut(key), value) {
            (Some(Value::Object(existing)), Value::Object(incoming)) => merge(existing, incoming),
            _ => {
                target.insert(key.clone(), value.clone());
            }
        }
    }
}

/// A short name for the JSON type of `value`, for error messages.
#[must_use]
pub const fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
