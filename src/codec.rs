//! # Payload Codec
//!
//! Maps arbitrary cacheable values to Secret Manager payload bytes and back.
//!
//! Secret Manager stores raw bytes with no content type, so the mapping is
//! self-describing rather than tagged: plain strings are stored verbatim
//! (no quoting or escaping), everything else is JSON-encoded. On read, JSON
//! decoding is attempted first and wins whenever it syntactically succeeds —
//! including the literal `null` — otherwise the raw bytes come back as text.
//!
//! This is a heuristic, and it is ambiguous on purpose: a stored plain
//! string that happens to be valid JSON (the text `42`, or `true`) is
//! reinterpreted as a number or boolean on read. The ambiguity matches the
//! plain-text convention of secrets written by other tools (gcloud, console)
//! and is a documented limitation, not a bug.

use serde::Serialize;
use serde_json::Value;

use crate::error::CacheError;

/// Encode a value for storage.
///
/// Strings are stored verbatim; anything else becomes JSON text.
///
/// # Errors
/// Returns [`CacheError::Unserializable`] if the value cannot be represented
/// as JSON (e.g. a map with non-string keys). Raised before any backend call.
pub fn encode<T: Serialize + ?Sized>(value: &T) -> Result<String, CacheError> {
    match serde_json::to_value(value)? {
        Value::String(text) => Ok(text),
        other => Ok(serde_json::to_string(&other)?),
    }
}

/// Decode a stored payload.
///
/// JSON decoding is authoritative when it succeeds (including `null`);
/// anything that fails to parse is returned as a text string. Decoding is
/// opportunistic and never fails.
#[must_use]
pub fn decode(data: &[u8]) -> Value {
    match serde_json::from_slice::<Value>(data) {
        Ok(value) => value,
        Err(_) => Value::String(String::from_utf8_lossy(data).into_owned()),
    }
}
