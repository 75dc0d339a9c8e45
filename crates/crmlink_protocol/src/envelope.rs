//! Response envelope helpers.
//!
//! The remote API is inconsistent about response shapes: list pages
//! carry their array under a kind-specific key or under `items`, and
//! create/update responses return the object either bare or wrapped
//! under the singular kind key. These helpers normalize both.

use crate::kind::EntityKind;
use crate::timestamp::parse_remote_timestamp;
use crate::ProtocolError;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

/// Extracts the item array from a list-page body.
///
/// Tries the kind-specific key first, then `items`. Any other shape
/// (including a null body from an empty response) yields an empty
/// page rather than an error.
pub fn page_items(kind: EntityKind, body: &Value) -> Vec<Value> {
    let array = body
        .get(kind.page_key())
        .and_then(Value::as_array)
        .or_else(|| body.get("items").and_then(Value::as_array));
    array.cloned().unwrap_or_default()
}

/// Unwraps a create/update response body to the object itself.
pub fn unwrap_envelope(kind: EntityKind, body: &Value) -> Value {
    match body.get(kind.envelope_key()) {
        Some(inner) if inner.is_object() => inner.clone(),
        _ => body.clone(),
    }
}

/// Extracts the remote record id from a payload.
pub fn remote_id(payload: &Value) -> Option<String> {
    payload
        .get("id")
        .and_then(Value::as_str)
        .map(str::to_owned)
}

/// Extracts the remote update timestamp from a payload.
///
/// Contacts carry `dateUpdated`, everything else `updatedAt`; both
/// are probed in that order.
pub fn remote_updated_at(payload: &Value) -> Option<DateTime<Utc>> {
    ["dateUpdated", "updatedAt"]
        .iter()
        .find_map(|key| payload.get(*key).and_then(Value::as_str))
        .and_then(parse_remote_timestamp)
}

/// Deserializes a JSON value into a typed payload.
pub fn from_value<T: DeserializeOwned>(value: Value) -> Result<T, ProtocolError> {
    serde_json::from_value(value).map_err(|e| ProtocolError::Malformed(e.to_string()))
}

/// Serializes a typed payload into a JSON value.
pub fn to_value<T: Serialize>(payload: &T) -> Result<Value, ProtocolError> {
    serde_json::to_value(payload).map_err(|e| ProtocolError::Malformed(e.to_string()))
}
