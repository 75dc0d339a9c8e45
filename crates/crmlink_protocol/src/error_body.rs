//! Remote error-body parsing.

use serde::Deserialize;
use serde_json::Value;

/// A structured 4xx error body from the remote API.
///
/// Duplicate-record rejections carry the conflicting record's id in a
/// nested `meta` object; the push path uses it to link instead of
/// failing.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiErrorBody {
    /// HTTP status the remote echoed into the body.
    #[serde(rename = "statusCode", default)]
    pub status_code: Option<u16>,
    /// Human-readable message; string or array of strings.
    #[serde(default)]
    pub message: Option<Value>,
    /// Structured error metadata.
    #[serde(default)]
    pub meta: Option<ErrorMeta>,
}

/// Nested error metadata.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ErrorMeta {
    /// Conflicting contact id on duplicate-contact rejections.
    #[serde(rename = "contactId", default)]
    pub contact_id: Option<String>,
    /// Conflicting record id on other duplicate rejections.
    #[serde(default)]
    pub id: Option<String>,
    /// Which field matched the existing record.
    #[serde(rename = "matchingField", default)]
    pub matching_field: Option<String>,
}

impl ApiErrorBody {
    /// Parses an error body; `None` when the body is not JSON at all.
    pub fn parse(body: &str) -> Option<Self> {
        serde_json::from_str(body).ok()
    }

    /// The id of the already-existing record, when this is a
    /// duplicate-record rejection.
    pub fn duplicate_record_id(&self) -> Option<&str> {
        let meta = self.meta.as_ref()?;
        meta.contact_id.as_deref().or(meta.id.as_deref())
    }
}
