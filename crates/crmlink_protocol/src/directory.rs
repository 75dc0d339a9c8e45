//! Directory payloads: users and pipelines.
//!
//! These feed the reference-mapping tables; they are pulled in full
//! (no incremental filter) when an operator refreshes the mappings.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A user account on the remote CRM.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RemoteUser {
    /// Remote user id.
    pub id: String,
    /// Full name, when the API provides one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Given name.
    #[serde(rename = "firstName", default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    /// Family name.
    #[serde(rename = "lastName", default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    /// Email address.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl RemoteUser {
    /// Display name: `name` when present, else first + last joined.
    pub fn display_name(&self) -> String {
        if let Some(name) = &self.name {
            return name.clone();
        }
        let joined = format!(
            "{} {}",
            self.first_name.as_deref().unwrap_or(""),
            self.last_name.as_deref().unwrap_or("")
        );
        joined.trim().to_owned()
    }
}

/// A pipeline with its embedded stages.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RemotePipeline {
    /// Remote pipeline id.
    pub id: String,
    /// Pipeline name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Stages within this pipeline.
    #[serde(default)]
    pub stages: Vec<RemoteStage>,
}

/// A stage within a pipeline.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RemoteStage {
    /// Remote stage id.
    pub id: String,
    /// Stage name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// Extracts the user array from a `/users/` response.
pub fn user_items(body: &Value) -> Vec<Value> {
    body.get("users")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default()
}

/// Extracts the pipeline array from a pipelines response.
pub fn pipeline_items(body: &Value) -> Vec<Value> {
    body.get("pipelines")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default()
}
