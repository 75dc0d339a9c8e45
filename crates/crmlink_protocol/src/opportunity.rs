//! Opportunity payload.

use serde::{Deserialize, Serialize};

/// An opportunity (deal) as the remote API represents it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RemoteOpportunity {
    /// Remote record id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Tenant scope the record belongs to.
    #[serde(rename = "locationId", default, skip_serializing_if = "Option::is_none")]
    pub location_id: Option<String>,
    /// Deal name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Expected revenue.
    #[serde(
        rename = "monetaryValue",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub monetary_value: Option<f64>,
    /// `open` or `closed`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    /// Remote id of the linked contact.
    #[serde(rename = "contactId", default, skip_serializing_if = "Option::is_none")]
    pub contact_id: Option<String>,
    /// Remote pipeline the deal sits in.
    #[serde(rename = "pipelineId", default, skip_serializing_if = "Option::is_none")]
    pub pipeline_id: Option<String>,
    /// Remote stage within the pipeline.
    #[serde(
        rename = "pipelineStageId",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub pipeline_stage_id: Option<String>,
    /// Remote user id the deal is assigned to.
    #[serde(rename = "assignedTo", default, skip_serializing_if = "Option::is_none")]
    pub assigned_to: Option<String>,
    /// Update timestamp.
    #[serde(rename = "updatedAt", default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

impl RemoteOpportunity {
    /// True unless the remote status is `closed`.
    pub fn is_open(&self) -> bool {
        self.status.as_deref() != Some("closed")
    }
}
