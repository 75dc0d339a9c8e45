//! Opportunity adapter.

use super::{
    pull_assignee, pull_contact_link, push_assignee, push_contact_link, EntityAdapter,
    MappingContext,
};
use crate::error::{SyncError, SyncResult};
use crate::local::{FieldValues, LocalRecord};
use crmlink_protocol::{from_value, to_value, EntityKind, RemoteOpportunity};
use serde_json::Value;

/// Translates opportunities (deals).
///
/// Stage assignment is the one hard reference: a local stage with no
/// pipeline-stage mapping aborts the push, because the remote API
/// files every opportunity under a pipeline stage and dropping it
/// would misplace the deal.
pub struct OpportunityAdapter;

impl EntityAdapter for OpportunityAdapter {
    fn kind(&self) -> EntityKind {
        EntityKind::Opportunity
    }

    fn to_remote(&self, record: &LocalRecord, ctx: &MappingContext<'_>) -> SyncResult<Value> {
        let (pipeline_id, pipeline_stage_id) = match record.field_i64("stage_id") {
            None => (None, None),
            Some(local_stage) => match ctx.mappings.stage_for_local(local_stage)? {
                Some(mapping) => (
                    Some(mapping.remote_pipeline_id),
                    Some(mapping.remote_stage_id),
                ),
                None => {
                    return Err(SyncError::MappingRequired {
                        entity: EntityKind::Opportunity,
                        reference: "pipeline stage".into(),
                    })
                }
            },
        };

        let opportunity = RemoteOpportunity {
            location_id: Some(ctx.location_id.to_owned()),
            name: record.field_str("name").map(str::to_owned),
            monetary_value: Some(record.field_f64("expected_revenue").unwrap_or(0.0)),
            status: Some(if record.field_bool("active").unwrap_or(true) {
                "open".into()
            } else {
                "closed".into()
            }),
            contact_id: push_contact_link(record, ctx)?,
            pipeline_id,
            pipeline_stage_id,
            assigned_to: push_assignee(record, ctx, EntityKind::Opportunity)?,
            ..Default::default()
        };
        Ok(to_value(&opportunity)?)
    }

    fn from_remote(&self, payload: &Value, ctx: &MappingContext<'_>) -> SyncResult<FieldValues> {
        let opportunity: RemoteOpportunity = from_value(payload.clone())?;
        let mut fields = FieldValues::new();

        if let Some(name) = &opportunity.name {
            fields.insert("name".into(), Value::from(name.clone()));
        }
        fields.insert(
            "expected_revenue".into(),
            Value::from(opportunity.monetary_value.unwrap_or(0.0)),
        );
        fields.insert("active".into(), Value::from(opportunity.is_open()));

        pull_contact_link(&mut fields, opportunity.contact_id.as_deref(), ctx)?;

        if let (Some(pipeline), Some(stage)) = (
            opportunity.pipeline_id.as_deref(),
            opportunity.pipeline_stage_id.as_deref(),
        ) {
            match ctx.mappings.local_stage_for_remote(pipeline, stage)? {
                Some(local_stage) => {
                    fields.insert("stage_id".into(), Value::from(local_stage));
                }
                None => {
                    fields.insert("stage_id".into(), Value::Null);
                }
            }
        }

        pull_assignee(&mut fields, opportunity.assigned_to.as_deref(), ctx)?;
        Ok(fields)
    }
}

#[cfg(test)]
mod tests {
    use super::super::testutil::ContextFixture;
    use super::*;
    use serde_json::json;

    fn record(pairs: serde_json::Value) -> LocalRecord {
        LocalRecord::new(1, pairs.as_object().unwrap().clone())
    }

    #[test]
    fn push_payload_field_map() {
        let fixture = ContextFixture::new().with_contact_correlation(4, "abc123");
        let record = record(json!({
            "name": "Big deal",
            "expected_revenue": 1500.0,
            "active": true,
            "contact_id": 4,
        }));

        let payload = OpportunityAdapter
            .to_remote(&record, &fixture.ctx())
            .unwrap();
        assert_eq!(payload["name"], "Big deal");
        assert_eq!(payload["monetaryValue"], 1500.0);
        assert_eq!(payload["status"], "open");
        assert_eq!(payload["contactId"], "abc123");
        assert!(payload.get("pipelineId").is_none());
    }

    #[test]
    fn push_inactive_deal_is_closed_with_zero_default() {
        let fixture = ContextFixture::new();
        let record = record(json!({"name": "Lost", "active": false}));

        let payload = OpportunityAdapter
            .to_remote(&record, &fixture.ctx())
            .unwrap();
        assert_eq!(payload["status"], "closed");
        assert_eq!(payload["monetaryValue"], 0.0);
    }

    #[test]
    fn push_mapped_stage_expands_to_pipeline_pair() {
        let fixture = ContextFixture::new().with_stage(4, "pipe1", "s2");
        let record = record(json!({"name": "Deal", "stage_id": 4}));

        let payload = OpportunityAdapter
            .to_remote(&record, &fixture.ctx())
            .unwrap();
        assert_eq!(payload["pipelineId"], "pipe1");
        assert_eq!(payload["pipelineStageId"], "s2");
    }

    #[test]
    fn push_unmapped_stage_aborts() {
        let fixture = ContextFixture::new();
        let record = record(json!({"name": "Deal", "stage_id": 4}));

        let err = OpportunityAdapter
            .to_remote(&record, &fixture.ctx())
            .unwrap_err();
        assert!(matches!(
            err,
            SyncError::MappingRequired { entity: EntityKind::Opportunity, .. }
        ));
    }

    #[test]
    fn push_uncorrelated_contact_is_omitted() {
        let fixture = ContextFixture::new();
        let record = record(json!({"name": "Deal", "contact_id": 4}));

        let payload = OpportunityAdapter
            .to_remote(&record, &fixture.ctx())
            .unwrap();
        assert!(payload.get("contactId").is_none());
    }

    #[test]
    fn pull_links_contact_and_stage() {
        let fixture = ContextFixture::new()
            .with_contact_correlation(4, "abc123")
            .with_stage(9, "pipe1", "s2");

        let fields = OpportunityAdapter
            .from_remote(
                &json!({
                    "id": "o1",
                    "name": "Inbound",
                    "monetaryValue": 250.0,
                    "status": "open",
                    "contactId": "abc123",
                    "pipelineId": "pipe1",
                    "pipelineStageId": "s2",
                }),
                &fixture.ctx(),
            )
            .unwrap();

        assert_eq!(fields["contact_id"], 4);
        assert_eq!(fields["stage_id"], 9);
        assert_eq!(fields["expected_revenue"], 250.0);
        assert_eq!(fields["active"], true);
    }

    #[test]
    fn pull_unknown_contact_left_unset_unknown_stage_cleared() {
        let fixture = ContextFixture::new();
        let fields = OpportunityAdapter
            .from_remote(
                &json!({
                    "id": "o1",
                    "status": "closed",
                    "contactId": "ghost",
                    "pipelineId": "pipe1",
                    "pipelineStageId": "ghost",
                }),
                &fixture.ctx(),
            )
            .unwrap();

        assert!(fields.get("contact_id").is_none());
        assert_eq!(fields["stage_id"], Value::Null);
        assert_eq!(fields["active"], false);
    }
}
