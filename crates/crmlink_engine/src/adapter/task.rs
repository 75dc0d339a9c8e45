//! Task adapter.

use super::{
    pull_assignee, pull_contact_link, push_assignee, push_contact_link, EntityAdapter,
    MappingContext,
};
use crate::error::SyncResult;
use crate::local::{FieldValues, LocalRecord};
use crmlink_protocol::{from_value, to_value, EntityKind, RemoteTask};
use serde_json::Value;

/// Translates tasks.
pub struct TaskAdapter;

impl EntityAdapter for TaskAdapter {
    fn kind(&self) -> EntityKind {
        EntityKind::Task
    }

    fn to_remote(&self, record: &LocalRecord, ctx: &MappingContext<'_>) -> SyncResult<Value> {
        let task = RemoteTask {
            location_id: Some(ctx.location_id.to_owned()),
            title: record.field_str("title").map(str::to_owned),
            description: record.field_str("description").map(str::to_owned),
            due_date: record.field_str("due_date").map(str::to_owned),
            contact_id: push_contact_link(record, ctx)?,
            assigned_to: push_assignee(record, ctx, EntityKind::Task)?,
            completed: record.field_bool("done"),
            ..Default::default()
        };
        Ok(to_value(&task)?)
    }

    fn from_remote(&self, payload: &Value, ctx: &MappingContext<'_>) -> SyncResult<FieldValues> {
        let task: RemoteTask = from_value(payload.clone())?;
        let mut fields = FieldValues::new();

        if let Some(title) = &task.title {
            fields.insert("title".into(), Value::from(title.clone()));
        }
        if let Some(description) = &task.description {
            fields.insert("description".into(), Value::from(description.clone()));
        }
        if let Some(due) = &task.due_date {
            fields.insert("due_date".into(), Value::from(due.clone()));
        }
        if let Some(completed) = task.completed {
            fields.insert("done".into(), Value::from(completed));
        }

        pull_contact_link(&mut fields, task.contact_id.as_deref(), ctx)?;
        pull_assignee(&mut fields, task.assigned_to.as_deref(), ctx)?;
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
            "title": "Call back",
            "description": "Discuss renewal",
            "due_date": "2024-03-01T09:00:00Z",
            "contact_id": 4,
        }));

        let payload = TaskAdapter.to_remote(&record, &fixture.ctx()).unwrap();
        assert_eq!(payload["title"], "Call back");
        assert_eq!(payload["dueDate"], "2024-03-01T09:00:00Z");
        assert_eq!(payload["contactId"], "abc123");
    }

    #[test]
    fn pull_round_trip_fields() {
        let fixture = ContextFixture::new().with_user(7, "u1");
        let fields = TaskAdapter
            .from_remote(
                &json!({
                    "id": "t1",
                    "title": "Follow up",
                    "dueDate": "2024-03-02T09:00:00Z",
                    "completed": true,
                    "assignedTo": "u1",
                }),
                &fixture.ctx(),
            )
            .unwrap();

        assert_eq!(fields["title"], "Follow up");
        assert_eq!(fields["due_date"], "2024-03-02T09:00:00Z");
        assert_eq!(fields["done"], true);
        assert_eq!(fields["assignee_user_id"], 7);
    }
}
