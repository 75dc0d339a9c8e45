//! Note adapter.

use super::{pull_contact_link, push_contact_link, EntityAdapter, MappingContext};
use crate::error::SyncResult;
use crate::local::{FieldValues, LocalRecord};
use crmlink_protocol::{from_value, to_value, EntityKind, RemoteNote};
use serde_json::Value;

/// Translates notes. The remote endpoint requires a body, so an
/// absent local body pushes as an empty string.
pub struct NoteAdapter;

impl EntityAdapter for NoteAdapter {
    fn kind(&self) -> EntityKind {
        EntityKind::Note
    }

    fn to_remote(&self, record: &LocalRecord, ctx: &MappingContext<'_>) -> SyncResult<Value> {
        let note = RemoteNote {
            location_id: Some(ctx.location_id.to_owned()),
            content: Some(record.field_str("body").unwrap_or("").to_owned()),
            contact_id: push_contact_link(record, ctx)?,
            ..Default::default()
        };
        Ok(to_value(&note)?)
    }

    fn from_remote(&self, payload: &Value, ctx: &MappingContext<'_>) -> SyncResult<FieldValues> {
        let note: RemoteNote = from_value(payload.clone())?;
        let mut fields = FieldValues::new();
        fields.insert(
            "body".into(),
            Value::from(note.content.unwrap_or_default()),
        );
        pull_contact_link(&mut fields, note.contact_id.as_deref(), ctx)?;
        Ok(fields)
    }
}

#[cfg(test)]
mod tests {
    use super::super::testutil::ContextFixture;
    use super::*;
    use serde_json::json;

    #[test]
    fn push_empty_body_becomes_empty_string() {
        let fixture = ContextFixture::new();
        let record = LocalRecord::new(1, FieldValues::new());

        let payload = NoteAdapter.to_remote(&record, &fixture.ctx()).unwrap();
        assert_eq!(payload["content"], "");
        assert_eq!(payload["locationId"], "loc1");
    }

    #[test]
    fn pull_links_contact() {
        let fixture = ContextFixture::new().with_contact_correlation(4, "abc123");
        let fields = NoteAdapter
            .from_remote(
                &json!({"id": "n1", "content": "Spoke today", "contactId": "abc123"}),
                &fixture.ctx(),
            )
            .unwrap();
        assert_eq!(fields["body"], "Spoke today");
        assert_eq!(fields["contact_id"], 4);
    }
}
