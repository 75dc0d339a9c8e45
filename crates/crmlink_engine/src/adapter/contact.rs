//! Contact adapter.

use super::{pull_assignee, push_assignee, EntityAdapter, MappingContext};
use crate::error::SyncResult;
use crate::local::{FieldValues, LocalRecord};
use crmlink_protocol::{from_value, to_value, EntityKind, RemoteContact};
use serde_json::Value;

/// Translates contacts.
///
/// The push path writes the whole local name into `firstName` and
/// always marks the record as a `customer`, matching the remote
/// endpoint's expectations.
pub struct ContactAdapter;

impl EntityAdapter for ContactAdapter {
    fn kind(&self) -> EntityKind {
        EntityKind::Contact
    }

    fn to_remote(&self, record: &LocalRecord, ctx: &MappingContext<'_>) -> SyncResult<Value> {
        let owned = |name: &str| record.field_str(name).map(str::to_owned);

        let contact = RemoteContact {
            location_id: Some(ctx.location_id.to_owned()),
            first_name: owned("name"),
            email: owned("email"),
            phone: owned("mobile").or_else(|| owned("phone")),
            address1: owned("street"),
            city: owned("city"),
            state: owned("state"),
            postal_code: owned("zip"),
            country: owned("country"),
            assigned_to: push_assignee(record, ctx, EntityKind::Contact)?,
            contact_type: Some("customer".into()),
            ..Default::default()
        };
        Ok(to_value(&contact)?)
    }

    fn from_remote(&self, payload: &Value, ctx: &MappingContext<'_>) -> SyncResult<FieldValues> {
        let contact: RemoteContact = from_value(payload.clone())?;
        let mut fields = FieldValues::new();

        fields.insert(
            "name".into(),
            Value::from(contact.display_name().unwrap_or("Unknown")),
        );
        let mut set = |name: &str, value: &Option<String>| {
            if let Some(v) = value {
                fields.insert(name.into(), Value::from(v.clone()));
            }
        };
        set("email", &contact.email);
        set("phone", &contact.phone);
        set("street", &contact.address1);
        set("city", &contact.city);
        set("state", &contact.state);
        set("zip", &contact.postal_code);
        set("country", &contact.country);

        pull_assignee(&mut fields, contact.assigned_to.as_deref(), ctx)?;
        Ok(fields)
    }
}
