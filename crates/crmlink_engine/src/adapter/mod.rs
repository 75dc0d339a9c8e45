//! Entity adapters.
//!
//! One adapter per synced entity kind translates a local record into
//! a remote payload and back. Adapters are pure: they read the
//! reference mappings and correlation table through a
//! [`MappingContext`] but never mutate anything and never perform
//! I/O.
//!
//! Reference resolution is asymmetric by design. On push, a reference
//! that is present but unmapped aborts with
//! [`SyncError::MappingRequired`] — the engine never silently drops
//! it. On pull, an unmapped reference degrades: locally meaningful
//! pointers (assignee, stage) are cleared rather than left stale,
//! and contact linkage is simply left unset.

mod contact;
mod note;
mod opportunity;
mod task;

pub use contact::ContactAdapter;
pub use note::NoteAdapter;
pub use opportunity::OpportunityAdapter;
pub use task::TaskAdapter;

use crate::correlation::CorrelationStore;
use crate::error::{SyncError, SyncResult};
use crate::local::{FieldValues, LocalId, LocalRecord};
use crate::mapping::MappingStore;
use crmlink_protocol::EntityKind;
use serde_json::Value;

/// Read-only lookup context handed to adapters.
pub struct MappingContext<'a> {
    /// Tenant scope stamped into push payloads.
    pub location_id: &'a str,
    /// Reference-mapping tables (users, pipeline stages).
    pub mappings: &'a dyn MappingStore,
    /// Correlation table, for cross-entity linkage by remote id.
    pub correlations: &'a dyn CorrelationStore,
}

impl<'a> MappingContext<'a> {
    /// Remote contact id correlated with a local contact, if linked.
    pub fn remote_contact_for_local(&self, local_id: LocalId) -> SyncResult<Option<String>> {
        Ok(self
            .correlations
            .find_by_local(EntityKind::Contact, local_id)?
            .map(|c| c.remote_id))
    }

    /// Local contact id correlated with a remote contact, if linked.
    pub fn local_contact_for_remote(&self, remote_id: &str) -> SyncResult<Option<LocalId>> {
        Ok(self
            .correlations
            .find_by_remote(EntityKind::Contact, remote_id)?
            .map(|c| c.local_id))
    }
}

/// Translates records between the local schema and the remote API.
pub trait EntityAdapter: Send + Sync {
    /// The entity kind this adapter handles.
    fn kind(&self) -> EntityKind;

    /// Builds a remote payload from a local record. Fields absent
    /// locally are omitted from the payload.
    fn to_remote(&self, record: &LocalRecord, ctx: &MappingContext<'_>) -> SyncResult<Value>;

    /// Translates a remote payload into local field values. A `null`
    /// value clears the corresponding local field on update.
    fn from_remote(&self, payload: &Value, ctx: &MappingContext<'_>) -> SyncResult<FieldValues>;
}

/// Returns the adapter for a kind.
pub fn adapter_for(kind: EntityKind) -> &'static dyn EntityAdapter {
    match kind {
        EntityKind::Contact => &ContactAdapter,
        EntityKind::Opportunity => &OpportunityAdapter,
        EntityKind::Task => &TaskAdapter,
        EntityKind::Note => &NoteAdapter,
    }
}

/// Resolves the `assignee_user_id` field for a push payload.
///
/// Absent field: no assignee, omit. Present but unmapped: abort —
/// pushing would silently drop the assignment.
fn push_assignee(
    record: &LocalRecord,
    ctx: &MappingContext<'_>,
    entity: EntityKind,
) -> SyncResult<Option<String>> {
    match record.field_i64("assignee_user_id") {
        None => Ok(None),
        Some(local_user) => match ctx.mappings.remote_user_for_local(local_user)? {
            Some(remote_user) => Ok(Some(remote_user)),
            None => Err(SyncError::MappingRequired {
                entity,
                reference: "user".into(),
            }),
        },
    }
}

/// Resolves a pulled `assignedTo` into the local assignee field.
///
/// `None`: payload carries no assignee, leave the field untouched.
/// Mapped: link. Unmapped: clear, so the local assignment does not go
/// stale.
fn pull_assignee(
    fields: &mut FieldValues,
    assigned_to: Option<&str>,
    ctx: &MappingContext<'_>,
) -> SyncResult<()> {
    if let Some(remote_user) = assigned_to {
        match ctx.mappings.local_user_for_remote(remote_user)? {
            Some(local_user) => {
                fields.insert("assignee_user_id".into(), Value::from(local_user));
            }
            None => {
                fields.insert("assignee_user_id".into(), Value::Null);
            }
        }
    }
    Ok(())
}

/// Resolves a pulled `contactId` into the local contact link.
/// Link if found, else leave unset.
fn pull_contact_link(
    fields: &mut FieldValues,
    contact_id: Option<&str>,
    ctx: &MappingContext<'_>,
) -> SyncResult<()> {
    if let Some(remote_contact) = contact_id {
        if let Some(local_contact) = ctx.local_contact_for_remote(remote_contact)? {
            fields.insert("contact_id".into(), Value::from(local_contact));
        }
    }
    Ok(())
}

/// Remote contact id for the record's `contact_id` link, if the
/// contact is correlated; omitted otherwise.
fn push_contact_link(
    record: &LocalRecord,
    ctx: &MappingContext<'_>,
) -> SyncResult<Option<String>> {
    match record.field_i64("contact_id") {
        None => Ok(None),
        Some(local_contact) => ctx.remote_contact_for_local(local_contact),
    }
}

#[cfg(test)]
pub(crate) mod testutil {
    use super::*;
    use crate::correlation::{CorrelationRecord, MemoryCorrelationStore};
    use crate::mapping::{MemoryMappingStore, StageMapping, UserMapping};

    /// Fixture bundling the stores a `MappingContext` borrows.
    pub struct ContextFixture {
        pub mappings: MemoryMappingStore,
        pub correlations: MemoryCorrelationStore,
    }

    impl ContextFixture {
        pub fn new() -> Self {
            Self {
                mappings: MemoryMappingStore::new(),
                correlations: MemoryCorrelationStore::new(),
            }
        }

        pub fn with_user(self, local: i64, remote: &str) -> Self {
            self.mappings.set_user(UserMapping {
                local_user_id: Some(local),
                remote_user_id: remote.into(),
                display_name: String::new(),
                email: None,
            });
            self
        }

        pub fn with_stage(self, local: i64, pipeline: &str, stage: &str) -> Self {
            self.mappings.set_stage(StageMapping {
                local_stage_id: Some(local),
                remote_pipeline_id: pipeline.into(),
                remote_stage_id: stage.into(),
                pipeline_name: None,
                stage_name: None,
            });
            self
        }

        pub fn with_contact_correlation(self, local: LocalId, remote: &str) -> Self {
            self.correlations
                .upsert(CorrelationRecord::new(EntityKind::Contact, local, remote))
                .unwrap();
            self
        }

        pub fn ctx(&self) -> MappingContext<'_> {
            MappingContext {
                location_id: "loc1",
                mappings: &self.mappings,
                correlations: &self.correlations,
            }
        }
    }
}
