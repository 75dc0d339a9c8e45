//! Correlation between local and remote records.

use crate::error::SyncResult;
use crate::local::LocalId;
use chrono::{DateTime, Utc};
use crmlink_protocol::EntityKind;
use parking_lot::RwLock;
use std::collections::HashMap;

/// The durable link between a local record and its remote
/// counterpart.
///
/// Invariants: per entity kind, `remote_id` is unique across all
/// correlations, and a local record has at most one live correlation.
#[derive(Debug, Clone, PartialEq)]
pub struct CorrelationRecord {
    /// Entity kind this correlation belongs to.
    pub entity: EntityKind,
    /// Local record id.
    pub local_id: LocalId,
    /// Remote record id.
    pub remote_id: String,
    /// Last `updatedAt` the remote reported for this record.
    pub remote_updated_at: Option<DateTime<Utc>>,
    /// When this record was last synced in either direction.
    pub last_synced_at: Option<DateTime<Utc>>,
}

impl CorrelationRecord {
    /// Creates a correlation linking `local_id` to `remote_id`.
    pub fn new(entity: EntityKind, local_id: LocalId, remote_id: impl Into<String>) -> Self {
        Self {
            entity,
            local_id,
            remote_id: remote_id.into(),
            remote_updated_at: None,
            last_synced_at: None,
        }
    }
}

/// Storage for correlation records.
pub trait CorrelationStore: Send + Sync {
    /// Looks up the correlation for a local record.
    fn find_by_local(&self, kind: EntityKind, local_id: LocalId)
        -> SyncResult<Option<CorrelationRecord>>;

    /// Looks up the correlation holding a remote id.
    fn find_by_remote(&self, kind: EntityKind, remote_id: &str)
        -> SyncResult<Option<CorrelationRecord>>;

    /// Inserts or replaces the correlation for `(kind, local_id)`.
    ///
    /// Re-linking the same pair converges to the same state; a remote
    /// id is released from any other local record that held it, so
    /// the per-kind uniqueness invariant survives every upsert.
    fn upsert(&self, record: CorrelationRecord) -> SyncResult<()>;

    /// Removes the correlation for a local record, if any.
    fn remove(&self, kind: EntityKind, local_id: LocalId) -> SyncResult<()>;
}

/// An in-memory correlation store for tests and embedding.
#[derive(Default)]
pub struct MemoryCorrelationStore {
    by_local: RwLock<HashMap<(EntityKind, LocalId), CorrelationRecord>>,
    by_remote: RwLock<HashMap<(EntityKind, String), LocalId>>,
}

impl MemoryCorrelationStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live correlations for a kind.
    pub fn len(&self, kind: EntityKind) -> usize {
        self.by_local
            .read()
            .keys()
            .filter(|(k, _)| *k == kind)
            .count()
    }
}

impl CorrelationStore for MemoryCorrelationStore {
    fn find_by_local(
        &self,
        kind: EntityKind,
        local_id: LocalId,
    ) -> SyncResult<Option<CorrelationRecord>> {
        Ok(self.by_local.read().get(&(kind, local_id)).cloned())
    }

    fn find_by_remote(
        &self,
        kind: EntityKind,
        remote_id: &str,
    ) -> SyncResult<Option<CorrelationRecord>> {
        let local_id = match self.by_remote.read().get(&(kind, remote_id.to_owned())) {
            Some(id) => *id,
            None => return Ok(None),
        };
        self.find_by_local(kind, local_id)
    }

    fn upsert(&self, record: CorrelationRecord) -> SyncResult<()> {
        let mut by_local = self.by_local.write();
        let mut by_remote = self.by_remote.write();
        let kind = record.entity;

        // Release the remote id from any other holder.
        if let Some(&holder) = by_remote.get(&(kind, record.remote_id.clone())) {
            if holder != record.local_id {
                tracing::warn!(
                    %kind,
                    remote_id = %record.remote_id,
                    old_local = holder,
                    new_local = record.local_id,
                    "remote id relinked to a different local record"
                );
                by_local.remove(&(kind, holder));
            }
        }
        // Drop the stale remote index entry if the local record was
        // previously linked elsewhere.
        if let Some(old) = by_local.get(&(kind, record.local_id)) {
            if old.remote_id != record.remote_id {
                by_remote.remove(&(kind, old.remote_id.clone()));
            }
        }

        by_remote.insert((kind, record.remote_id.clone()), record.local_id);
        by_local.insert((kind, record.local_id), record);
        Ok(())
    }

    fn remove(&self, kind: EntityKind, local_id: LocalId) -> SyncResult<()> {
        if let Some(record) = self.by_local.write().remove(&(kind, local_id)) {
            self.by_remote.write().remove(&(kind, record.remote_id));
        }
        Ok(())
    }
}
