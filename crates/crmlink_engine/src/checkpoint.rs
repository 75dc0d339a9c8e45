//! Pull checkpoints.
//!
//! One high-water mark per entity kind bounds incremental pulls.
//! Advancement is forward-only; reconciliation is the only caller
//! allowed to reset.

use crate::error::SyncResult;
use chrono::{DateTime, Utc};
use crmlink_protocol::EntityKind;
use parking_lot::RwLock;
use std::collections::HashMap;

/// Storage for per-kind pull checkpoints.
pub trait CheckpointStore: Send + Sync {
    /// The last successfully processed remote timestamp, if any.
    fn get(&self, kind: EntityKind) -> SyncResult<Option<DateTime<Utc>>>;

    /// Advances the checkpoint, ignoring regressions. Returns true if
    /// the stored value changed.
    fn advance(&self, kind: EntityKind, to: DateTime<Utc>) -> SyncResult<bool>;

    /// Clears every checkpoint, forcing the next pulls to re-scan the
    /// remote history.
    fn reset_all(&self) -> SyncResult<()>;
}

/// An in-memory checkpoint store for tests and embedding.
#[derive(Default)]
pub struct MemoryCheckpointStore {
    marks: RwLock<HashMap<EntityKind, DateTime<Utc>>>,
}

impl MemoryCheckpointStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl CheckpointStore for MemoryCheckpointStore {
    fn get(&self, kind: EntityKind) -> SyncResult<Option<DateTime<Utc>>> {
        Ok(self.marks.read().get(&kind).copied())
    }

    fn advance(&self, kind: EntityKind, to: DateTime<Utc>) -> SyncResult<bool> {
        let mut marks = self.marks.write();
        match marks.get(&kind) {
            Some(current) if *current >= to => Ok(false),
            _ => {
                tracing::debug!(%kind, checkpoint = %to, "checkpoint advanced");
                marks.insert(kind, to);
                Ok(true)
            }
        }
    }

    fn reset_all(&self) -> SyncResult<()> {
        self.marks.write().clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ts(secs: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, secs).unwrap()
    }

    #[test]
    fn advance_is_monotonic() {
        let store = MemoryCheckpointStore::new();
        assert!(store.advance(EntityKind::Contact, ts(10)).unwrap());
        assert!(!store.advance(EntityKind::Contact, ts(5)).unwrap());
        assert_eq!(store.get(EntityKind::Contact).unwrap(), Some(ts(10)));

        assert!(store.advance(EntityKind::Contact, ts(20)).unwrap());
        assert_eq!(store.get(EntityKind::Contact).unwrap(), Some(ts(20)));
    }

    #[test]
    fn advance_to_equal_value_is_a_no_op() {
        let store = MemoryCheckpointStore::new();
        store.advance(EntityKind::Task, ts(10)).unwrap();
        assert!(!store.advance(EntityKind::Task, ts(10)).unwrap());
    }

    #[test]
    fn kinds_are_independent() {
        let store = MemoryCheckpointStore::new();
        store.advance(EntityKind::Contact, ts(10)).unwrap();
        assert!(store.get(EntityKind::Opportunity).unwrap().is_none());
    }

    #[test]
    fn reset_clears_everything() {
        let store = MemoryCheckpointStore::new();
        store.advance(EntityKind::Contact, ts(10)).unwrap();
        store.advance(EntityKind::Note, ts(20)).unwrap();
        store.reset_all().unwrap();
        assert!(store.get(EntityKind::Contact).unwrap().is_none());
        assert!(store.get(EntityKind::Note).unwrap().is_none());
    }
}
