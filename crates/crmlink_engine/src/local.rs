//! Host store boundary.
//!
//! The host application owns record persistence; the engine sees
//! records as field-name → value maps behind the [`LocalStore`]
//! trait. Loop prevention is structural: every write the engine
//! performs takes a [`PullScope`], a token only the engine can
//! construct, and the host's push trigger must not fire for writes
//! arriving through these scoped methods.

use crate::error::SyncResult;
use crmlink_protocol::EntityKind;
use parking_lot::RwLock;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};

/// Identifier of a record in the host store.
pub type LocalId = i64;

/// Field-name → value map, the engine's view of a host record.
pub type FieldValues = serde_json::Map<String, Value>;

/// An opaque handle onto a host record.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LocalRecord {
    /// Host store identifier.
    pub id: LocalId,
    /// Field values, host-owned schema.
    pub fields: FieldValues,
    /// When set, the record is excluded from sync entirely.
    pub skip_sync: bool,
}

impl LocalRecord {
    /// Creates a record handle.
    pub fn new(id: LocalId, fields: FieldValues) -> Self {
        Self {
            id,
            fields,
            skip_sync: false,
        }
    }

    /// String field accessor.
    pub fn field_str(&self, name: &str) -> Option<&str> {
        self.fields.get(name).and_then(Value::as_str)
    }

    /// Numeric field accessor.
    pub fn field_f64(&self, name: &str) -> Option<f64> {
        self.fields.get(name).and_then(Value::as_f64)
    }

    /// Integer field accessor (local reference ids).
    pub fn field_i64(&self, name: &str) -> Option<i64> {
        self.fields.get(name).and_then(Value::as_i64)
    }

    /// Boolean field accessor.
    pub fn field_bool(&self, name: &str) -> Option<bool> {
        self.fields.get(name).and_then(Value::as_bool)
    }
}

/// Request-scoped loop-prevention token.
///
/// One scope is created per pull (or write-back) invocation and
/// dropped when it completes; it cannot leak into unrelated
/// concurrent operations because it is never stored. Host writes
/// carrying a scope must not re-trigger the push hook.
#[derive(Debug)]
pub struct PullScope {
    _private: (),
}

impl PullScope {
    pub(crate) fn new() -> Self {
        Self { _private: () }
    }
}

/// Generic persistence operations the host exposes per entity type.
pub trait LocalStore: Send + Sync {
    /// Fetches a record; `Ok(None)` when it no longer exists.
    fn get(&self, kind: EntityKind, id: LocalId) -> SyncResult<Option<LocalRecord>>;

    /// Creates a record from pulled field values. Suppresses the push
    /// trigger for this write only.
    fn create(&self, kind: EntityKind, fields: FieldValues, scope: &PullScope)
        -> SyncResult<LocalId>;

    /// Merges pulled field values into an existing record; a `null`
    /// value clears the field. Suppresses the push trigger for this
    /// write only.
    fn update(
        &self,
        kind: EntityKind,
        id: LocalId,
        fields: FieldValues,
        scope: &PullScope,
    ) -> SyncResult<()>;
}

/// An in-memory host store for tests.
///
/// Counts scoped writes so tests can assert that applying pulled
/// changes never produced an outbound push trigger.
#[derive(Default)]
pub struct MemoryLocalStore {
    records: RwLock<HashMap<(EntityKind, LocalId), LocalRecord>>,
    next_id: AtomicI64,
    scoped_writes: AtomicU64,
}

impl MemoryLocalStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self {
            records: RwLock::new(HashMap::new()),
            next_id: AtomicI64::new(1),
            scoped_writes: AtomicU64::new(0),
        }
    }

    /// Seeds a record, as the host's own UI would.
    pub fn insert(&self, kind: EntityKind, record: LocalRecord) {
        self.next_id.fetch_max(record.id + 1, Ordering::SeqCst);
        self.records.write().insert((kind, record.id), record);
    }

    /// Removes a record, simulating host-side deletion.
    pub fn delete(&self, kind: EntityKind, id: LocalId) {
        self.records.write().remove(&(kind, id));
    }

    /// All records of a kind, ordered by id.
    pub fn records(&self, kind: EntityKind) -> Vec<LocalRecord> {
        let mut out: Vec<LocalRecord> = self
            .records
            .read()
            .iter()
            .filter(|((k, _), _)| *k == kind)
            .map(|(_, r)| r.clone())
            .collect();
        out.sort_by_key(|r| r.id);
        out
    }

    /// Number of writes performed under a loop-prevention scope.
    pub fn scoped_write_count(&self) -> u64 {
        self.scoped_writes.load(Ordering::SeqCst)
    }
}

impl LocalStore for MemoryLocalStore {
    fn get(&self, kind: EntityKind, id: LocalId) -> SyncResult<Option<LocalRecord>> {
        Ok(self.records.read().get(&(kind, id)).cloned())
    }

    fn create(
        &self,
        kind: EntityKind,
        fields: FieldValues,
        _scope: &PullScope,
    ) -> SyncResult<LocalId> {
        self.scoped_writes.fetch_add(1, Ordering::SeqCst);
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        self.records
            .write()
            .insert((kind, id), LocalRecord::new(id, fields));
        Ok(id)
    }

    fn update(
        &self,
        kind: EntityKind,
        id: LocalId,
        fields: FieldValues,
        _scope: &PullScope,
    ) -> SyncResult<()> {
        self.scoped_writes.fetch_add(1, Ordering::SeqCst);
        let mut records = self.records.write();
        let record = records
            .get_mut(&(kind, id))
            .ok_or_else(|| crate::error::SyncError::Host(format!("{kind} {id} not found")))?;
        for (name, value) in fields {
            if value.is_null() {
                record.fields.remove(&name);
            } else {
                record.fields.insert(name, value);
            }
        }
        Ok(())
    }
}
