//! Reference-mapping tables.
//!
//! Users and pipeline stages have no shared natural key between the
//! two systems, so an operator maintains explicit mapping rows. A
//! refresh operation pulls the remote directory and inserts unseen
//! rows with the local side left unassigned; it never overwrites an
//! operator's assignments.

use crate::error::SyncResult;
use parking_lot::RwLock;

/// Maps a local user to a remote user account.
///
/// Both sides are unique across the table; `local_user_id` is `None`
/// until the operator assigns one.
#[derive(Debug, Clone, PartialEq)]
pub struct UserMapping {
    /// Local user id, once assigned.
    pub local_user_id: Option<i64>,
    /// Remote user id.
    pub remote_user_id: String,
    /// Cached display name, for the operator's benefit.
    pub display_name: String,
    /// Cached email, for the operator's benefit.
    pub email: Option<String>,
}

/// Maps a local pipeline stage to a remote `(pipeline, stage)` pair.
///
/// `local_stage_id` is unique; the `(remote_pipeline_id,
/// remote_stage_id)` pair is the lookup key on pull.
#[derive(Debug, Clone, PartialEq)]
pub struct StageMapping {
    /// Local stage id, once assigned.
    pub local_stage_id: Option<i64>,
    /// Remote pipeline id.
    pub remote_pipeline_id: String,
    /// Remote stage id within the pipeline.
    pub remote_stage_id: String,
    /// Cached pipeline name.
    pub pipeline_name: Option<String>,
    /// Cached stage name.
    pub stage_name: Option<String>,
}

/// Storage for the reference-mapping tables.
pub trait MappingStore: Send + Sync {
    /// Remote user id for a local user, if mapped.
    fn remote_user_for_local(&self, local_user_id: i64) -> SyncResult<Option<String>>;

    /// Local user id for a remote user, if mapped and assigned.
    fn local_user_for_remote(&self, remote_user_id: &str) -> SyncResult<Option<i64>>;

    /// Stage mapping for a local stage, if mapped.
    fn stage_for_local(&self, local_stage_id: i64) -> SyncResult<Option<StageMapping>>;

    /// Local stage id for a remote pipeline/stage pair, if mapped and
    /// assigned.
    fn local_stage_for_remote(
        &self,
        remote_pipeline_id: &str,
        remote_stage_id: &str,
    ) -> SyncResult<Option<i64>>;

    /// Inserts a user row unless one with that remote id exists.
    /// Returns true when inserted.
    fn insert_user_if_absent(&self, mapping: UserMapping) -> SyncResult<bool>;

    /// Inserts a stage row unless one with that pipeline/stage pair
    /// exists. Returns true when inserted.
    fn insert_stage_if_absent(&self, mapping: StageMapping) -> SyncResult<bool>;

    /// All user mappings.
    fn user_mappings(&self) -> SyncResult<Vec<UserMapping>>;

    /// All stage mappings.
    fn stage_mappings(&self) -> SyncResult<Vec<StageMapping>>;
}

/// An in-memory mapping store for tests and embedding.
#[derive(Default)]
pub struct MemoryMappingStore {
    users: RwLock<Vec<UserMapping>>,
    stages: RwLock<Vec<StageMapping>>,
}

impl MemoryMappingStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces a user mapping by remote id, as the
    /// operator's mapping screen would.
    pub fn set_user(&self, mapping: UserMapping) {
        let mut users = self.users.write();
        users.retain(|m| m.remote_user_id != mapping.remote_user_id);
        if let Some(local) = mapping.local_user_id {
            users.retain(|m| m.local_user_id != Some(local));
        }
        users.push(mapping);
    }

    /// Inserts or replaces a stage mapping by local stage id.
    pub fn set_stage(&self, mapping: StageMapping) {
        let mut stages = self.stages.write();
        if let Some(local) = mapping.local_stage_id {
            stages.retain(|m| m.local_stage_id != Some(local));
        }
        stages.retain(|m| {
            !(m.remote_pipeline_id == mapping.remote_pipeline_id
                && m.remote_stage_id == mapping.remote_stage_id)
        });
        stages.push(mapping);
    }
}

impl MappingStore for MemoryMappingStore {
    fn remote_user_for_local(&self, local_user_id: i64) -> SyncResult<Option<String>> {
        Ok(self
            .users
            .read()
            .iter()
            .find(|m| m.local_user_id == Some(local_user_id))
            .map(|m| m.remote_user_id.clone()))
    }

    fn local_user_for_remote(&self, remote_user_id: &str) -> SyncResult<Option<i64>> {
        Ok(self
            .users
            .read()
            .iter()
            .find(|m| m.remote_user_id == remote_user_id)
            .and_then(|m| m.local_user_id))
    }

    fn stage_for_local(&self, local_stage_id: i64) -> SyncResult<Option<StageMapping>> {
        Ok(self
            .stages
            .read()
            .iter()
            .find(|m| m.local_stage_id == Some(local_stage_id))
            .cloned())
    }

    fn local_stage_for_remote(
        &self,
        remote_pipeline_id: &str,
        remote_stage_id: &str,
    ) -> SyncResult<Option<i64>> {
        Ok(self
            .stages
            .read()
            .iter()
            .find(|m| {
                m.remote_pipeline_id == remote_pipeline_id && m.remote_stage_id == remote_stage_id
            })
            .and_then(|m| m.local_stage_id))
    }

    fn insert_user_if_absent(&self, mapping: UserMapping) -> SyncResult<bool> {
        let mut users = self.users.write();
        if users
            .iter()
            .any(|m| m.remote_user_id == mapping.remote_user_id)
        {
            return Ok(false);
        }
        users.push(mapping);
        Ok(true)
    }

    fn insert_stage_if_absent(&self, mapping: StageMapping) -> SyncResult<bool> {
        let mut stages = self.stages.write();
        if stages.iter().any(|m| {
            m.remote_pipeline_id == mapping.remote_pipeline_id
                && m.remote_stage_id == mapping.remote_stage_id
        }) {
            return Ok(false);
        }
        stages.push(mapping);
        Ok(true)
    }

    fn user_mappings(&self) -> SyncResult<Vec<UserMapping>> {
        Ok(self.users.read().clone())
    }

    fn stage_mappings(&self) -> SyncResult<Vec<StageMapping>> {
        Ok(self.stages.read().clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(local: Option<i64>, remote: &str) -> UserMapping {
        UserMapping {
            local_user_id: local,
            remote_user_id: remote.into(),
            display_name: "Jane Doe".into(),
            email: None,
        }
    }

    fn stage(local: Option<i64>, pipeline: &str, stage: &str) -> StageMapping {
        StageMapping {
            local_stage_id: local,
            remote_pipeline_id: pipeline.into(),
            remote_stage_id: stage.into(),
            pipeline_name: None,
            stage_name: None,
        }
    }

    #[test]
    fn user_lookup_both_ways() {
        let store = MemoryMappingStore::new();
        store.set_user(user(Some(3), "u1"));

        assert_eq!(store.remote_user_for_local(3).unwrap().as_deref(), Some("u1"));
        assert_eq!(store.local_user_for_remote("u1").unwrap(), Some(3));
        assert_eq!(store.local_user_for_remote("unknown").unwrap(), None);
    }

    #[test]
    fn unassigned_user_resolves_to_none() {
        let store = MemoryMappingStore::new();
        store.set_user(user(None, "u1"));
        assert_eq!(store.local_user_for_remote("u1").unwrap(), None);
    }

    #[test]
    fn stage_pair_is_the_pull_key() {
        let store = MemoryMappingStore::new();
        store.set_stage(stage(Some(4), "pipe1", "s2"));

        let found = store.stage_for_local(4).unwrap().unwrap();
        assert_eq!(found.remote_pipeline_id, "pipe1");
        assert_eq!(
            store.local_stage_for_remote("pipe1", "s2").unwrap(),
            Some(4)
        );
        // Same stage id in another pipeline does not match.
        assert_eq!(store.local_stage_for_remote("pipe2", "s2").unwrap(), None);
    }

    #[test]
    fn refresh_insert_skips_existing() {
        let store = MemoryMappingStore::new();
        store.set_user(user(Some(3), "u1"));

        assert!(!store.insert_user_if_absent(user(None, "u1")).unwrap());
        assert!(store.insert_user_if_absent(user(None, "u2")).unwrap());
        // The assigned mapping was not overwritten.
        assert_eq!(store.local_user_for_remote("u1").unwrap(), Some(3));
    }

    #[test]
    fn refresh_insert_skips_existing_stage_pair() {
        let store = MemoryMappingStore::new();
        store.set_stage(stage(Some(4), "pipe1", "s1"));

        assert!(!store
            .insert_stage_if_absent(stage(None, "pipe1", "s1"))
            .unwrap());
        assert!(store
            .insert_stage_if_absent(stage(None, "pipe1", "s2"))
            .unwrap());
        assert_eq!(store.stage_mappings().unwrap().len(), 2);
    }
}
