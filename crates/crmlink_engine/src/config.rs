//! Sync configuration.
//!
//! Configuration is read through a [`ConfigSource`] at the start of
//! every engine operation and never cached across calls, so edits in
//! the host's settings screen take effect on the next push or pull.

use crate::error::SyncResult;
use crmlink_protocol::EntityKind;
use parking_lot::RwLock;

/// Which way records flow between the local store and the remote CRM.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SyncDirection {
    /// Only push local changes out.
    LocalToRemote,
    /// Only pull remote changes in.
    RemoteToLocal,
    /// Bi-directional.
    #[default]
    Both,
}

impl SyncDirection {
    /// Returns true if pushes (local → remote) are allowed.
    pub fn includes_push(&self) -> bool {
        matches!(self, SyncDirection::LocalToRemote | SyncDirection::Both)
    }

    /// Returns true if pulls (remote → local) are allowed.
    pub fn includes_pull(&self) -> bool {
        matches!(self, SyncDirection::RemoteToLocal | SyncDirection::Both)
    }
}

/// When pushes fire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TriggerMode {
    /// The host's write hook pushes on every qualifying create/update.
    #[default]
    OnWrite,
    /// Only manual or scheduled operations sync.
    ManualOnly,
}

/// Process-wide sync configuration, externally supplied.
#[derive(Debug, Clone)]
pub struct SyncConfiguration {
    /// Private integration token for the remote API.
    pub api_token: String,
    /// Tenant scope (sub-account id) all requests carry.
    pub location_id: String,
    /// Sync direction.
    pub direction: SyncDirection,
    /// Push trigger mode.
    pub trigger_mode: TriggerMode,
    /// Contact sync enabled.
    pub sync_contacts: bool,
    /// Opportunity sync enabled.
    pub sync_opportunities: bool,
    /// Task sync enabled.
    pub sync_tasks: bool,
    /// Note sync enabled.
    pub sync_notes: bool,
    /// Page-size bound for incremental pulls.
    pub page_limit: u32,
    /// Retry-queue attempt bound; items past it stay failed.
    pub max_retries: u32,
    /// How many queue items one sweep may attempt.
    pub sweep_batch: usize,
}

impl SyncConfiguration {
    /// Creates a configuration with the original connector's defaults:
    /// contacts and opportunities on, tasks and notes off.
    pub fn new(api_token: impl Into<String>, location_id: impl Into<String>) -> Self {
        Self {
            api_token: api_token.into(),
            location_id: location_id.into(),
            direction: SyncDirection::Both,
            trigger_mode: TriggerMode::OnWrite,
            sync_contacts: true,
            sync_opportunities: true,
            sync_tasks: false,
            sync_notes: false,
            page_limit: 100,
            max_retries: 5,
            sweep_batch: 50,
        }
    }

    /// Sets the sync direction.
    pub fn with_direction(mut self, direction: SyncDirection) -> Self {
        self.direction = direction;
        self
    }

    /// Sets the trigger mode.
    pub fn with_trigger_mode(mut self, mode: TriggerMode) -> Self {
        self.trigger_mode = mode;
        self
    }

    /// Enables or disables one entity kind.
    pub fn with_entity_enabled(mut self, kind: EntityKind, enabled: bool) -> Self {
        match kind {
            EntityKind::Contact => self.sync_contacts = enabled,
            EntityKind::Opportunity => self.sync_opportunities = enabled,
            EntityKind::Task => self.sync_tasks = enabled,
            EntityKind::Note => self.sync_notes = enabled,
        }
        self
    }

    /// Sets the pull page limit.
    pub fn with_page_limit(mut self, limit: u32) -> Self {
        self.page_limit = limit;
        self
    }

    /// Sets the retry bound.
    pub fn with_max_retries(mut self, max: u32) -> Self {
        self.max_retries = max;
        self
    }

    /// Returns true if the given kind is enabled for sync.
    pub fn is_enabled(&self, kind: EntityKind) -> bool {
        match kind {
            EntityKind::Contact => self.sync_contacts,
            EntityKind::Opportunity => self.sync_opportunities,
            EntityKind::Task => self.sync_tasks,
            EntityKind::Note => self.sync_notes,
        }
    }

    /// Kinds currently enabled, in poll order.
    pub fn enabled_kinds(&self) -> Vec<EntityKind> {
        EntityKind::ALL
            .into_iter()
            .filter(|kind| self.is_enabled(*kind))
            .collect()
    }
}

/// Supplies the current configuration to each engine operation.
///
/// Implementations typically read the host's key-value settings
/// store. The engine calls `load` once per operation.
pub trait ConfigSource: Send + Sync {
    /// Loads the current configuration.
    fn load(&self) -> SyncResult<SyncConfiguration>;
}

/// An in-memory config source for tests and embedding.
pub struct MemoryConfigSource {
    inner: RwLock<SyncConfiguration>,
}

impl MemoryConfigSource {
    /// Creates a source returning the given configuration.
    pub fn new(config: SyncConfiguration) -> Self {
        Self {
            inner: RwLock::new(config),
        }
    }

    /// Replaces the configuration; the next operation sees it.
    pub fn set(&self, config: SyncConfiguration) {
        *self.inner.write() = config;
    }
}

impl ConfigSource for MemoryConfigSource {
    fn load(&self) -> SyncResult<SyncConfiguration> {
        Ok(self.inner.read().clone())
    }
}
