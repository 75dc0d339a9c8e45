//! Sync engine orchestration.
//!
//! The engine owns correlation and checkpoint mutation and drives
//! push (local → remote) and pull (remote → local) per entity kind.
//! Configuration is loaded fresh at the start of every operation.
//!
//! ## Key invariants
//!
//! - The create-vs-update branch depends on a correlation lookup
//!   executed immediately before the remote call.
//! - Duplicate-create recovery links first, then retries as an
//!   update, so running it twice converges to the same linked state.
//! - Checkpoints only move forward, and only after a page was fully
//!   processed; an aborted page is simply re-processed next run.
//! - Every host write the engine performs carries a request-scoped
//!   [`PullScope`], so applying a pulled change never re-triggers a
//!   push.

use crate::adapter::{adapter_for, MappingContext};
use crate::checkpoint::CheckpointStore;
use crate::config::{ConfigSource, SyncConfiguration, TriggerMode};
use crate::correlation::{CorrelationRecord, CorrelationStore};
use crate::error::{SyncError, SyncResult};
use crate::local::{LocalRecord, LocalStore, PullScope};
use crate::mapping::{MappingStore, StageMapping, UserMapping};
use crate::remote::{HttpClient, RemoteClient};
use crate::retry::{RetryAction, RetryQueue};
use chrono::{DateTime, Utc};
use crmlink_protocol::{remote_id, remote_updated_at, EntityKind};
use serde_json::Value;
use std::sync::Arc;

/// Outcome of one push.
#[derive(Debug, Clone, PartialEq)]
pub struct PushOutcome {
    /// Remote id the record is now correlated with, when the remote
    /// returned one.
    pub remote_id: Option<String>,
    /// True when a new remote record was created.
    pub created: bool,
    /// True when a duplicate rejection was recovered by linking.
    pub recovered_duplicate: bool,
}

/// Outcome of one pull page.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PullOutcome {
    /// Local records created.
    pub created: u64,
    /// Local records updated through an existing correlation.
    pub updated: u64,
    /// Remote records skipped (no id, or untranslatable).
    pub skipped: u64,
    /// Checkpoint after this page.
    pub checkpoint: Option<DateTime<Utc>>,
}

/// Outcome of one retry-queue sweep.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SweepOutcome {
    /// Items attempted.
    pub attempted: u64,
    /// Items that succeeded and were marked done.
    pub succeeded: u64,
    /// Items that failed again.
    pub failed: u64,
    /// Items abandoned because the local record no longer exists.
    pub vanished: u64,
}

/// Per-kind results of a poll cycle.
pub type PollReport = Vec<(EntityKind, SyncResult<PullOutcome>)>;

/// The synchronization engine.
pub struct SyncEngine<C: HttpClient> {
    config: Arc<dyn ConfigSource>,
    remote: RemoteClient<C>,
    local: Arc<dyn LocalStore>,
    correlations: Arc<dyn CorrelationStore>,
    checkpoints: Arc<dyn CheckpointStore>,
    mappings: Arc<dyn MappingStore>,
    retry_queue: Arc<dyn RetryQueue>,
}

/// Fields whose change makes the host's write hook push a record.
pub fn synced_fields(kind: EntityKind) -> &'static [&'static str] {
    match kind {
        EntityKind::Contact => &[
            "name",
            "email",
            "phone",
            "mobile",
            "street",
            "city",
            "state",
            "zip",
            "country",
            "assignee_user_id",
        ],
        EntityKind::Opportunity => &[
            "name",
            "expected_revenue",
            "active",
            "contact_id",
            "stage_id",
            "assignee_user_id",
        ],
        EntityKind::Task => &[
            "title",
            "description",
            "due_date",
            "done",
            "contact_id",
            "assignee_user_id",
        ],
        EntityKind::Note => &["body", "contact_id"],
    }
}

impl<C: HttpClient> SyncEngine<C> {
    /// Creates an engine over the given collaborators.
    pub fn new(
        config: Arc<dyn ConfigSource>,
        remote: RemoteClient<C>,
        local: Arc<dyn LocalStore>,
        correlations: Arc<dyn CorrelationStore>,
        checkpoints: Arc<dyn CheckpointStore>,
        mappings: Arc<dyn MappingStore>,
        retry_queue: Arc<dyn RetryQueue>,
    ) -> Self {
        Self {
            config,
            remote,
            local,
            correlations,
            checkpoints,
            mappings,
            retry_queue,
        }
    }

    fn mapping_ctx<'a>(&'a self, config: &'a SyncConfiguration) -> MappingContext<'a> {
        MappingContext {
            location_id: &config.location_id,
            mappings: &*self.mappings,
            correlations: &*self.correlations,
        }
    }

    fn push_allowed(config: &SyncConfiguration, kind: EntityKind, record: &LocalRecord) -> bool {
        config.is_enabled(kind) && config.direction.includes_push() && !record.skip_sync
    }

    // ----------------------------------------------------------------
    // Push
    // ----------------------------------------------------------------

    /// Host hook: called synchronously after a local create/update.
    ///
    /// Decides whether to push from configuration and the changed
    /// field set; an empty `changed_fields` means a create and always
    /// qualifies. `Ok(None)` is a deliberate no-op.
    pub fn on_local_change(
        &self,
        kind: EntityKind,
        record: &LocalRecord,
        changed_fields: &[&str],
    ) -> SyncResult<Option<PushOutcome>> {
        let config = self.config.load()?;
        if config.trigger_mode != TriggerMode::OnWrite {
            return Ok(None);
        }
        if !Self::push_allowed(&config, kind, record) {
            return Ok(None);
        }
        if !changed_fields.is_empty() {
            let watched = synced_fields(kind);
            if !changed_fields.iter().any(|field| watched.contains(field)) {
                return Ok(None);
            }
        }
        self.push_and_queue(&config, kind, record)
    }

    /// Pushes one record local → remote.
    ///
    /// `Ok(None)` when the kind is disabled, the direction excludes
    /// pushes, or the record is flagged to skip sync.
    pub fn push(&self, kind: EntityKind, record: &LocalRecord) -> SyncResult<Option<PushOutcome>> {
        let config = self.config.load()?;
        self.push_and_queue(&config, kind, record)
    }

    /// Push that enqueues queueable failures before re-surfacing them.
    fn push_and_queue(
        &self,
        config: &SyncConfiguration,
        kind: EntityKind,
        record: &LocalRecord,
    ) -> SyncResult<Option<PushOutcome>> {
        match self.try_push(config, kind, record) {
            Err(e) if e.is_queueable() => {
                self.retry_queue
                    .enqueue(kind, record.id, RetryAction::Push, &e.to_string())?;
                Err(e)
            }
            other => other,
        }
    }

    /// Push without touching the retry queue (also used by the sweep).
    fn try_push(
        &self,
        config: &SyncConfiguration,
        kind: EntityKind,
        record: &LocalRecord,
    ) -> SyncResult<Option<PushOutcome>> {
        if !Self::push_allowed(config, kind, record) {
            return Ok(None);
        }
        let payload = {
            let ctx = self.mapping_ctx(config);
            adapter_for(kind).to_remote(record, &ctx)?
        };
        self.push_remote(config, kind, record, payload).map(Some)
    }

    fn push_remote(
        &self,
        config: &SyncConfiguration,
        kind: EntityKind,
        record: &LocalRecord,
        payload: Value,
    ) -> SyncResult<PushOutcome> {
        // Lookup immediately before the remote call: two concurrent
        // pushes for the same record branch on current state, and the
        // duplicate path below converges them.
        let existing = self.correlations.find_by_local(kind, record.id)?;

        match existing {
            Some(correlation) => {
                let value =
                    self.remote
                        .update(config, kind, &correlation.remote_id, payload)?;
                self.link(kind, record.id, &correlation.remote_id, remote_updated_at(&value))?;
                Ok(PushOutcome {
                    remote_id: Some(correlation.remote_id),
                    created: false,
                    recovered_duplicate: false,
                })
            }
            None => match self.remote.create(config, kind, payload.clone()) {
                Ok(value) => {
                    let Some(rid) = remote_id(&value) else {
                        tracing::warn!(%kind, local_id = record.id,
                            "create response carried no remote id; nothing correlated");
                        return Ok(PushOutcome {
                            remote_id: None,
                            created: true,
                            recovered_duplicate: false,
                        });
                    };
                    self.link(kind, record.id, &rid, remote_updated_at(&value))?;
                    tracing::info!(%kind, local_id = record.id, remote_id = %rid, "remote record created");
                    Ok(PushOutcome {
                        remote_id: Some(rid),
                        created: true,
                        recovered_duplicate: false,
                    })
                }
                Err(SyncError::DuplicateRecord { remote_id: existing_id }) => {
                    tracing::warn!(%kind, local_id = record.id, remote_id = %existing_id,
                        "remote reports duplicate; linking and retrying as update");
                    // Link before retrying so a crash between the two
                    // calls still leaves the record correlated.
                    self.link(kind, record.id, &existing_id, None)?;
                    let value = self.remote.update(config, kind, &existing_id, payload)?;
                    self.link(kind, record.id, &existing_id, remote_updated_at(&value))?;
                    Ok(PushOutcome {
                        remote_id: Some(existing_id),
                        created: false,
                        recovered_duplicate: true,
                    })
                }
                Err(e) => Err(e),
            },
        }
    }

    /// Upserts the correlation for a record and stamps the sync time.
    fn link(
        &self,
        kind: EntityKind,
        local_id: i64,
        remote_id: &str,
        remote_updated_at: Option<DateTime<Utc>>,
    ) -> SyncResult<()> {
        let mut correlation = CorrelationRecord::new(kind, local_id, remote_id);
        correlation.remote_updated_at = remote_updated_at;
        correlation.last_synced_at = Some(Utc::now());
        self.correlations.upsert(correlation)
    }

    // ----------------------------------------------------------------
    // Pull
    // ----------------------------------------------------------------

    /// Pulls one page of remote changes for a kind.
    ///
    /// `Ok(None)` when the kind is disabled or the direction excludes
    /// pulls. `limit` defaults to the configured page limit.
    pub fn pull(&self, kind: EntityKind, limit: Option<u32>) -> SyncResult<Option<PullOutcome>> {
        let config = self.config.load()?;
        if !config.is_enabled(kind) || !config.direction.includes_pull() {
            return Ok(None);
        }
        let limit = limit.unwrap_or(config.page_limit);
        self.pull_page(&config, kind, limit).map(Some)
    }

    fn pull_page(
        &self,
        config: &SyncConfiguration,
        kind: EntityKind,
        limit: u32,
    ) -> SyncResult<PullOutcome> {
        let since = self.checkpoints.get(kind)?;
        // A page-retrieval failure aborts here, checkpoint untouched;
        // the next scheduled run retries the same window.
        let items = self.remote.list(config, kind, since, limit)?;

        let scope = PullScope::new();
        let ctx = self.mapping_ctx(config);
        let mut outcome = PullOutcome::default();
        let mut page_max: Option<DateTime<Utc>> = None;

        for payload in items {
            let Some(rid) = remote_id(&payload) else {
                outcome.skipped += 1;
                continue;
            };
            let updated = remote_updated_at(&payload);
            if let Some(ts) = updated {
                if page_max.map_or(true, |max| ts > max) {
                    page_max = Some(ts);
                }
            }

            let fields = match adapter_for(kind).from_remote(&payload, &ctx) {
                Ok(fields) => fields,
                Err(e) => {
                    tracing::warn!(%kind, remote_id = %rid, error = %e, "skipping untranslatable remote record");
                    outcome.skipped += 1;
                    continue;
                }
            };

            match self.correlations.find_by_remote(kind, &rid)? {
                Some(correlation) => {
                    self.local.update(kind, correlation.local_id, fields, &scope)?;
                    self.link(kind, correlation.local_id, &rid, updated)?;
                    outcome.updated += 1;
                }
                None => {
                    let local_id = self.local.create(kind, fields, &scope)?;
                    self.link(kind, local_id, &rid, updated)?;
                    outcome.created += 1;
                }
            }
        }

        // Forward-only, and only when something parseable was seen.
        if let Some(ts) = page_max {
            self.checkpoints.advance(kind, ts)?;
        }
        outcome.checkpoint = self.checkpoints.get(kind)?;
        tracing::info!(
            %kind,
            created = outcome.created,
            updated = outcome.updated,
            skipped = outcome.skipped,
            "pull page processed"
        );
        Ok(outcome)
    }

    /// Pulls every enabled kind; one kind failing does not stop the
    /// others. Intended for the external scheduler's tick.
    pub fn poll_all(&self) -> PollReport {
        let mut report = PollReport::new();
        for kind in EntityKind::ALL {
            match self.pull(kind, None) {
                Ok(None) => {}
                Ok(Some(outcome)) => report.push((kind, Ok(outcome))),
                Err(e) => {
                    tracing::error!(%kind, error = %e, "pull failed");
                    report.push((kind, Err(e)));
                }
            }
        }
        report
    }

    /// Resets all checkpoints and re-polls everything: a full re-scan
    /// bounded by the remote history, not a destructive reset of
    /// correlations.
    pub fn reconcile(&self) -> SyncResult<PollReport> {
        tracing::info!("reconciliation: resetting pull checkpoints");
        self.checkpoints.reset_all()?;
        Ok(self.poll_all())
    }

    // ----------------------------------------------------------------
    // Retry sweep
    // ----------------------------------------------------------------

    /// Re-attempts queued push failures within the configured bounds.
    pub fn sweep_retry_queue(&self) -> SyncResult<SweepOutcome> {
        let config = self.config.load()?;
        let candidates = self
            .retry_queue
            .candidates(config.max_retries, config.sweep_batch)?;

        let mut outcome = SweepOutcome::default();
        for item in candidates {
            outcome.attempted += 1;

            if item.action != RetryAction::Push {
                // Pull failures are never queued per record; an old
                // pull item has nothing to re-attempt.
                self.retry_queue.mark_done(item.id)?;
                outcome.succeeded += 1;
                continue;
            }

            let record = match self.local.get(item.entity, item.local_id)? {
                Some(record) => record,
                None => {
                    // Record deleted locally; nothing left to push.
                    self.retry_queue.mark_done(item.id)?;
                    outcome.vanished += 1;
                    continue;
                }
            };

            match self.try_push(&config, item.entity, &record) {
                Ok(_) => {
                    self.retry_queue.mark_done(item.id)?;
                    outcome.succeeded += 1;
                }
                Err(e) => {
                    self.retry_queue.mark_failed(item.id, &e.to_string())?;
                    outcome.failed += 1;
                }
            }
        }
        tracing::info!(
            attempted = outcome.attempted,
            succeeded = outcome.succeeded,
            failed = outcome.failed,
            vanished = outcome.vanished,
            "retry sweep finished"
        );
        Ok(outcome)
    }

    // ----------------------------------------------------------------
    // Mapping refresh and connectivity
    // ----------------------------------------------------------------

    /// Fetches the remote user directory and inserts unseen mapping
    /// rows with the local side unassigned. Returns rows created.
    pub fn refresh_user_mappings(&self) -> SyncResult<usize> {
        let config = self.config.load()?;
        let users = self.remote.get_users(&config)?;

        let mut created = 0;
        for user in users {
            let mapping = UserMapping {
                local_user_id: None,
                remote_user_id: user.id.clone(),
                display_name: user.display_name(),
                email: user.email.clone(),
            };
            if self.mappings.insert_user_if_absent(mapping)? {
                created += 1;
            }
        }
        tracing::info!(created, "user mappings refreshed");
        Ok(created)
    }

    /// Fetches the remote pipelines and inserts unseen stage-mapping
    /// rows with the local side unassigned. Returns rows created.
    pub fn refresh_stage_mappings(&self) -> SyncResult<usize> {
        let config = self.config.load()?;
        let pipelines = self.remote.get_pipelines(&config)?;

        let mut created = 0;
        for pipeline in pipelines {
            for stage in &pipeline.stages {
                let mapping = StageMapping {
                    local_stage_id: None,
                    remote_pipeline_id: pipeline.id.clone(),
                    remote_stage_id: stage.id.clone(),
                    pipeline_name: pipeline.name.clone(),
                    stage_name: stage.name.clone(),
                };
                if self.mappings.insert_stage_if_absent(mapping)? {
                    created += 1;
                }
            }
        }
        tracing::info!(created, "stage mappings refreshed");
        Ok(created)
    }

    /// Verifies credentials with a single bounded list call,
    /// bypassing stored configuration.
    pub fn test_connection(&self, token: &str, location_id: &str) -> SyncResult<()> {
        self.remote.test_connection(token, location_id)
    }
}
