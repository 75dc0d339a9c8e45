//! Failed-push retry queue.
//!
//! Failed pushes land here with a bounded, explicit retry budget. A
//! sweep operation re-attempts candidates; an item that keeps failing
//! stays `Failed` once it exhausts the budget and is excluded from
//! further sweeps.

use crate::error::SyncResult;
use crate::local::LocalId;
use crmlink_protocol::EntityKind;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};

/// Which direction the failed operation was going.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryAction {
    /// Local → remote.
    Push,
    /// Remote → local.
    Pull,
}

/// Queue item state machine: `Draft → Failed → Done`, or straight to
/// `Done` on a successful retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryState {
    /// Enqueued, not yet retried.
    Draft,
    /// At least one retry failed.
    Failed,
    /// Succeeded, or abandoned because the record vanished.
    Done,
}

/// A durable record of a failed sync attempt.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryItem {
    /// Queue-assigned id.
    pub id: u64,
    /// Entity kind of the failed operation.
    pub entity: EntityKind,
    /// Local record the operation was for.
    pub local_id: LocalId,
    /// Push or pull.
    pub action: RetryAction,
    /// Most recent error message.
    pub error: String,
    /// Number of failed retry attempts so far.
    pub retry_count: u32,
    /// Current state.
    pub state: RetryState,
}

/// Storage for the retry queue.
pub trait RetryQueue: Send + Sync {
    /// Records a failed operation. Returns the queue item id.
    fn enqueue(
        &self,
        entity: EntityKind,
        local_id: LocalId,
        action: RetryAction,
        error: &str,
    ) -> SyncResult<u64>;

    /// Items eligible for a sweep: state `Draft` or `Failed` with
    /// `retry_count < max_retries`, at most `batch` of them, oldest
    /// first.
    fn candidates(&self, max_retries: u32, batch: usize) -> SyncResult<Vec<RetryItem>>;

    /// Marks an item done.
    fn mark_done(&self, id: u64) -> SyncResult<()>;

    /// Records another failure: increments the retry count, stores
    /// the new error, state stays `Failed`.
    fn mark_failed(&self, id: u64, error: &str) -> SyncResult<()>;

    /// All items, for inspection.
    fn items(&self) -> SyncResult<Vec<RetryItem>>;
}

/// An in-memory retry queue for tests and embedding.
#[derive(Default)]
pub struct MemoryRetryQueue {
    next_id: AtomicU64,
    items: RwLock<Vec<RetryItem>>,
}

impl MemoryRetryQueue {
    /// Creates an empty queue.
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            items: RwLock::new(Vec::new()),
        }
    }
}

impl RetryQueue for MemoryRetryQueue {
    fn enqueue(
        &self,
        entity: EntityKind,
        local_id: LocalId,
        action: RetryAction,
        error: &str,
    ) -> SyncResult<u64> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        tracing::warn!(%entity, local_id, error, "sync failure queued for retry");
        self.items.write().push(RetryItem {
            id,
            entity,
            local_id,
            action,
            error: error.to_owned(),
            retry_count: 0,
            state: RetryState::Draft,
        });
        Ok(id)
    }

    fn candidates(&self, max_retries: u32, batch: usize) -> SyncResult<Vec<RetryItem>> {
        Ok(self
            .items
            .read()
            .iter()
            .filter(|item| {
                matches!(item.state, RetryState::Draft | RetryState::Failed)
                    && item.retry_count < max_retries
            })
            .take(batch)
            .cloned()
            .collect())
    }

    fn mark_done(&self, id: u64) -> SyncResult<()> {
        if let Some(item) = self.items.write().iter_mut().find(|item| item.id == id) {
            item.state = RetryState::Done;
        }
        Ok(())
    }

    fn mark_failed(&self, id: u64, error: &str) -> SyncResult<()> {
        if let Some(item) = self.items.write().iter_mut().find(|item| item.id == id) {
            item.retry_count += 1;
            item.error = error.to_owned();
            item.state = RetryState::Failed;
        }
        Ok(())
    }

    fn items(&self) -> SyncResult<Vec<RetryItem>> {
        Ok(self.items.read().clone())
    }
}
