//! Durable, coalescing log of pending mutations.

use crate::error::SyncResult;
use chrono::Utc;
use inklet_store::{get_json, set_json, PersistentStore};
use inklet_sync_types::{EntityKind, OperationPayload, OperationStatus, SyncOperation};
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{debug, warn};
use uuid::Uuid;

/// Storage key holding the persisted queue (one JSON array).
pub const QUEUE_KEY: &str = "sync/queue";

/// Aggregate counts over the persisted queue.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueueStats {
    /// Operations waiting for a sync pass.
    pub pending: usize,
    /// Operations picked up by the current pass.
    pub syncing: usize,
    /// Operations whose last attempt failed.
    pub failed: usize,
    /// All persisted operations; equals the sum of the other counts.
    pub total: usize,
}

/// A durable, coalescing log of pending mutations.
///
/// The whole queue lives under a single storage key as a JSON array in
/// `seq` order. Every mutation is a read-modify-write cycle against that
/// key, serialized by one internal lock so concurrent writers cannot lose
/// updates.
///
/// # Invariants
///
/// - At most one operation per `(entity_id, kind)` pair: a second enqueue
///   coalesces into the existing record, replacing the payload and
///   resetting transient fields, keeping the original `seq`.
/// - Completed operations are removed, never stored with a status.
/// - `Failed` operations at the attempt ceiling stay in the queue until
///   [`retry_failed`](SyncQueue::retry_failed) cannot help and
///   [`purge_exhausted`](SyncQueue::purge_exhausted) removes them.
pub struct SyncQueue {
    store: Arc<dyn PersistentStore>,
    write_lock: Mutex<()>,
}

impl SyncQueue {
    /// Creates a queue over the given store.
    #[must_use]
    pub fn new(store: Arc<dyn PersistentStore>) -> Self {
        Self {
            store,
            write_lock: Mutex::new(()),
        }
    }

    fn load(&self) -> SyncResult<Vec<SyncOperation>> {
        Ok(get_json(self.store.as_ref(), QUEUE_KEY)?.unwrap_or_default())
    }

    fn persist(&self, operations: &[SyncOperation]) -> SyncResult<()> {
        set_json(self.store.as_ref(), QUEUE_KEY, &operations)?;
        Ok(())
    }

    /// Enqueues a mutation, coalescing against an existing record for the
    /// same `(entity_id, kind)` pair, and returns the stored operation.
    ///
    /// # Errors
    ///
    /// Returns an error if the queue cannot be read or written.
    pub fn enqueue(
        &self,
        entity_kind: EntityKind,
        entity_id: impl Into<String>,
        payload: OperationPayload,
    ) -> SyncResult<SyncOperation> {
        let entity_id = entity_id.into();
        let kind = payload.kind();
        let _guard = self.write_lock.lock();
        let mut operations = self.load()?;

        if let Some(existing) = operations
            .iter_mut()
            .find(|op| op.coalesces_with(&entity_id, kind))
        {
            existing.payload = payload;
            existing.status = OperationStatus::Pending;
            existing.attempts = 0;
            existing.last_attempt_at = None;
            existing.error_message = None;
            let operation = existing.clone();
            self.persist(&operations)?;
            debug!(id = %operation.id, entity_id = %operation.entity_id, %kind, "coalesced queued operation");
            return Ok(operation);
        }

        let seq = operations.iter().map(|op| op.seq).max().map_or(0, |s| s + 1);
        let operation = SyncOperation::new(seq, entity_kind, entity_id, payload);
        operations.push(operation.clone());
        self.persist(&operations)?;
        debug!(id = %operation.id, seq, %kind, "enqueued operation");
        Ok(operation)
    }

    /// Removes an operation entirely (used on success).
    ///
    /// # Errors
    ///
    /// Returns an error if the queue cannot be read or written.
    pub fn dequeue(&self, id: Uuid) -> SyncResult<()> {
        let _guard = self.write_lock.lock();
        let mut operations = self.load()?;
        operations.retain(|op| op.id != id);
        self.persist(&operations)
    }

    /// Returns the work list for a sync pass: `Pending` operations plus
    /// `Failed` ones still within the attempt budget, in stored order.
    ///
    /// # Errors
    ///
    /// Returns an error if the queue cannot be read.
    pub fn pending_operations(&self) -> SyncResult<Vec<SyncOperation>> {
        let mut operations: Vec<SyncOperation> = self
            .load()?
            .into_iter()
            .filter(|op| op.status == OperationStatus::Pending || op.is_retryable())
            .collect();
        operations.sort_by_key(|op| op.seq);
        Ok(operations)
    }

    /// Marks an operation as picked up by the current pass. A missing id
    /// is a no-op (the record was removed concurrently).
    ///
    /// # Errors
    ///
    /// Returns an error if the queue cannot be read or written.
    pub fn mark_syncing(&self, id: Uuid) -> SyncResult<()> {
        self.update(id, |op| {
            op.status = OperationStatus::Syncing;
        })
    }

    /// Removes a completed operation. Equivalent to [`dequeue`](Self::dequeue).
    ///
    /// # Errors
    ///
    /// Returns an error if the queue cannot be read or written.
    pub fn mark_completed(&self, id: Uuid) -> SyncResult<()> {
        self.dequeue(id)
    }

    /// Records a failed attempt: increments `attempts`, stamps
    /// `last_attempt_at`, stores the failure reason.
    ///
    /// # Errors
    ///
    /// Returns an error if the queue cannot be read or written.
    pub fn mark_failed(&self, id: Uuid, message: impl Into<String>) -> SyncResult<()> {
        let message = message.into();
        self.update(id, |op| {
            op.status = OperationStatus::Failed;
            op.attempts += 1;
            op.last_attempt_at = Some(Utc::now());
            op.error_message = Some(message.clone());
            warn!(id = %op.id, attempts = op.attempts, error = %message, "operation failed");
        })
    }

    fn update(&self, id: Uuid, apply: impl Fn(&mut SyncOperation)) -> SyncResult<()> {
        let _guard = self.write_lock.lock();
        let mut operations = self.load()?;
        if let Some(op) = operations.iter_mut().find(|op| op.id == id) {
            apply(op);
            self.persist(&operations)?;
        }
        Ok(())
    }

    /// Returns every `Failed` operation under the attempt budget to
    /// `Pending` and reports how many were reset. Exhausted operations are
    /// left untouched.
    ///
    /// # Errors
    ///
    /// Returns an error if the queue cannot be read or written.
    pub fn retry_failed(&self) -> SyncResult<usize> {
        let _guard = self.write_lock.lock();
        let mut operations = self.load()?;
        let mut reset = 0;
        for op in operations.iter_mut().filter(|op| op.is_retryable()) {
            op.status = OperationStatus::Pending;
            reset += 1;
        }
        if reset > 0 {
            self.persist(&operations)?;
            debug!(reset, "failed operations re-armed");
        }
        Ok(reset)
    }

    /// Removes `Failed` operations that have exhausted the attempt budget
    /// and returns how many were purged. This is the only exit for dead
    /// operations; the engine never evicts them on its own.
    ///
    /// # Errors
    ///
    /// Returns an error if the queue cannot be read or written.
    pub fn purge_exhausted(&self) -> SyncResult<usize> {
        let _guard = self.write_lock.lock();
        let mut operations = self.load()?;
        let before = operations.len();
        operations.retain(|op| !op.is_exhausted());
        let purged = before - operations.len();
        if purged > 0 {
            self.persist(&operations)?;
            debug!(purged, "exhausted operations purged");
        }
        Ok(purged)
    }

    /// Returns aggregate counts over the persisted collection.
    ///
    /// # Errors
    ///
    /// Returns an error if the queue cannot be read.
    pub fn stats(&self) -> SyncResult<QueueStats> {
        let operations = self.load()?;
        let mut stats = QueueStats {
            total: operations.len(),
            ..QueueStats::default()
        };
        for op in &operations {
            match op.status {
                OperationStatus::Pending => stats.pending += 1,
                OperationStatus::Syncing => stats.syncing += 1,
                OperationStatus::Failed => stats.failed += 1,
            }
        }
        Ok(stats)
    }

    /// Returns the number of persisted operations.
    ///
    /// # Errors
    ///
    /// Returns an error if the queue cannot be read.
    pub fn len(&self) -> SyncResult<usize> {
        Ok(self.load()?.len())
    }

    /// Returns true if nothing is queued.
    ///
    /// # Errors
    ///
    /// Returns an error if the queue cannot be read.
    pub fn is_empty(&self) -> SyncResult<bool> {
        Ok(self.load()?.is_empty())
    }
}
