//! Drains the queue against the remote services.

use crate::error::{ServiceError, SyncError, SyncResult};
use crate::events::{EventBus, SyncEvent};
use crate::queue::SyncQueue;
use crate::service::ContentService;
use chrono::{DateTime, Utc};
use inklet_store::{get_json, set_json, PersistentStore};
use inklet_sync_types::{
    ConflictResolution, EntityKind, OperationPayload, SyncOperation, SyncReport,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Storage key holding the timestamp of the last completed pass.
pub const LAST_SYNC_KEY: &str = "sync/last_synced_at";

/// Drains the durable queue against the remote services, one operation at
/// a time, in queue order.
///
/// At most one pass runs at a time; a second [`sync`](Self::sync) while
/// one is in flight returns [`SyncError::AlreadySyncing`] immediately. A
/// pass never aborts on a single operation failure: the failed record is
/// marked and the pass moves on.
pub struct SyncOrchestrator {
    store: Arc<dyn PersistentStore>,
    queue: Arc<SyncQueue>,
    content: Arc<dyn ContentService>,
    events: Arc<EventBus>,
    syncing: AtomicBool,
}

impl SyncOrchestrator {
    /// Wires an orchestrator over the given store, queue, service and bus.
    #[must_use]
    pub fn new(
        store: Arc<dyn PersistentStore>,
        queue: Arc<SyncQueue>,
        content: Arc<dyn ContentService>,
        events: Arc<EventBus>,
    ) -> Self {
        Self {
            store,
            queue,
            content,
            events,
            syncing: AtomicBool::new(false),
        }
    }

    /// Runs one sync pass over the current work list and returns the
    /// aggregate report.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::AlreadySyncing`] if a pass is already running,
    /// or a store error if the queue or sync state cannot be read or
    /// written. Individual operation failures do not fail the pass; they
    /// are counted in the report.
    pub fn sync(&self) -> SyncResult<SyncReport> {
        if self
            .syncing
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(SyncError::AlreadySyncing);
        }

        self.events.emit(&SyncEvent::SyncStarted);
        let outcome = self.run_pass();
        self.syncing.store(false, Ordering::SeqCst);

        match &outcome {
            Ok(report) => {
                info!(
                    successful = report.successful,
                    failed = report.failed,
                    conflicts = report.conflicts.len(),
                    "sync pass finished"
                );
                self.events.emit(&SyncEvent::SyncCompleted(report.clone()));
            }
            Err(error) => {
                warn!(%error, "sync pass aborted");
                self.events.emit(&SyncEvent::SyncFailed {
                    message: error.to_string(),
                });
            }
        }
        outcome
    }

    fn run_pass(&self) -> SyncResult<SyncReport> {
        let operations = self.queue.pending_operations()?;
        debug!(count = operations.len(), "draining queue");
        let mut report = SyncReport::new();

        for operation in operations {
            self.queue.mark_syncing(operation.id)?;
            match self.apply_operation(&operation) {
                Ok(conflict) => {
                    self.queue.mark_completed(operation.id)?;
                    report.record_success();
                    if let Some(conflict) = conflict {
                        report.record_conflict(conflict);
                    }
                    self.events.emit(&SyncEvent::OperationCompleted(operation));
                }
                Err(error) => {
                    let message = error.to_string();
                    self.queue.mark_failed(operation.id, &message)?;
                    report.record_failure();
                    self.events
                        .emit(&SyncEvent::OperationFailed { operation, message });
                }
            }
        }

        set_json(self.store.as_ref(), LAST_SYNC_KEY, &Utc::now())?;
        Ok(report)
    }

    /// Applies one operation against the matching remote service. Returns
    /// a conflict record when the remote version won.
    fn apply_operation(&self, operation: &SyncOperation) -> SyncResult<Option<ConflictResolution>> {
        match operation.entity_kind {
            EntityKind::Content => self.apply_content(operation),
            // Queueable but with no remote side wired yet; draining them
            // keeps the queue from pinning on unshipped services.
            EntityKind::Platform | EntityKind::Settings => Ok(None),
            EntityKind::Unknown => Err(SyncError::UnknownEntityKind {
                operation_id: operation.id,
            }),
        }
    }

    fn apply_content(&self, operation: &SyncOperation) -> SyncResult<Option<ConflictResolution>> {
        match &operation.payload {
            OperationPayload::Create { entity } => {
                self.content.create(entity)?;
                Ok(None)
            }
            OperationPayload::Update { patch } => {
                let remote = self
                    .content
                    .get_by_id(&operation.entity_id)?
                    .ok_or_else(|| ServiceError::NotFound(operation.entity_id.clone()))?;

                // Remote wins only when strictly newer than the edit's
                // basis. An absent basis dates the edit to the epoch, so
                // any real remote timestamp supersedes it.
                if remote.updated_at > patch.basis() {
                    debug!(
                        entity_id = %operation.entity_id,
                        remote_at = %remote.updated_at,
                        basis = %patch.basis(),
                        "remote version wins, local edit discarded"
                    );
                    let conflict = ConflictResolution::remote_wins(
                        operation.entity_id.clone(),
                        serde_json::to_value(patch)?,
                        serde_json::to_value(&remote)?,
                    );
                    return Ok(Some(conflict));
                }

                self.content.update(&operation.entity_id, patch)?;
                Ok(None)
            }
            OperationPayload::Delete => {
                self.content.delete(&operation.entity_id)?;
                Ok(None)
            }
            OperationPayload::Publish => {
                self.content.publish(&operation.entity_id)?;
                Ok(None)
            }
            OperationPayload::Schedule { publish_at } => {
                self.content.schedule(&operation.entity_id, *publish_at)?;
                Ok(None)
            }
            OperationPayload::Unknown => Err(SyncError::UnknownOperation {
                entity_kind: operation.entity_kind,
                kind: operation.kind(),
            }),
        }
    }

    /// Returns when the last pass completed, if one ever has.
    ///
    /// # Errors
    ///
    /// Returns an error if the stored timestamp cannot be read.
    pub fn last_sync_time(&self) -> SyncResult<Option<DateTime<Utc>>> {
        Ok(get_json(self.store.as_ref(), LAST_SYNC_KEY)?)
    }

    /// Returns true while a pass is in flight.
    #[must_use]
    pub fn is_syncing(&self) -> bool {
        self.syncing.load(Ordering::SeqCst)
    }

    /// Returns how many operations the next pass would pick up.
    ///
    /// # Errors
    ///
    /// Returns an error if the queue cannot be read.
    pub fn pending_count(&self) -> SyncResult<usize> {
        Ok(self.queue.pending_operations()?.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::{MockContentService, RecordedCall};
    use chrono::Duration;
    use inklet_store::MemoryStore;
    use inklet_sync_types::{ConflictStrategy, ContentDraft, ContentPatch, MAX_ATTEMPTS};

    struct Fixture {
        queue: Arc<SyncQueue>,
        service: Arc<MockContentService>,
        orchestrator: SyncOrchestrator,
    }

    fn make_fixture() -> Fixture {
        let store: Arc<MemoryStore> = Arc::new(MemoryStore::new());
        let queue = Arc::new(SyncQueue::new(store.clone()));
        let service = Arc::new(MockContentService::new());
        let orchestrator = SyncOrchestrator::new(
            store,
            queue.clone(),
            service.clone(),
            Arc::new(EventBus::new()),
        );
        Fixture {
            queue,
            service,
            orchestrator,
        }
    }

    fn seed_remote(service: &MockContentService, id: &str, updated_at: DateTime<Utc>) {
        service.insert_remote(inklet_sync_types::ContentEntity {
            id: id.to_string(),
            title: "Remote".to_string(),
            body: "Remote body".to_string(),
            updated_at,
        });
    }

    #[test]
    fn clean_pass_drains_the_queue() {
        let fx = make_fixture();
        let basis = Utc::now();
        seed_remote(&fx.service, "c1", basis - Duration::minutes(5));
        seed_remote(&fx.service, "c2", basis - Duration::minutes(5));

        for id in ["c1", "c2"] {
            fx.queue
                .enqueue(
                    EntityKind::Content,
                    id,
                    OperationPayload::Update {
                        patch: ContentPatch::default().with_title("Edited").with_basis(basis),
                    },
                )
                .unwrap();
        }

        let report = fx.orchestrator.sync().unwrap();
        assert_eq!(report.successful, 2);
        assert_eq!(report.failed, 0);
        assert!(report.conflicts.is_empty());
        assert!(report.is_clean());
        assert!(fx.queue.is_empty().unwrap());
    }

    #[test]
    fn stale_basis_yields_remote_wins_conflict() {
        let fx = make_fixture();
        let remote_at = Utc::now();
        seed_remote(&fx.service, "c1", remote_at);

        let basis = remote_at - Duration::minutes(10);
        fx.queue
            .enqueue(
                EntityKind::Content,
                "c1",
                OperationPayload::Update {
                    patch: ContentPatch::default().with_title("Stale").with_basis(basis),
                },
            )
            .unwrap();

        let report = fx.orchestrator.sync().unwrap();
        assert_eq!(report.successful, 1);
        assert_eq!(report.conflicts.len(), 1);
        assert_eq!(report.conflicts[0].strategy, ConflictStrategy::Remote);
        assert_eq!(report.conflicts[0].entity_id, "c1");
        assert!(fx.queue.is_empty().unwrap());

        // Only the fetch happened; the stale edit never reached the server.
        assert!(!fx
            .service
            .calls()
            .iter()
            .any(|call| matches!(call, RecordedCall::Update(_))));
        assert_eq!(fx.service.remote_entity("c1").unwrap().title, "Remote");
    }

    #[test]
    fn patch_without_basis_always_loses_to_remote() {
        let fx = make_fixture();
        seed_remote(&fx.service, "c1", Utc::now() - Duration::days(365));

        fx.queue
            .enqueue(
                EntityKind::Content,
                "c1",
                OperationPayload::Update {
                    patch: ContentPatch::default().with_title("No basis"),
                },
            )
            .unwrap();

        let report = fx.orchestrator.sync().unwrap();
        assert_eq!(report.conflicts.len(), 1);
    }

    #[test]
    fn failed_operation_stays_queued_with_message() {
        let fx = make_fixture();
        fx.queue
            .enqueue(EntityKind::Content, "c1", OperationPayload::Publish)
            .unwrap();
        fx.service
            .set_failure(ServiceError::Network("socket closed".to_string()));

        let report = fx.orchestrator.sync().unwrap();
        assert_eq!(report.successful, 0);
        assert_eq!(report.failed, 1);

        let stored = &fx.queue.pending_operations().unwrap()[0];
        assert_eq!(stored.attempts, 1);
        assert!(stored.error_message.as_deref().unwrap().contains("socket closed"));
    }

    #[test]
    fn failure_does_not_abort_the_pass() {
        let fx = make_fixture();
        // First target missing remotely, second publish succeeds.
        fx.queue
            .enqueue(
                EntityKind::Content,
                "ghost",
                OperationPayload::Update {
                    patch: ContentPatch::default().with_title("Edited"),
                },
            )
            .unwrap();
        fx.queue
            .enqueue(EntityKind::Content, "c2", OperationPayload::Publish)
            .unwrap();

        let report = fx.orchestrator.sync().unwrap();
        assert_eq!(report.failed, 1);
        assert_eq!(report.successful, 1);
    }

    #[test]
    fn three_failed_passes_exhaust_the_budget() {
        let fx = make_fixture();
        fx.queue
            .enqueue(EntityKind::Content, "c1", OperationPayload::Publish)
            .unwrap();
        fx.service
            .set_failure(ServiceError::Server("500".to_string()));

        for _ in 0..MAX_ATTEMPTS {
            fx.orchestrator.sync().unwrap();
        }

        let stats = fx.queue.stats().unwrap();
        assert_eq!(stats.failed, 1);
        assert_eq!(fx.orchestrator.pending_count().unwrap(), 0);
        assert_eq!(fx.queue.retry_failed().unwrap(), 0);

        // A fourth pass finds nothing to do.
        let report = fx.orchestrator.sync().unwrap();
        assert_eq!(report.successful + report.failed, 0);
    }

    #[test]
    fn unknown_payload_fails_without_a_service_call() {
        let fx = make_fixture();
        fx.queue
            .enqueue(EntityKind::Content, "c1", OperationPayload::Unknown)
            .unwrap();

        let report = fx.orchestrator.sync().unwrap();
        assert_eq!(report.failed, 1);
        assert!(fx.service.calls().is_empty());
    }

    #[test]
    fn create_then_publish_in_queue_order() {
        let fx = make_fixture();
        fx.queue
            .enqueue(
                EntityKind::Content,
                "c1",
                OperationPayload::Create {
                    entity: ContentDraft {
                        id: "c1".to_string(),
                        title: "Draft".to_string(),
                        body: "Body".to_string(),
                        updated_at: Utc::now(),
                    },
                },
            )
            .unwrap();
        fx.queue
            .enqueue(EntityKind::Content, "c1", OperationPayload::Publish)
            .unwrap();

        let report = fx.orchestrator.sync().unwrap();
        assert_eq!(report.successful, 2);
        assert_eq!(
            fx.service.calls(),
            vec![
                RecordedCall::Create("c1".to_string()),
                RecordedCall::Publish("c1".to_string()),
            ]
        );
    }

    #[test]
    fn last_sync_time_is_stamped_after_a_pass() {
        let fx = make_fixture();
        assert!(fx.orchestrator.last_sync_time().unwrap().is_none());

        let before = Utc::now();
        fx.orchestrator.sync().unwrap();

        let stamped = fx.orchestrator.last_sync_time().unwrap().unwrap();
        assert!(stamped >= before);
        assert!(!fx.orchestrator.is_syncing());
    }
}
