//! Sync lifecycle events and the subscriber registry.

use inklet_sync_types::{SyncOperation, SyncReport};
use parking_lot::RwLock;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::warn;

/// Lifecycle events published during a sync pass. Events are delivered to
/// subscribers and never persisted.
#[derive(Debug, Clone)]
pub enum SyncEvent {
    /// A sync pass started.
    SyncStarted,
    /// A sync pass finished; carries the aggregate report.
    SyncCompleted(SyncReport),
    /// A sync pass aborted before completing.
    SyncFailed {
        /// Why the pass aborted.
        message: String,
    },
    /// One queued operation was applied and dequeued.
    OperationCompleted(SyncOperation),
    /// One queued operation failed and remains queued.
    OperationFailed {
        /// The operation as it was when picked up.
        operation: SyncOperation,
        /// Why it failed.
        message: String,
    },
}

/// Identifier handed out by [`EventBus::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Listener = Arc<dyn Fn(&SyncEvent) + Send + Sync>;

/// Registry of independent sync-event subscribers.
///
/// Multiple subscribers (a UI badge, toast notifications) receive every
/// event without interfering with one another. Unsubscribing is
/// idempotent, and a panicking subscriber cannot crash the emitter or
/// starve the others.
#[derive(Default)]
pub struct EventBus {
    next_id: AtomicU64,
    listeners: RwLock<Vec<(SubscriptionId, Listener)>>,
}

impl EventBus {
    /// Creates an empty bus.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a listener and returns its subscription id.
    pub fn subscribe(
        &self,
        listener: impl Fn(&SyncEvent) + Send + Sync + 'static,
    ) -> SubscriptionId {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::SeqCst));
        self.listeners.write().push((id, Arc::new(listener)));
        id
    }

    /// Removes a listener. Removing an unknown or already-removed id is a
    /// no-op.
    pub fn unsubscribe(&self, id: SubscriptionId) {
        self.listeners.write().retain(|(sid, _)| *sid != id);
    }

    /// Returns the number of active subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.listeners.read().len()
    }

    /// Delivers `event` to every subscriber.
    pub fn emit(&self, event: &SyncEvent) {
        // Snapshot the listeners so a subscriber may (un)subscribe from
        // inside its callback without deadlocking.
        let listeners: Vec<(SubscriptionId, Listener)> = self.listeners.read().clone();
        for (id, listener) in listeners {
            if catch_unwind(AssertUnwindSafe(|| listener(event))).is_err() {
                warn!(subscription = id.0, "sync event subscriber panicked");
            }
        }
    }
}
