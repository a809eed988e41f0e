//! Event-driven entry points that start a sync pass.

use crate::error::{SyncError, SyncResult};
use crate::network::{NetworkMonitor, NetworkStatus};
use crate::orchestrator::SyncOrchestrator;
use crate::queue::SyncQueue;
use inklet_sync_types::SyncReport;
use std::sync::Arc;
use tracing::{debug, info};

/// Outcome of a manual retry request.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryOutcome {
    /// How many failed operations were returned to pending.
    pub reset: usize,
    /// The report of the pass that followed, if one ran.
    pub report: Option<SyncReport>,
}

/// Routes platform signals into sync passes.
///
/// Sync is purely event-driven; there is no polling timer. A pass starts
/// on exactly three signals: the network coming back after being offline,
/// the app foregrounding with work queued, and an explicit retry request.
pub struct SyncTriggers {
    monitor: Arc<NetworkMonitor>,
    queue: Arc<SyncQueue>,
    orchestrator: Arc<SyncOrchestrator>,
}

impl SyncTriggers {
    /// Wires the triggers over the given monitor, queue and orchestrator.
    #[must_use]
    pub fn new(
        monitor: Arc<NetworkMonitor>,
        queue: Arc<SyncQueue>,
        orchestrator: Arc<SyncOrchestrator>,
    ) -> Self {
        Self {
            monitor,
            queue,
            orchestrator,
        }
    }

    /// Feeds in an OS connectivity transition. Starts a pass only on an
    /// offline-to-online edge; returns its report when one ran.
    ///
    /// # Errors
    ///
    /// Returns an error if the pass aborted. An in-flight pass is not an
    /// error here; the result is `Ok(None)`.
    pub fn handle_network_change(&self, status: NetworkStatus) -> SyncResult<Option<SyncReport>> {
        let previous = self.monitor.observe(status);
        if !NetworkMonitor::came_online(previous, status) {
            return Ok(None);
        }
        info!("connectivity regained, starting sync");
        self.try_sync()
    }

    /// Handles the app returning to the foreground. Starts a pass only
    /// when online with work queued.
    ///
    /// # Errors
    ///
    /// Returns an error if the queue cannot be read or the pass aborted.
    pub fn handle_foreground(&self) -> SyncResult<Option<SyncReport>> {
        if !self.monitor.status().is_online() {
            debug!("foregrounded while offline, sync deferred");
            return Ok(None);
        }
        if self.orchestrator.pending_count()? == 0 {
            return Ok(None);
        }
        info!("foregrounded with work queued, starting sync");
        self.try_sync()
    }

    /// Handles an explicit retry request: re-arms failed operations, then
    /// probes the connection and runs a pass if reachable.
    ///
    /// # Errors
    ///
    /// Returns an error if the queue cannot be read or written, or the
    /// pass aborted.
    pub fn handle_manual_retry(&self) -> SyncResult<RetryOutcome> {
        let reset = self.queue.retry_failed()?;
        debug!(reset, "manual retry requested");
        if !self.monitor.check_connection() {
            return Ok(RetryOutcome {
                reset,
                report: None,
            });
        }
        let report = self.try_sync()?;
        Ok(RetryOutcome { reset, report })
    }

    /// Runs a pass, treating an already-running pass as "nothing to do".
    fn try_sync(&self) -> SyncResult<Option<SyncReport>> {
        match self.orchestrator.sync() {
            Ok(report) => Ok(Some(report)),
            Err(SyncError::AlreadySyncing) => {
                debug!("pass already in flight, trigger dropped");
                Ok(None)
            }
            Err(error) => Err(error),
        }
    }
}
