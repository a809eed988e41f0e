//! Aggregate outcome of one sync pass.

use crate::conflict::ConflictResolution;

/// Aggregate outcome of one sync pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SyncReport {
    /// Operations applied (or resolved by conflict) and removed from the
    /// queue.
    pub successful: u32,
    /// Operations that failed and remain queued.
    pub failed: u32,
    /// Conflicts detected during the pass. Each conflict also counts as a
    /// success: the operation was processed and dequeued.
    pub conflicts: Vec<ConflictResolution>,
}

impl SyncReport {
    /// Creates an empty report.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if nothing failed and nothing conflicted.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failed == 0 && self.conflicts.is_empty()
    }

    /// Records a successfully processed operation.
    pub fn record_success(&mut self) {
        self.successful += 1;
    }

    /// Records a failed operation.
    pub fn record_failure(&mut self) {
        self.failed += 1;
    }

    /// Records a detected conflict.
    pub fn record_conflict(&mut self, conflict: ConflictResolution) {
        self.conflicts.push(conflict);
    }
}
