//! Conflict detection outcomes.

use serde::{Deserialize, Serialize};

/// How a detected conflict was resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictStrategy {
    /// The local pending edit was kept.
    Local,
    /// The remote state was kept; the local edit was discarded.
    /// This is the only strategy the engine produces today.
    Remote,
    /// A merged version was produced.
    Merge,
}

/// Produced when a pending update lost to newer remote state.
///
/// A conflict is a recorded, successful outcome, not an error: the
/// operation that raised it is dequeued and the pass continues. Conflicts
/// are surfaced through the pass report and never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConflictResolution {
    /// The resolution strategy applied.
    pub strategy: ConflictStrategy,
    /// Identifier of the contested entity.
    pub entity_id: String,
    /// The discarded pending payload.
    pub local_version: serde_json::Value,
    /// The entity as currently known remotely.
    pub remote_version: serde_json::Value,
    /// The version written back, if any. Always `None` for remote-wins:
    /// nothing is written, remote truth simply stands.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolved_version: Option<serde_json::Value>,
}

impl ConflictResolution {
    /// Builds the remote-wins outcome: the local edit is dropped in favor
    /// of remote truth, and nothing is written back.
    #[must_use]
    pub fn remote_wins(
        entity_id: impl Into<String>,
        local_version: serde_json::Value,
        remote_version: serde_json::Value,
    ) -> Self {
        Self {
            strategy: ConflictStrategy::Remote,
            entity_id: entity_id.into(),
            local_version,
            remote_version,
            resolved_version: None,
        }
    }
}
