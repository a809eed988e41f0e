//! Queued sync operations.

use crate::entity::{ContentDraft, ContentPatch};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Maximum number of failed attempts before an operation is no longer
/// offered for retry.
pub const MAX_ATTEMPTS: u32 = 3;

/// Kinds of entity a mutation can target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    /// A content entity (drafts, posts).
    Content,
    /// A platform connection. Reserved; accepted as a no-op today.
    Platform,
    /// Creator settings. Reserved; accepted as a no-op today.
    Settings,
    /// Persisted by an unknown or newer writer. Dispatch fails the
    /// operation instead of poisoning the whole queue load.
    #[serde(other)]
    Unknown,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityKind::Content => write!(f, "content"),
            EntityKind::Platform => write!(f, "platform"),
            EntityKind::Settings => write!(f, "settings"),
            EntityKind::Unknown => write!(f, "unknown"),
        }
    }
}

/// Lifecycle status of a queued operation.
///
/// Completed operations are removed from the queue, never stored with a
/// terminal status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationStatus {
    /// Waiting for a sync pass.
    Pending,
    /// Picked up by the current sync pass.
    Syncing,
    /// The last attempt failed; retry-eligible while under the attempt budget.
    Failed,
}

/// Kind of mutation, derived from the payload variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    /// Create a new entity.
    Create,
    /// Apply a partial edit.
    Update,
    /// Delete the entity.
    Delete,
    /// Publish the entity.
    Publish,
    /// Schedule the entity for future publication.
    Schedule,
    /// Persisted by an unknown or newer writer.
    Unknown,
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OperationKind::Create => write!(f, "create"),
            OperationKind::Update => write!(f, "update"),
            OperationKind::Delete => write!(f, "delete"),
            OperationKind::Publish => write!(f, "publish"),
            OperationKind::Schedule => write!(f, "schedule"),
            OperationKind::Unknown => write!(f, "unknown"),
        }
    }
}

/// Payload of a queued mutation, keyed by operation kind.
///
/// Each variant carries its own validated shape; there is no untyped blob
/// to re-validate at dispatch time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OperationPayload {
    /// Full entity for a create.
    Create {
        /// The locally drafted entity.
        entity: ContentDraft,
    },
    /// Partial fields plus conflict basis for an update.
    Update {
        /// The pending edit.
        patch: ContentPatch,
    },
    /// Delete the entity remotely.
    Delete,
    /// Publish the entity remotely.
    Publish,
    /// Schedule the entity for publication.
    Schedule {
        /// Target publication time.
        publish_at: DateTime<Utc>,
    },
    /// Written by an unknown or newer writer; fails at dispatch, not at
    /// queue load.
    #[serde(other)]
    Unknown,
}

impl OperationPayload {
    /// Returns the operation kind this payload encodes.
    #[must_use]
    pub fn kind(&self) -> OperationKind {
        match self {
            OperationPayload::Create { .. } => OperationKind::Create,
            OperationPayload::Update { .. } => OperationKind::Update,
            OperationPayload::Delete => OperationKind::Delete,
            OperationPayload::Publish => OperationKind::Publish,
            OperationPayload::Schedule { .. } => OperationKind::Schedule,
            OperationPayload::Unknown => OperationKind::Unknown,
        }
    }
}

/// A durable record of one pending local mutation.
///
/// # Invariants
///
/// - At most one operation exists per `(entity_id, kind)` pair; a second
///   enqueue of the same pair coalesces into the existing record.
/// - `seq` is assigned once at first enqueue and kept across coalescing, so
///   stored order is explicit rather than an artifact of array position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncOperation {
    /// Unique operation identifier.
    pub id: Uuid,
    /// Persisted FIFO position within the queue.
    pub seq: u64,
    /// The kind of entity this mutation targets.
    pub entity_kind: EntityKind,
    /// Identifier of the target entity.
    pub entity_id: String,
    /// The mutation payload, tagged by operation kind.
    pub payload: OperationPayload,
    /// When the operation was first enqueued.
    pub created_at: DateTime<Utc>,
    /// Count of failed sync attempts.
    pub attempts: u32,
    /// When the most recent attempt ran.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_attempt_at: Option<DateTime<Utc>>,
    /// Current lifecycle status.
    pub status: OperationStatus,
    /// Reason for the last failure.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl SyncOperation {
    /// Creates a new pending operation with a fresh id and the given
    /// queue position.
    #[must_use]
    pub fn new(
        seq: u64,
        entity_kind: EntityKind,
        entity_id: impl Into<String>,
        payload: OperationPayload,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            seq,
            entity_kind,
            entity_id: entity_id.into(),
            payload,
            created_at: Utc::now(),
            attempts: 0,
            last_attempt_at: None,
            status: OperationStatus::Pending,
            error_message: None,
        }
    }

    /// Returns the operation kind encoded by the payload.
    #[must_use]
    pub fn kind(&self) -> OperationKind {
        self.payload.kind()
    }

    /// Returns true if a new mutation for `entity_id` of `kind` should
    /// replace this record rather than appending a duplicate.
    #[must_use]
    pub fn coalesces_with(&self, entity_id: &str, kind: OperationKind) -> bool {
        self.entity_id == entity_id && self.kind() == kind
    }

    /// Returns true if this operation failed but remains within the
    /// attempt budget.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        self.status == OperationStatus::Failed && self.attempts < MAX_ATTEMPTS
    }

    /// Returns true if this operation failed and has exhausted the
    /// attempt budget.
    #[must_use]
    pub fn is_exhausted(&self) -> bool {
        self.status == OperationStatus::Failed && self.attempts >= MAX_ATTEMPTS
    }
}
