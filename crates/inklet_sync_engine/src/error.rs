//! Error types for the sync engine.

use inklet_store::StoreError;
use inklet_sync_types::{EntityKind, OperationKind};
use thiserror::Error;
use uuid::Uuid;

/// Result type for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Errors that can occur while queueing or draining mutations.
#[derive(Debug, Error)]
pub enum SyncError {
    /// A sync pass is already running. The caller must retry on the next
    /// trigger; a second pass is never queued.
    #[error("sync already in progress")]
    AlreadySyncing,

    /// The persisted queue or sync state could not be read or written.
    /// Queue state may be stale after this.
    #[error("persistence error: {0}")]
    Store(#[from] StoreError),

    /// A remote entity-service call failed.
    #[error(transparent)]
    Service(#[from] ServiceError),

    /// The queue held an operation for an entity kind this engine does
    /// not recognize. Malformed queue data, not a transient condition.
    #[error("unknown entity kind for operation {operation_id}")]
    UnknownEntityKind {
        /// The affected queue record.
        operation_id: Uuid,
    },

    /// The queue held a payload this engine cannot dispatch for the
    /// given entity kind.
    #[error("unsupported {kind} operation for {entity_kind} entity")]
    UnknownOperation {
        /// The entity kind being dispatched.
        entity_kind: EntityKind,
        /// The undispatchable operation kind.
        kind: OperationKind,
    },

    /// A value could not be serialized while building a conflict record.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Errors returned by the remote entity services.
#[derive(Debug, Clone, Error)]
pub enum ServiceError {
    /// The request never completed; retry-eligible.
    #[error("network error: {0}")]
    Network(String),

    /// The server rejected or failed the request; retry-eligible.
    #[error("server error: {0}")]
    Server(String),

    /// The remote entity does not exist. Retrying will not help until the
    /// entity reappears remotely.
    #[error("entity {0} not found")]
    NotFound(String),
}

/// Result type for entity-service calls.
pub type ServiceResult<T> = Result<T, ServiceError>;
