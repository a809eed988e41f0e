//! # Inklet Sync Types
//!
//! The sync data model for Inklet: queued operations, conflict outcomes,
//! and pass reports.
//!
//! This crate defines the shapes persisted by the sync queue and consumed
//! by the orchestrator:
//! - [`SyncOperation`] - one durable record of a pending local mutation
//! - [`OperationPayload`] - a tagged union keyed by operation kind
//! - [`ConflictResolution`] - a remote-wins outcome, produced but never stored
//! - [`SyncReport`] - the aggregate result of one sync pass
//!
//! ## Key Invariants
//!
//! - At most one queued operation per `(entity_id, kind)` pair (coalescing)
//! - Completed operations are removed, never retained with a status
//! - Unknown entity or payload kinds deserialize to `Unknown` variants and
//!   fail at dispatch, not at queue load

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod conflict;
mod entity;
mod operation;
mod report;

pub use conflict::{ConflictResolution, ConflictStrategy};
pub use entity::{ContentDraft, ContentEntity, ContentPatch};
pub use operation::{
    EntityKind, OperationKind, OperationPayload, OperationStatus, SyncOperation, MAX_ATTEMPTS,
};
pub use report::SyncReport;
