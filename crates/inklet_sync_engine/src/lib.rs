//! # Inklet Sync Engine
//!
//! Offline-first synchronization engine for Inklet.
//!
//! This crate provides:
//! - Durable, coalescing mutation queue over a pluggable store
//! - Sequential sync orchestrator with a retry budget per operation
//! - Remote-wins conflict resolution for stale updates
//! - Connectivity monitoring and event-driven sync triggers
//! - Lifecycle event bus for UI observers
//!
//! ## Architecture
//!
//! Local mutations are enqueued immediately and applied to the remote
//! services later, in order, one at a time:
//! 1. Every local edit becomes a durable [`SyncOperation`]
//! 2. A trigger (connectivity regained, foregrounding, manual retry)
//!    starts a pass
//! 3. The orchestrator drains the queue against the remote services
//!
//! ## Key Invariants
//!
//! - At most one queued operation per `(entity_id, kind)` pair
//! - At most one sync pass runs at a time
//! - A failed operation never aborts the pass
//! - The remote version wins any update conflict; local edits are
//!   discarded, never merged

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod error;
mod events;
mod network;
mod orchestrator;
mod queue;
mod service;
mod triggers;

pub use error::{ServiceError, ServiceResult, SyncError, SyncResult};
pub use events::{EventBus, SubscriptionId, SyncEvent};
pub use network::{ConnectivityProbe, NetworkMonitor, NetworkStatus, StaticProbe};
pub use orchestrator::{SyncOrchestrator, LAST_SYNC_KEY};
pub use queue::{QueueStats, SyncQueue, QUEUE_KEY};
pub use service::{ContentService, MockContentService, RecordedCall};
pub use triggers::{RetryOutcome, SyncTriggers};

pub use inklet_sync_types::SyncOperation;
