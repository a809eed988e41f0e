//! # Inklet Store
//!
//! Durable key/value blob storage for Inklet.
//!
//! This crate provides:
//! - The [`PersistentStore`] trait (get/set/remove over opaque bytes)
//! - JSON helpers layered on the byte contract ([`get_json`]/[`set_json`])
//! - [`MemoryStore`] for tests and ephemeral sessions
//! - [`FileStore`] for storage that survives restarts
//!
//! ## Key Invariants
//!
//! - Every failure names the operation and key ([`StoreError`])
//! - `remove` of a missing key is idempotent
//! - `FileStore` writes are atomic (temp file + rename)

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod error;
mod file;
mod memory;
mod store;

pub use error::{StoreError, StoreOp, StoreResult};
pub use file::FileStore;
pub use memory::MemoryStore;
pub use store::{get_json, set_json, PersistentStore};
