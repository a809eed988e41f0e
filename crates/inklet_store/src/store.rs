//! Persistent store trait definition.

use crate::error::{StoreError, StoreOp, StoreResult};
use serde::de::DeserializeOwned;
use serde::Serialize;

/// A durable key/value blob store.
///
/// Stores are **opaque byte stores** keyed by UTF-8 strings. Callers own the
/// interpretation of values; the engine layers JSON on top via [`get_json`]
/// and [`set_json`].
///
/// # Invariants
///
/// - `get` after `set` for the same key returns the last written value
/// - `remove` of a missing key succeeds (idempotent)
/// - every failure carries the operation and key ([`StoreError`])
/// - stores must be `Send + Sync` for concurrent access
///
/// # Implementors
///
/// - [`super::MemoryStore`] - for tests and ephemeral sessions
/// - [`super::FileStore`] - for persistent storage
pub trait PersistentStore: Send + Sync {
    /// Reads the value stored under `key`, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying read fails.
    fn get(&self, key: &str) -> StoreResult<Option<Vec<u8>>>;

    /// Stores `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying write fails.
    fn set(&self, key: &str, value: &[u8]) -> StoreResult<()>;

    /// Removes the value stored under `key`. Missing keys are not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying removal fails.
    fn remove(&self, key: &str) -> StoreResult<()>;
}

/// Reads and deserializes the JSON value stored under `key`.
///
/// # Errors
///
/// Returns an error if the read fails or the stored bytes are not valid
/// JSON for `T`.
pub fn get_json<T: DeserializeOwned>(
    store: &dyn PersistentStore,
    key: &str,
) -> StoreResult<Option<T>> {
    match store.get(key)? {
        Some(bytes) => {
            let value = serde_json::from_slice(&bytes)
                .map_err(|e| StoreError::serde(StoreOp::Get, key, e))?;
            Ok(Some(value))
        }
        None => Ok(None),
    }
}

/// Serializes `value` as JSON and stores it under `key`.
///
/// # Errors
///
/// Returns an error if serialization or the underlying write fails.
pub fn set_json<T: Serialize>(
    store: &dyn PersistentStore,
    key: &str,
    value: &T,
) -> StoreResult<()> {
    let bytes =
        serde_json::to_vec(value).map_err(|e| StoreError::serde(StoreOp::Set, key, e))?;
    store.set(key, &bytes)
}
