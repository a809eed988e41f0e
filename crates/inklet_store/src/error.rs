//! Error types for store operations.

use std::fmt;
use std::io;
use thiserror::Error;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// The store operation that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreOp {
    /// A read of a stored value.
    Get,
    /// A write of a stored value.
    Set,
    /// A removal of a stored value.
    Remove,
}

impl fmt::Display for StoreOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreOp::Get => write!(f, "get"),
            StoreOp::Set => write!(f, "set"),
            StoreOp::Remove => write!(f, "remove"),
        }
    }
}

/// Errors that can occur during store operations.
///
/// Every failure names the operation and the key it failed on; callers
/// decide whether to retry. Nothing is silently swallowed.
#[derive(Debug, Error)]
pub enum StoreError {
    /// An I/O error occurred while touching a key.
    #[error("{op} failed for key {key:?}: {source}")]
    Io {
        /// The operation that failed.
        op: StoreOp,
        /// The key being accessed.
        key: String,
        /// The underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// A stored value could not be serialized or deserialized.
    #[error("{op} failed for key {key:?}: {source}")]
    Serde {
        /// The operation that failed.
        op: StoreOp,
        /// The key being accessed.
        key: String,
        /// The underlying serde error.
        #[source]
        source: serde_json::Error,
    },

    /// The key cannot be represented by this backend.
    #[error("invalid key {key:?}: {reason}")]
    InvalidKey {
        /// The offending key.
        key: String,
        /// Why the key was rejected.
        reason: String,
    },
}

impl StoreError {
    /// Creates an I/O error for the given operation and key.
    pub fn io(op: StoreOp, key: impl Into<String>, source: io::Error) -> Self {
        Self::Io {
            op,
            key: key.into(),
            source,
        }
    }

    /// Creates a serde error for the given operation and key.
    pub fn serde(op: StoreOp, key: impl Into<String>, source: serde_json::Error) -> Self {
        Self::Serde {
            op,
            key: key.into(),
            source,
        }
    }

    /// Returns the key the failed operation was addressing.
    pub fn key(&self) -> &str {
        match self {
            StoreError::Io { key, .. }
            | StoreError::Serde { key, .. }
            | StoreError::InvalidKey { key, .. } => key,
        }
    }
}
