//! Error types for the clawd-store crate.
//!
//! All storage operations return [`StoreError`] via [`StoreResult`].
//! Persistence failures are never swallowed: a write that did not reach the
//! disk surfaces to the caller.

use std::path::PathBuf;

use thiserror::Error;

/// Alias for `Result<T, StoreError>`.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur in the memory store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Reading or writing a memory file failed.
    #[error("io error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// JSON serialization or deserialization failed.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// A persisted document exists but does not have the expected shape.
    #[error("corrupt memory file {path}: {reason}")]
    Corrupt { path: PathBuf, reason: String },

    /// An invalid argument was provided to a store operation.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

impl StoreError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
