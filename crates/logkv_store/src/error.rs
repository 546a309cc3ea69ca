//! Error types for store operations.

use std::io;
use thiserror::Error;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The log file is corrupted.
    #[error("log corrupted: {0}")]
    Corrupted(String),

    /// The named log does not exist and creation was not requested.
    #[error("log not found: {name}")]
    LogNotFound {
        /// Name of the log.
        name: String,
    },

    /// The configured backend is not available in this build.
    #[error("unsupported backend: {kind}")]
    UnsupportedBackend {
        /// Description of the backend.
        kind: String,
    },

    /// Operation on a transaction that was already committed or aborted.
    #[error("transaction is closed")]
    TransactionClosed,
}
