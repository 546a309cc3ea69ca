//! Error types for the client adapter.

use thiserror::Error;

/// Result type for client operations.
pub type ClientResult<T> = Result<T, ClientError>;

/// Errors that can occur inside the client adapter.
///
/// These never cross the CRUD operation boundary: operations catch
/// them, log them, and report a tri-state
/// [`Outcome`](crate::Outcome) instead. Initialization is the one
/// surface where they reach the caller.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Underlying store error.
    #[error("store error: {0}")]
    Store(#[from] logkv_store::StoreError),

    /// A stored record blob failed to decode.
    #[error("corrupt record: {message}")]
    Corrupt {
        /// Description of the decode failure.
        message: String,
    },

    /// Operation issued before `init()` acquired a connection.
    #[error("client is not initialized")]
    NotInitialized,
}

impl ClientError {
    /// Creates a corrupt-record error.
    pub fn corrupt(message: impl Into<String>) -> Self {
        Self::Corrupt {
            message: message.into(),
        }
    }
}
