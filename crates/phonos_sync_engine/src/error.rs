//! Error types for the sync engine.

use thiserror::Error;

/// Result type for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Errors that can occur while syncing one entity type.
///
/// Any of these inside a type's page loop fails only that type's sub-sync
/// for the current session; the coordinator logs it and the type is
/// revisited on the next run. Nothing here ever propagates out of
/// [`SyncCoordinator::sync_with_server`](crate::SyncCoordinator::sync_with_server).
#[derive(Error, Debug)]
pub enum SyncError {
    /// Connection error or non-success HTTP status.
    #[error("network error: {message}")]
    Network {
        /// Error message.
        message: String,
        /// Whether a later run is likely to succeed.
        retryable: bool,
    },

    /// A bounded request exceeded its timeout. Treated as a page failure.
    #[error("request timed out")]
    Timeout,

    /// Response body did not match the expected shape.
    #[error("decode error: {0}")]
    Decode(String),

    /// The local entity or status store raised.
    #[error("local store error: {0}")]
    LocalStore(String),
}

impl SyncError {
    /// Creates a retryable network error.
    pub fn network_retryable(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
            retryable: true,
        }
    }

    /// Creates a non-retryable network error.
    pub fn network_fatal(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
            retryable: false,
        }
    }

    /// Returns true if a later sync run is likely to succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            SyncError::Network { retryable, .. } => *retryable,
            SyncError::Timeout => true,
            SyncError::Decode(_) => false,
            SyncError::LocalStore(_) => false,
        }
    }
}
