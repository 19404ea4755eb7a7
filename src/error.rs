//! Error types for a sync run.

use thiserror::Error;

use crate::backend::BackendError;

/// Result type alias for sync operations
pub type SyncResult<T> = Result<T, SyncError>;

/// Errors that abort a sync run.
///
/// Duplicate local blocks for one remote task are not errors; they are
/// logged as warnings and the first block is used.
#[derive(Error, Debug)]
pub enum SyncError {
    /// The remote service answered HTTP 401; the user has to sign in again.
    #[error("Authorization expired: {0}")]
    AuthorizationExpired(String),

    #[error("Transport error: {0}")]
    Transport(BackendError),

    #[error("Malformed task {task_id}: {reason}")]
    MalformedRecord { task_id: String, reason: String },

    #[error("Local store error: {0}")]
    Store(#[from] anyhow::Error),
}

impl SyncError {
    pub fn malformed(task_id: impl Into<String>, reason: impl Into<String>) -> Self {
        SyncError::MalformedRecord {
            task_id: task_id.into(),
            reason: reason.into(),
        }
    }

    /// Whether the caller should send the user through authentication again
    pub fn is_authorization_expired(&self) -> bool {
        matches!(self, SyncError::AuthorizationExpired(_))
    }
}

impl From<BackendError> for SyncError {
    fn from(err: BackendError) -> Self {
        match err {
            BackendError::Unauthorized(message) => SyncError::AuthorizationExpired(message),
            other => SyncError::Transport(other),
        }
    }
}
