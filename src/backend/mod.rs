//! Remote task service abstraction.
//!
//! This module defines the interface the sync engine uses to talk to the
//! remote task-list service, along with the typed records it returns and
//! the error kinds callers need to tell apart.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::constants::{STATUS_COMPLETED, STATUS_NEEDS_ACTION};

pub mod google;

/// Error types for remote service operations.
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    /// HTTP 401: the access token is missing, revoked or expired.
    #[error("Authorization expired (HTTP 401): {0}")]
    Unauthorized(String),

    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),
}

impl BackendError {
    /// HTTP status code carried by this error, if any.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            BackendError::Unauthorized(_) => Some(401),
            BackendError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// A task list as reported by the remote service.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteTaskList {
    pub id: String,
    pub title: String,
}

/// Completion state of a remote task.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskStatus {
    #[serde(rename = "needsAction")]
    NeedsAction,
    #[serde(rename = "completed")]
    Completed,
}

impl TaskStatus {
    /// Wire representation used by the remote API
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::NeedsAction => STATUS_NEEDS_ACTION,
            TaskStatus::Completed => STATUS_COMPLETED,
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            STATUS_NEEDS_ACTION => Some(TaskStatus::NeedsAction),
            STATUS_COMPLETED => Some(TaskStatus::Completed),
            _ => None,
        }
    }
}

/// A link attached to a remote task (e.g. the email it was created from).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskLink {
    #[serde(rename = "type", default)]
    pub link_type: String,
    #[serde(default)]
    pub description: String,
    pub link: String,
}

/// A task as reported by the remote service.
///
/// `updated` is kept verbatim: it is compared as a string against the value
/// recorded on the local block at the last sync.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteTask {
    pub id: String,
    pub title: String,
    pub status: TaskStatus,
    pub updated: Option<String>,
    pub due: Option<String>,
    pub completed: Option<String>,
    pub notes: Option<String>,
    pub links: Vec<TaskLink>,
    pub deleted: bool,
    pub hidden: bool,
    pub web_view_link: Option<String>,
}

impl RemoteTask {
    pub fn is_completed(&self) -> bool {
        self.status == TaskStatus::Completed
    }
}

/// Remote service interface consumed by the sync engine.
///
/// Implementations page through list endpoints themselves: every fetch
/// returns the complete collection, and an empty collection is a normal
/// result rather than an error.
#[async_trait]
pub trait TaskBackend: Send + Sync {
    /// Returns the backend type identifier (e.g., "google").
    fn backend_type(&self) -> &str;

    async fn fetch_task_lists(&self) -> Result<Vec<RemoteTaskList>, BackendError>;
    async fn fetch_tasks(&self, list_id: &str) -> Result<Vec<RemoteTask>, BackendError>;

    /// Write the mutable fields of `task` (title, status, due, completed) back to the service.
    async fn update_task(&self, list_id: &str, task: &RemoteTask) -> Result<RemoteTask, BackendError>;

    /// Fetch the canonical record of a single task.
    async fn get_task(&self, list_id: &str, task_id: &str) -> Result<RemoteTask, BackendError>;
}
