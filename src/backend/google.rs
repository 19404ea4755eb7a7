//! Google Tasks backend implementation.

use async_trait::async_trait;
use chrono::{Timelike, Utc};
use log::debug;
use reqwest::{Client, Response, StatusCode};
use serde::{Deserialize, Serialize};

use super::{BackendError, RemoteTask, RemoteTaskList, TaskBackend, TaskLink, TaskStatus};
use crate::constants::{GOOGLE_MAX_RESULTS, GOOGLE_TASKS_API};

/// Google Tasks REST v1 backend authenticated with an OAuth2 bearer token.
pub struct GoogleTasksBackend {
    client: Client,
    api_base: String,
    access_token: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TaskListsPage {
    items: Option<Vec<WireTaskList>>,
    next_page_token: Option<String>,
}

#[derive(Deserialize)]
struct WireTaskList {
    id: Option<String>,
    title: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TasksPage {
    items: Option<Vec<WireTask>>,
    next_page_token: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireTask {
    id: Option<String>,
    title: Option<String>,
    status: Option<String>,
    updated: Option<String>,
    due: Option<String>,
    completed: Option<String>,
    notes: Option<String>,
    links: Option<Vec<TaskLink>>,
    deleted: Option<bool>,
    hidden: Option<bool>,
    web_view_link: Option<String>,
}

/// Body of `tasks.update`. `due` and `completed` serialize as `null` when
/// absent so that clearing them on the record clears them remotely.
#[derive(Serialize)]
struct TaskUpdateBody<'a> {
    id: &'a str,
    title: &'a str,
    status: &'a str,
    due: Option<&'a str>,
    completed: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    notes: Option<&'a str>,
}

impl TryFrom<WireTaskList> for RemoteTaskList {
    type Error = BackendError;

    fn try_from(wire: WireTaskList) -> Result<Self, Self::Error> {
        let id = wire
            .id
            .ok_or_else(|| BackendError::InvalidData("task list without id".to_string()))?;
        let title = wire
            .title
            .ok_or_else(|| BackendError::InvalidData(format!("task list {id} without title")))?;
        Ok(RemoteTaskList { id, title })
    }
}

impl TryFrom<WireTask> for RemoteTask {
    type Error = BackendError;

    fn try_from(wire: WireTask) -> Result<Self, Self::Error> {
        let id = wire
            .id
            .ok_or_else(|| BackendError::InvalidData("task without id".to_string()))?;
        let title = wire
            .title
            .ok_or_else(|| BackendError::InvalidData(format!("task {id} without title")))?;
        let raw_status = wire
            .status
            .ok_or_else(|| BackendError::InvalidData(format!("task {id} without status")))?;
        let status = TaskStatus::parse(&raw_status)
            .ok_or_else(|| BackendError::InvalidData(format!("task {id} has unknown status '{raw_status}'")))?;

        Ok(RemoteTask {
            id,
            title,
            status,
            updated: wire.updated,
            due: wire.due,
            completed: wire.completed,
            notes: wire.notes,
            links: wire.links.unwrap_or_default(),
            deleted: wire.deleted.unwrap_or(false),
            hidden: wire.hidden.unwrap_or(false),
            web_view_link: wire.web_view_link,
        })
    }
}

impl GoogleTasksBackend {
    /// Create a new Google Tasks backend with the provided access token.
    pub fn new(access_token: String) -> Self {
        Self::with_api_base(access_token, GOOGLE_TASKS_API.to_string())
    }

    /// Create a backend that talks to a different API root (proxies, test servers).
    pub fn with_api_base(access_token: String, api_base: String) -> Self {
        Self {
            client: Client::new(),
            api_base: api_base.trim_end_matches('/').to_string(),
            access_token,
        }
    }

    // Helper: map non-success responses to BackendError, singling out 401
    async fn check_status(resp: Response) -> Result<Response, BackendError> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }

        let body = resp.text().await.unwrap_or_default();
        let message = truncate_error(&body);
        if status == StatusCode::UNAUTHORIZED {
            Err(BackendError::Unauthorized(message))
        } else {
            Err(BackendError::Http {
                status: status.as_u16(),
                message,
            })
        }
    }

    async fn get_json<T: for<'de> Deserialize<'de>>(
        &self,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<T, BackendError> {
        let resp = self
            .client
            .get(url)
            .bearer_auth(&self.access_token)
            .query(query)
            .send()
            .await
            .map_err(|e| BackendError::Network(e.to_string()))?;

        Self::check_status(resp)
            .await?
            .json::<T>()
            .await
            .map_err(|e| BackendError::InvalidData(e.to_string()))
    }
}

/// A value for `updatedMin` that still matches every task but differs on
/// each request, so list responses are never served from a stale cache.
fn cache_busting_updated_min() -> String {
    format!("1970-01-01T00:00:00.{:09}Z", Utc::now().nanosecond() % 1_000_000_000)
}

pub(crate) fn truncate_error(message: &str) -> String {
    const MAX: usize = 200;
    let trimmed = message.trim();
    if trimmed.chars().count() <= MAX {
        trimmed.to_string()
    } else {
        let head: String = trimmed.chars().take(MAX).collect();
        format!("{head}...")
    }
}

#[async_trait]
impl TaskBackend for GoogleTasksBackend {
    fn backend_type(&self) -> &str {
        "google"
    }

    async fn fetch_task_lists(&self) -> Result<Vec<RemoteTaskList>, BackendError> {
        let url = format!("{}/users/@me/lists", self.api_base);
        let mut lists = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut query = vec![("maxResults", GOOGLE_MAX_RESULTS.to_string())];
            if let Some(token) = &page_token {
                query.push(("pageToken", token.clone()));
            }

            let page: TaskListsPage = self.get_json(&url, &query).await?;
            for wire in page.items.unwrap_or_default() {
                lists.push(RemoteTaskList::try_from(wire)?);
            }

            match page.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break,
            }
        }

        debug!("Fetched {} task lists", lists.len());
        Ok(lists)
    }

    async fn fetch_tasks(&self, list_id: &str) -> Result<Vec<RemoteTask>, BackendError> {
        let url = format!("{}/lists/{}/tasks", self.api_base, list_id);
        let mut tasks = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut query = vec![
                ("maxResults", GOOGLE_MAX_RESULTS.to_string()),
                ("showCompleted", "true".to_string()),
                ("showDeleted", "true".to_string()),
                ("showHidden", "true".to_string()),
                ("updatedMin", cache_busting_updated_min()),
            ];
            if let Some(token) = &page_token {
                query.push(("pageToken", token.clone()));
            }

            let page: TasksPage = self.get_json(&url, &query).await?;
            for wire in page.items.unwrap_or_default() {
                tasks.push(RemoteTask::try_from(wire)?);
            }

            match page.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break,
            }
        }

        debug!("Fetched {} tasks from list {}", tasks.len(), list_id);
        Ok(tasks)
    }

    async fn update_task(&self, list_id: &str, task: &RemoteTask) -> Result<RemoteTask, BackendError> {
        let url = format!("{}/lists/{}/tasks/{}", self.api_base, list_id, task.id);
        let body = TaskUpdateBody {
            id: &task.id,
            title: &task.title,
            status: task.status.as_str(),
            due: task.due.as_deref(),
            completed: task.completed.as_deref(),
            notes: task.notes.as_deref(),
        };

        let resp = self
            .client
            .put(url)
            .bearer_auth(&self.access_token)
            .json(&body)
            .send()
            .await
            .map_err(|e| BackendError::Network(e.to_string()))?;

        let wire: WireTask = Self::check_status(resp)
            .await?
            .json()
            .await
            .map_err(|e| BackendError::InvalidData(e.to_string()))?;
        RemoteTask::try_from(wire)
    }

    async fn get_task(&self, list_id: &str, task_id: &str) -> Result<RemoteTask, BackendError> {
        let url = format!("{}/lists/{}/tasks/{}", self.api_base, list_id, task_id);
        let wire: WireTask = self.get_json(&url, &[]).await?;
        RemoteTask::try_from(wire)
    }
}
