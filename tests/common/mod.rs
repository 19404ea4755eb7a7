#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

use gtasks_sync::backend::{BackendError, RemoteTask, RemoteTaskList, TaskBackend, TaskStatus};
use gtasks_sync::graph::{DocumentStore, LocalBlock, UserPreferences};
use gtasks_sync::storage::LocalStorage;

/// In-memory task service that records every update it receives.
#[derive(Default)]
pub struct MockBackend {
    lists: Mutex<Vec<RemoteTaskList>>,
    tasks: Mutex<HashMap<String, Vec<RemoteTask>>>,
    updates: Mutex<Vec<(String, RemoteTask)>>,
    revision: Mutex<u32>,
    failure: Mutex<Option<u16>>,
    hold: Mutex<Option<Arc<Notify>>>,
    fetching: Notify,
}

impl MockBackend {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn add_list(&self, id: &str, title: &str) {
        self.lists.lock().unwrap().push(list(id, title));
        self.tasks.lock().unwrap().entry(id.to_string()).or_default();
    }

    pub fn add_task(&self, list_id: &str, task: RemoteTask) {
        self.tasks
            .lock()
            .unwrap()
            .entry(list_id.to_string())
            .or_default()
            .push(task);
    }

    /// Change a stored task the way another client would.
    pub fn edit_task(&self, list_id: &str, task_id: &str, edit: impl FnOnce(&mut RemoteTask)) {
        let mut tasks = self.tasks.lock().unwrap();
        let task = tasks
            .get_mut(list_id)
            .and_then(|tasks| tasks.iter_mut().find(|t| t.id == task_id))
            .expect("task exists");
        edit(task);
    }

    pub fn task(&self, list_id: &str, task_id: &str) -> RemoteTask {
        self.tasks.lock().unwrap()[list_id]
            .iter()
            .find(|t| t.id == task_id)
            .cloned()
            .expect("task exists")
    }

    pub fn updates(&self) -> Vec<(String, RemoteTask)> {
        self.updates.lock().unwrap().clone()
    }

    /// Make every call fail with this HTTP status.
    pub fn fail_with(&self, status: u16) {
        *self.failure.lock().unwrap() = Some(status);
    }

    /// Park the next list fetch until the returned handle is notified.
    pub fn hold_next_fetch(&self) -> Arc<Notify> {
        let release = Arc::new(Notify::new());
        *self.hold.lock().unwrap() = Some(Arc::clone(&release));
        release
    }

    /// Resolves once a held fetch has started.
    pub async fn wait_until_fetching(&self) {
        self.fetching.notified().await;
    }

    fn check_failure(&self) -> Result<(), BackendError> {
        match *self.failure.lock().unwrap() {
            Some(401) => Err(BackendError::Unauthorized("token expired".to_string())),
            Some(status) => Err(BackendError::Http {
                status,
                message: "mock failure".to_string(),
            }),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl TaskBackend for MockBackend {
    fn backend_type(&self) -> &str {
        "mock"
    }

    async fn fetch_task_lists(&self) -> Result<Vec<RemoteTaskList>, BackendError> {
        let hold = self.hold.lock().unwrap().take();
        if let Some(release) = hold {
            self.fetching.notify_one();
            release.notified().await;
        }
        self.check_failure()?;
        Ok(self.lists.lock().unwrap().clone())
    }

    async fn fetch_tasks(&self, list_id: &str) -> Result<Vec<RemoteTask>, BackendError> {
        self.check_failure()?;
        Ok(self.tasks.lock().unwrap().get(list_id).cloned().unwrap_or_default())
    }

    async fn update_task(&self, list_id: &str, task: &RemoteTask) -> Result<RemoteTask, BackendError> {
        self.check_failure()?;
        self.updates.lock().unwrap().push((list_id.to_string(), task.clone()));

        let revision = {
            let mut revision = self.revision.lock().unwrap();
            *revision += 1;
            *revision
        };

        let mut tasks = self.tasks.lock().unwrap();
        let stored = tasks
            .get_mut(list_id)
            .and_then(|tasks| tasks.iter_mut().find(|t| t.id == task.id))
            .ok_or_else(|| BackendError::Http {
                status: 404,
                message: format!("no task {}", task.id),
            })?;
        stored.title = task.title.clone();
        stored.status = task.status;
        stored.due = task.due.clone();
        stored.completed = task.completed.clone();
        stored.updated = Some(format!("2024-06-01T00:00:{revision:02}.000Z"));
        Ok(stored.clone())
    }

    async fn get_task(&self, list_id: &str, task_id: &str) -> Result<RemoteTask, BackendError> {
        self.check_failure()?;
        self.tasks
            .lock()
            .unwrap()
            .get(list_id)
            .and_then(|tasks| tasks.iter().find(|t| t.id == task_id))
            .cloned()
            .ok_or_else(|| BackendError::Http {
                status: 404,
                message: format!("no task {task_id}"),
            })
    }
}

pub fn list(id: &str, title: &str) -> RemoteTaskList {
    RemoteTaskList {
        id: id.to_string(),
        title: title.to_string(),
    }
}

pub fn task(id: &str, title: &str, updated: &str) -> RemoteTask {
    RemoteTask {
        id: id.to_string(),
        title: title.to_string(),
        status: TaskStatus::NeedsAction,
        updated: Some(updated.to_string()),
        due: None,
        completed: None,
        notes: None,
        links: Vec::new(),
        deleted: false,
        hidden: false,
        web_view_link: None,
    }
}

pub async fn memory_store() -> Arc<LocalStorage> {
    memory_store_with(UserPreferences::default()).await
}

pub async fn memory_store_with(preferences: UserPreferences) -> Arc<LocalStorage> {
    Arc::new(LocalStorage::in_memory(preferences).await.unwrap())
}

/// The blocks linked to a task id.
pub async fn linked_blocks(store: &LocalStorage, task_id: &str) -> Vec<LocalBlock> {
    store.query_blocks_by_property("g-id", task_id).await.unwrap()
}

pub async fn linked_block(store: &LocalStorage, task_id: &str) -> LocalBlock {
    let mut blocks = linked_blocks(store, task_id).await;
    assert_eq!(blocks.len(), 1, "expected exactly one block for {task_id}");
    blocks.remove(0)
}
