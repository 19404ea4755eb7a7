//! Retrieval of the complete remote state.

use log::{error, info};
use std::sync::Arc;
use tokio::task::JoinSet;

use crate::backend::{BackendError, RemoteTask, RemoteTaskList, TaskBackend};
use crate::constants::LOG_ERROR_FETCH;

/// Fetch every task list and all of its tasks, flattened into
/// `(list, task)` pairs in list order.
///
/// With `concurrent` set, the per-list task fetches run in parallel. The
/// first failure aborts the remaining fetches.
pub async fn fetch_remote_state(
    backend: Arc<dyn TaskBackend>,
    concurrent: bool,
) -> Result<Vec<(RemoteTaskList, RemoteTask)>, BackendError> {
    let lists = backend.fetch_task_lists().await.inspect_err(|e| {
        error!("{LOG_ERROR_FETCH}: task lists: {e}");
    })?;
    info!("✅ Fetched {} task lists from {}", lists.len(), backend.backend_type());

    let mut tasks_per_list: Vec<Vec<RemoteTask>> = vec![Vec::new(); lists.len()];

    if concurrent {
        let mut fetches = JoinSet::new();
        for (position, list) in lists.iter().enumerate() {
            let backend = Arc::clone(&backend);
            let list_id = list.id.clone();
            fetches.spawn(async move { (position, backend.fetch_tasks(&list_id).await) });
        }

        while let Some(joined) = fetches.join_next().await {
            let (position, result) =
                joined.map_err(|e| BackendError::Network(format!("task fetch did not complete: {e}")))?;
            match result {
                Ok(tasks) => tasks_per_list[position] = tasks,
                Err(e) => {
                    error!("{LOG_ERROR_FETCH}: list {}: {e}", lists[position].id);
                    return Err(e);
                }
            }
        }
    } else {
        for (position, list) in lists.iter().enumerate() {
            tasks_per_list[position] = backend.fetch_tasks(&list.id).await.inspect_err(|e| {
                error!("{LOG_ERROR_FETCH}: list {}: {e}", list.id);
            })?;
        }
    }

    let pairs: Vec<(RemoteTaskList, RemoteTask)> = lists
        .into_iter()
        .zip(tasks_per_list)
        .flat_map(|(list, tasks)| tasks.into_iter().map(move |task| (list.clone(), task)))
        .collect();

    info!("✅ Fetched {} tasks from {}", pairs.len(), backend.backend_type());
    Ok(pairs)
}
