//! Synchronization service module for gtasks-sync.
//!
//! This module provides the [`SyncService`] struct which runs one full sync
//! between a remote task backend and the local block graph:
//!
//! 1. [`fetch`] pulls every task list and task from the backend
//! 2. [`index`] resolves each task to the block already linked to it
//! 3. [`reconcile`] classifies each task and builds a [`SyncPlan`]
//! 4. the plan is executed through the [`writer`], pushing local edits
//!    back to the backend first where needed
//!
//! [`codec`] holds the mapping between a task and its block.

pub mod codec;
pub mod fetch;
pub mod index;
pub mod reconcile;
pub mod writer;

use log::{error, info};
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::backend::TaskBackend;
use crate::constants::{LOG_SYNC_FINISHED, LOG_SYNC_STARTED};
use crate::error::SyncResult;
use crate::graph::{DocumentStore, UserPreferences};
use codec::encode;
use index::LocalIndex;
use reconcile::{reconcile, PushBack, SyncEntry, SyncPlan};
use writer::{LocalWriter, WriteStats};

/// Service that synchronizes a remote task backend into the local graph.
///
/// # Features
/// - Backend-agnostic architecture via trait abstraction
/// - Store-agnostic: any [`DocumentStore`] can be the target
/// - Prevents concurrent sync operations
/// - Idempotent: a second run without remote changes writes nothing
///
/// # Example
/// ```rust,no_run
/// use gtasks_sync::backend::google::GoogleTasksBackend;
/// use gtasks_sync::graph::UserPreferences;
/// use gtasks_sync::storage::LocalStorage;
/// use gtasks_sync::sync::SyncService;
/// use std::sync::Arc;
///
/// # async fn example() -> anyhow::Result<()> {
/// let storage = LocalStorage::open("graph.db", UserPreferences::default()).await?;
/// let backend = GoogleTasksBackend::new("access-token".to_string());
/// let sync_service = SyncService::new(Arc::new(backend), Arc::new(storage));
///
/// let status = sync_service.sync().await?;
/// println!("{status:?}");
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct SyncService {
    backend: Arc<dyn TaskBackend>,
    store: Arc<dyn DocumentStore>,
    /// Held for the whole of a run; dropping the run releases it
    sync_lock: Arc<Mutex<()>>,
    concurrent_fetch: bool,
}

/// Outcome of a call to [`SyncService::sync`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncStatus {
    /// Another sync was already running; nothing was done
    InProgress,
    /// The run completed
    Success(SyncReport),
}

/// What a completed sync run did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// Tasks inserted as new blocks
    pub created: usize,
    /// Blocks rewritten from a changed remote record
    pub updated: usize,
    /// Blocks whose edits were pushed to the remote service
    pub pushed: usize,
    pub unchanged: usize,
    /// Deleted remote tasks that were never synced
    pub skipped: usize,
    pub writes: WriteStats,
}

impl SyncReport {
    pub fn summary(&self) -> String {
        format!(
            "Created {} | Updated {} | Pushed {} | Unchanged {} | Skipped {}",
            self.created, self.updated, self.pushed, self.unchanged, self.skipped
        )
    }
}

impl SyncService {
    /// Creates a new `SyncService` for a backend and a graph.
    pub fn new(backend: Arc<dyn TaskBackend>, store: Arc<dyn DocumentStore>) -> Self {
        Self {
            backend,
            store,
            sync_lock: Arc::new(Mutex::new(())),
            concurrent_fetch: true,
        }
    }

    /// Whether the per-list task fetches run in parallel (the default).
    pub fn with_concurrent_fetch(mut self, concurrent_fetch: bool) -> Self {
        self.concurrent_fetch = concurrent_fetch;
        self
    }

    /// Checks if a synchronization operation is currently in progress.
    pub fn is_syncing(&self) -> bool {
        self.sync_lock.try_lock().is_err()
    }

    /// Performs a full synchronization.
    ///
    /// Only one sync runs at a time; a call made while another is running
    /// returns [`SyncStatus::InProgress`] immediately. A failure aborts the
    /// run without undoing the writes already made, and the next run picks
    /// up from there. Dropping the returned future ends the run as well.
    ///
    /// # Errors
    /// - [`crate::error::SyncError::AuthorizationExpired`] when the backend answers 401
    /// - [`crate::error::SyncError::Transport`] for any other backend failure
    /// - [`crate::error::SyncError::MalformedRecord`] for a task that cannot be placed
    /// - [`crate::error::SyncError::Store`] when the graph rejects a read or write
    pub async fn sync(&self) -> SyncResult<SyncStatus> {
        // The guard lives until this future completes or is dropped
        let Ok(_sync_guard) = Arc::clone(&self.sync_lock).try_lock_owned() else {
            return Ok(SyncStatus::InProgress);
        };

        self.perform_sync()
            .await
            .map(SyncStatus::Success)
            .inspect_err(|e| error!("❌ Sync failed: {e}"))
    }

    /// Compute what a sync would do without writing anything.
    pub async fn plan(&self) -> SyncResult<SyncPlan> {
        let prefs = self.store.user_preferences().await?;
        let entries = self.collect_entries().await?;
        reconcile(entries, &prefs)
    }

    /// Fetch the remote state and resolve every task against the local index.
    async fn collect_entries(&self) -> SyncResult<Vec<SyncEntry>> {
        let pairs = fetch::fetch_remote_state(Arc::clone(&self.backend), self.concurrent_fetch).await?;

        let index = LocalIndex::new(self.store.as_ref());
        let mut entries = Vec::with_capacity(pairs.len());
        for (list, task) in pairs {
            let existing = index.find_block_by_remote_id(&task.id).await?;
            entries.push(SyncEntry { list, task, existing });
        }
        Ok(entries)
    }

    /// Internal sync implementation
    async fn perform_sync(&self) -> SyncResult<SyncReport> {
        info!("{LOG_SYNC_STARTED}");

        let prefs = self.store.user_preferences().await?;
        let entries = self.collect_entries().await?;
        let plan = reconcile(entries, &prefs)?;

        let mut report = SyncReport {
            skipped: plan.skipped,
            unchanged: plan.unchanged,
            ..SyncReport::default()
        };
        let mut writer = LocalWriter::new(self.store.as_ref());

        for overwrite in &plan.overwrites {
            writer.overwrite(&overwrite.block, &overwrite.draft).await?;
            report.updated += 1;
        }

        for push_back in &plan.push_backs {
            self.push_back(&mut writer, push_back, &prefs).await?;
            report.pushed += 1;
        }

        for batch in &plan.inserts {
            writer.insert_page_batch(batch).await?;
            report.created += batch.drafts.len();
        }

        report.writes = writer.stats();
        info!("{LOG_SYNC_FINISHED}: {}", report.summary());
        Ok(report)
    }

    /// Send local edits to the backend, then rewrite the block from the
    /// canonical record so its `g-updated` matches the server again.
    async fn push_back(
        &self,
        writer: &mut LocalWriter<'_>,
        push_back: &PushBack,
        prefs: &UserPreferences,
    ) -> SyncResult<()> {
        let list_id = &push_back.list.id;
        let task_id = &push_back.patch.task.id;
        info!(
            "⬆️  Pushing {:?} of task {} to {}",
            push_back.patch.changes,
            task_id,
            self.backend.backend_type()
        );

        self.backend.update_task(list_id, &push_back.patch.task).await?;
        let canonical = self.backend.get_task(list_id, task_id).await?;

        let draft = encode(&push_back.list, &canonical, prefs);
        writer.overwrite(&push_back.block, &draft).await?;
        Ok(())
    }
}
