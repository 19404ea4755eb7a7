//! Sync decisions.
//!
//! Reconciliation is a pure function from the fetched remote state and the
//! blocks already linked to it, to a [`SyncPlan`]. Nothing here touches the
//! network or the graph; [`SyncService`](super::SyncService) executes the plan.
//!
//! Every remote task falls into one [`Classification`]:
//!
//! | linked block | `g-updated` == `updated` | local edits | outcome          |
//! |--------------|--------------------------|-------------|------------------|
//! | no           | -                        | -           | New / Skip       |
//! | yes          | no                       | ignored     | RemoteChanged    |
//! | yes          | yes                      | no          | Unchanged        |
//! | yes          | yes                      | yes         | LocalChanged     |
//!
//! Block edits carry no reliable timestamp, so when the remote record moved
//! the remote record always wins.

use chrono::NaiveDate;

use super::codec::{completion_date, deadline_date, derive_title, encode, encoded_title, is_done};
use crate::backend::{RemoteTask, RemoteTaskList, TaskStatus};
use crate::constants::PROP_UPDATED;
use crate::error::{SyncError, SyncResult};
use crate::graph::{BlockDraft, LocalBlock, UserPreferences};
use crate::utils::datetime::{parse_remote_date, to_remote_date};

/// A remote task together with the block currently linked to it.
#[derive(Clone, Debug)]
pub struct SyncEntry {
    pub list: RemoteTaskList,
    pub task: RemoteTask,
    pub existing: Option<LocalBlock>,
}

/// A remote field that push-back can change.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TaskField {
    Title,
    Status,
    Due,
}

/// Local edits to send to the remote service: the remote record with the
/// edits applied, and which fields changed.
#[derive(Clone, Debug, PartialEq)]
pub struct TaskPatch {
    pub task: RemoteTask,
    pub changes: Vec<TaskField>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Classification {
    /// Deleted remotely before it was ever synced
    Skip,
    /// Not in the graph yet; goes to the journal page named `page`
    New { page: String, day: NaiveDate },
    Unchanged,
    /// The remote record changed since the last sync
    RemoteChanged,
    /// Only the block changed. `patch` is `None` when the edit has no remote
    /// counterpart (a removed deadline, say) and the block is re-encoded.
    LocalChanged { patch: Option<TaskPatch> },
}

/// New blocks that go to one page in one batch.
#[derive(Clone, Debug, PartialEq)]
pub struct PageBatch {
    pub page: String,
    pub day: NaiveDate,
    pub drafts: Vec<BlockDraft>,
}

/// A linked block to rewrite from its remote record.
#[derive(Clone, Debug, PartialEq)]
pub struct Overwrite {
    pub block: LocalBlock,
    pub draft: BlockDraft,
}

/// Local edits to push to the remote service before rewriting the block.
#[derive(Clone, Debug, PartialEq)]
pub struct PushBack {
    pub list: RemoteTaskList,
    pub block: LocalBlock,
    pub patch: TaskPatch,
}

/// Everything one sync run is going to write.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SyncPlan {
    /// Batches in order of first appearance of their page
    pub inserts: Vec<PageBatch>,
    pub overwrites: Vec<Overwrite>,
    pub push_backs: Vec<PushBack>,
    pub skipped: usize,
    pub unchanged: usize,
}

impl SyncPlan {
    /// Number of tasks that will cause a write to the graph
    pub fn pending_writes(&self) -> usize {
        self.inserts.iter().map(|b| b.drafts.len()).sum::<usize>() + self.overwrites.len() + self.push_backs.len()
    }

    pub fn is_noop(&self) -> bool {
        self.pending_writes() == 0
    }
}

/// Journal page a new task is filed under: the earlier of its `updated`
/// and `due` dates.
pub fn destination_page(task: &RemoteTask, prefs: &UserPreferences) -> SyncResult<(String, NaiveDate)> {
    let updated = task.updated.as_deref().and_then(parse_remote_date);
    let due = task.due.as_deref().and_then(parse_remote_date);

    let day = match (updated, due) {
        (Some(u), Some(d)) => u.min(d),
        (Some(u), None) => u,
        (None, Some(d)) => d,
        (None, None) => {
            return Err(SyncError::malformed(
                &task.id,
                "neither `updated` nor `due` holds a readable date",
            ))
        }
    };
    Ok((prefs.date_format.format(day), day))
}

/// Work out what a block's edits mean for the remote record.
///
/// Notes are never pushed: the graph's escaping of multi-line notes is lossy
/// and an edit cannot be told apart from an import artifact.
pub fn push_back_patch(block: &LocalBlock, task: &RemoteTask, prefs: &UserPreferences) -> Option<TaskPatch> {
    let mut patched = task.clone();
    let mut changes = Vec::new();

    let title = derive_title(&block.content);
    if title != encoded_title(task, prefs) {
        patched.title = title;
        changes.push(TaskField::Title);
    }

    let done = is_done(block);
    if done && task.status == TaskStatus::NeedsAction {
        patched.status = TaskStatus::Completed;
        if let Some(date) = completion_date(block, &prefs.date_format) {
            patched.completed = Some(to_remote_date(date));
        }
        changes.push(TaskField::Status);
    } else if !done && task.status == TaskStatus::Completed {
        patched.status = TaskStatus::NeedsAction;
        patched.completed = None;
        changes.push(TaskField::Status);
    }

    if let Some(deadline) = deadline_date(block) {
        let remote_due = task.due.as_deref().and_then(parse_remote_date);
        if remote_due != Some(deadline) {
            patched.due = Some(to_remote_date(deadline));
            changes.push(TaskField::Due);
        }
    }

    (!changes.is_empty()).then_some(TaskPatch { task: patched, changes })
}

/// Whether the block's title, status, deadline or completion date differ from the task.
fn has_local_edits(block: &LocalBlock, task: &RemoteTask, prefs: &UserPreferences) -> bool {
    let title_differs = derive_title(&block.content) != encoded_title(task, prefs);
    let status_differs = is_done(block) != task.is_completed();
    let deadline_differs = deadline_date(block) != task.due.as_deref().and_then(parse_remote_date);
    let completion_differs =
        completion_date(block, &prefs.date_format) != task.completed.as_deref().and_then(parse_remote_date);

    title_differs || status_differs || deadline_differs || completion_differs
}

/// Decide what to do with one remote task.
pub fn classify(entry: &SyncEntry, prefs: &UserPreferences) -> SyncResult<Classification> {
    let Some(block) = &entry.existing else {
        if entry.task.deleted {
            return Ok(Classification::Skip);
        }
        let (page, day) = destination_page(&entry.task, prefs)?;
        return Ok(Classification::New { page, day });
    };

    if block.property(PROP_UPDATED) != entry.task.updated {
        return Ok(Classification::RemoteChanged);
    }

    if has_local_edits(block, &entry.task, prefs) {
        Ok(Classification::LocalChanged {
            patch: push_back_patch(block, &entry.task, prefs),
        })
    } else {
        Ok(Classification::Unchanged)
    }
}

/// Build the plan for a whole run.
///
/// A malformed record aborts planning: it means the remote data has a shape
/// the sync does not understand.
pub fn reconcile(entries: Vec<SyncEntry>, prefs: &UserPreferences) -> SyncResult<SyncPlan> {
    let mut plan = SyncPlan::default();

    for entry in entries {
        match classify(&entry, prefs)? {
            Classification::Skip => plan.skipped += 1,
            Classification::Unchanged => plan.unchanged += 1,
            Classification::New { page, day } => {
                let draft = encode(&entry.list, &entry.task, prefs);
                match plan.inserts.iter_mut().find(|batch| batch.page == page) {
                    Some(batch) => batch.drafts.push(draft),
                    None => plan.inserts.push(PageBatch {
                        page,
                        day,
                        drafts: vec![draft],
                    }),
                }
            }
            Classification::RemoteChanged | Classification::LocalChanged { patch: None } => {
                if let Some(block) = entry.existing {
                    let draft = encode(&entry.list, &entry.task, prefs);
                    plan.overwrites.push(Overwrite { block, draft });
                }
            }
            Classification::LocalChanged { patch: Some(patch) } => {
                if let Some(block) = entry.existing {
                    plan.push_backs.push(PushBack {
                        list: entry.list,
                        block,
                        patch,
                    });
                }
            }
        }
    }

    Ok(plan)
}
