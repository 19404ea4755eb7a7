//! Lookup of the block linked to a remote task.

use anyhow::Result;
use log::warn;

use crate::constants::{LOG_DUPLICATE_BLOCKS, PROP_TASK_ID};
use crate::graph::{DocumentStore, LocalBlock};

/// Read-only view of the graph keyed by remote task id.
pub struct LocalIndex<'a> {
    store: &'a dyn DocumentStore,
}

impl<'a> LocalIndex<'a> {
    pub fn new(store: &'a dyn DocumentStore) -> Self {
        Self { store }
    }

    /// The block carrying `g-id:: <task_id>`.
    ///
    /// When several blocks claim the same task, the first one in page and
    /// position order is used and the others are ignored for this run.
    pub async fn find_block_by_remote_id(&self, task_id: &str) -> Result<Option<LocalBlock>> {
        let mut matches = self.store.query_blocks_by_property(PROP_TASK_ID, task_id).await?;

        if matches.len() > 1 {
            let ignored: Vec<String> = matches[1..].iter().map(|b| b.uuid.to_string()).collect();
            warn!(
                "{}: task {} -> using {}, ignoring {}",
                LOG_DUPLICATE_BLOCKS,
                task_id,
                matches[0].uuid,
                ignored.join(", ")
            );
        }

        Ok(if matches.is_empty() {
            None
        } else {
            Some(matches.swap_remove(0))
        })
    }
}
