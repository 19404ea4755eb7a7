//! Graph writes performed by a sync run.

use anyhow::Result;
use log::{debug, info};

use super::codec::is_generated_child;
use super::reconcile::PageBatch;
use crate::graph::{BlockDraft, BlockParent, DocumentStore, LocalBlock, PageOptions};
use crate::utils::datetime::date_to_deadline;

/// Counters for the writes issued against the graph.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct WriteStats {
    pub pages_created: usize,
    pub blocks_inserted: usize,
    pub blocks_updated: usize,
    pub blocks_removed: usize,
}

impl WriteStats {
    pub fn total(&self) -> usize {
        self.pages_created + self.blocks_inserted + self.blocks_updated + self.blocks_removed
    }
}

/// Applies inserts and overwrites to a [`DocumentStore`].
pub struct LocalWriter<'a> {
    store: &'a dyn DocumentStore,
    stats: WriteStats,
}

impl<'a> LocalWriter<'a> {
    pub fn new(store: &'a dyn DocumentStore) -> Self {
        Self {
            store,
            stats: WriteStats::default(),
        }
    }

    pub fn stats(&self) -> WriteStats {
        self.stats
    }

    /// Insert a batch of new task blocks at the end of its journal page,
    /// creating the page first when it does not exist.
    pub async fn insert_page_batch(&mut self, batch: &PageBatch) -> Result<Vec<LocalBlock>> {
        let page = match self.store.get_page(&batch.page).await? {
            Some(page) => page,
            None => {
                let options = PageOptions {
                    journal_day: Some(date_to_deadline(batch.day)),
                };
                let page = self.store.create_page(&batch.page, options).await?;
                self.stats.pages_created += 1;
                info!("📄 Created page '{}'", batch.page);
                page
            }
        };

        let inserted = self
            .store
            .insert_batch_block(BlockParent::Page(page.uuid), &batch.drafts)
            .await?;
        self.stats.blocks_inserted += inserted.len();
        info!("✅ Inserted {} task(s) into '{}'", inserted.len(), batch.page);
        Ok(inserted)
    }

    /// Rewrite a block from a draft.
    ///
    /// Content and properties are replaced outright. Generated notes/links
    /// children are dropped and re-inserted from the draft after any child
    /// the user added by hand.
    pub async fn overwrite(&mut self, block: &LocalBlock, draft: &BlockDraft) -> Result<()> {
        self.store
            .update_block(&block.uuid, &draft.content, &draft.properties)
            .await?;
        self.stats.blocks_updated += 1;

        for child in self.store.child_blocks(&block.uuid).await? {
            if is_generated_child(&child) {
                self.store.remove_block(&child.uuid).await?;
                self.stats.blocks_removed += 1;
            }
        }

        if !draft.children.is_empty() {
            let inserted = self
                .store
                .insert_batch_block(BlockParent::Block(block.uuid), &draft.children)
                .await?;
            self.stats.blocks_inserted += inserted.len();
        }

        debug!("Overwrote block {}", block.uuid);
        Ok(())
    }
}
