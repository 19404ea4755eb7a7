use anyhow::{anyhow, Result};
use async_trait::async_trait;
use log::debug;
use sea_orm::{ActiveValue, DatabaseTransaction, IntoActiveModel, TransactionTrait};
use uuid::Uuid;

use super::LocalStorage;
use crate::entities::{block, page};
use crate::graph::{
    BlockDraft, BlockParent, DocumentStore, LocalBlock, Page, PageOptions, Properties, UserPreferences,
};
use crate::repositories::{BlockRepository, PageRepository, PropertyRepository};

impl From<page::Model> for Page {
    fn from(model: page::Model) -> Self {
        Self {
            uuid: model.uuid,
            name: model.name,
            original_name: model.original_name,
            journal_day: model.journal_day,
        }
    }
}

impl LocalStorage {
    /// Insert one block row plus its property index rows.
    async fn insert_block_row(
        &self,
        txn: &DatabaseTransaction,
        page_uuid: Uuid,
        parent_uuid: Option<Uuid>,
        order_index: i32,
        draft: &BlockDraft,
    ) -> Result<block::Model> {
        let (marker, deadline) = self.derive_annotations(&draft.content);
        let uuid = Uuid::new_v4();

        let model = block::ActiveModel {
            uuid: ActiveValue::Set(uuid),
            page_uuid: ActiveValue::Set(page_uuid),
            parent_uuid: ActiveValue::Set(parent_uuid),
            order_index: ActiveValue::Set(order_index),
            content: ActiveValue::Set(draft.content.clone()),
            properties: ActiveValue::Set(serde_json::to_string(&draft.properties)?),
            marker: ActiveValue::Set(marker),
            deadline: ActiveValue::Set(deadline),
        };

        let created = BlockRepository::create(txn, model).await?;
        PropertyRepository::replace_for_block(txn, &uuid, &draft.properties).await?;
        Ok(created)
    }

    /// Resolve the page and parent block a batch is inserted under.
    async fn resolve_parent(&self, txn: &DatabaseTransaction, parent: BlockParent) -> Result<(Uuid, Option<Uuid>)> {
        match parent {
            BlockParent::Page(page_uuid) => {
                PageRepository::get_by_uuid(txn, &page_uuid)
                    .await?
                    .ok_or_else(|| anyhow!("Page not found: {}", page_uuid))?;
                Ok((page_uuid, None))
            }
            BlockParent::Block(block_uuid) => {
                let parent_block = BlockRepository::get_by_id(txn, &block_uuid)
                    .await?
                    .ok_or_else(|| anyhow!("Block not found: {}", block_uuid))?;
                Ok((parent_block.page_uuid, Some(block_uuid)))
            }
        }
    }
}

#[async_trait]
impl DocumentStore for LocalStorage {
    async fn get_page(&self, name: &str) -> Result<Option<Page>> {
        Ok(PageRepository::get_by_name(&self.conn, name).await?.map(Page::from))
    }

    async fn create_page(&self, name: &str, options: PageOptions) -> Result<Page> {
        let model = page::ActiveModel {
            uuid: ActiveValue::Set(Uuid::new_v4()),
            name: ActiveValue::Set(name.to_lowercase()),
            original_name: ActiveValue::Set(name.to_string()),
            journal_day: ActiveValue::Set(options.journal_day),
        };
        let created = PageRepository::create(&self.conn, model).await?;
        debug!("Created page '{}'", name);
        Ok(created.into())
    }

    async fn query_blocks_by_property(&self, key: &str, value: &str) -> Result<Vec<LocalBlock>> {
        BlockRepository::get_by_property(&self.conn, key, value)
            .await?
            .into_iter()
            .map(LocalBlock::try_from)
            .collect()
    }

    async fn child_blocks(&self, block_uuid: &Uuid) -> Result<Vec<LocalBlock>> {
        BlockRepository::get_children(&self.conn, block_uuid)
            .await?
            .into_iter()
            .map(LocalBlock::try_from)
            .collect()
    }

    async fn insert_batch_block(&self, parent: BlockParent, blocks: &[BlockDraft]) -> Result<Vec<LocalBlock>> {
        let txn = self.conn.begin().await?;
        let (page_uuid, parent_uuid) = self.resolve_parent(&txn, parent).await?;

        let mut order_index = BlockRepository::next_order_index(&txn, &page_uuid, parent_uuid.as_ref()).await?;
        let mut inserted = Vec::with_capacity(blocks.len());

        for draft in blocks {
            let root = self
                .insert_block_row(&txn, page_uuid, parent_uuid, order_index, draft)
                .await?;
            order_index += 1;

            // Children are written level by level under their freshly created parent
            let mut pending: Vec<(Uuid, &BlockDraft)> = vec![(root.uuid, draft)];
            while let Some((uuid, node)) = pending.pop() {
                for (position, child) in node.children.iter().enumerate() {
                    let created = self
                        .insert_block_row(&txn, page_uuid, Some(uuid), position as i32, child)
                        .await?;
                    pending.push((created.uuid, child));
                }
            }

            inserted.push(LocalBlock::try_from(root)?);
        }

        txn.commit().await?;
        Ok(inserted)
    }

    async fn update_block(&self, block_uuid: &Uuid, content: &str, properties: &Properties) -> Result<()> {
        let txn = self.conn.begin().await?;
        let existing = BlockRepository::get_by_id(&txn, block_uuid)
            .await?
            .ok_or_else(|| anyhow!("Block not found: {}", block_uuid))?;

        let (marker, deadline) = self.derive_annotations(content);
        let mut active_model: block::ActiveModel = existing.into_active_model();
        active_model.content = ActiveValue::Set(content.to_string());
        active_model.properties = ActiveValue::Set(serde_json::to_string(properties)?);
        active_model.marker = ActiveValue::Set(marker);
        active_model.deadline = ActiveValue::Set(deadline);
        BlockRepository::update(&txn, active_model).await?;

        PropertyRepository::replace_for_block(&txn, block_uuid, properties).await?;
        txn.commit().await?;
        Ok(())
    }

    async fn remove_block(&self, block_uuid: &Uuid) -> Result<()> {
        let txn = self.conn.begin().await?;
        let subtree = BlockRepository::get_subtree(&txn, block_uuid).await?;
        for uuid in &subtree {
            PropertyRepository::delete_for_block(&txn, uuid).await?;
        }
        BlockRepository::delete_many(&txn, &subtree).await?;
        txn.commit().await?;
        Ok(())
    }

    async fn user_preferences(&self) -> Result<UserPreferences> {
        Ok(self.preferences.clone())
    }
}
