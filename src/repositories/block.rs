//! Block repository for database operations.

use anyhow::Result;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder, QuerySelect, QueryTrait,
};
use uuid::Uuid;

use crate::entities::{block, block_property};

/// Repository for block-related database operations.
pub struct BlockRepository;

impl BlockRepository {
    /// Get a single block by UUID.
    pub async fn get_by_id<C>(conn: &C, uuid: &Uuid) -> Result<Option<block::Model>>
    where
        C: ConnectionTrait,
    {
        Ok(block::Entity::find()
            .filter(block::Column::Uuid.eq(*uuid))
            .one(conn)
            .await?)
    }

    /// Get blocks whose indexed property `key` equals `value`, ordered by page and position.
    pub async fn get_by_property<C>(conn: &C, key: &str, value: &str) -> Result<Vec<block::Model>>
    where
        C: ConnectionTrait,
    {
        Ok(block::Entity::find()
            .filter(
                block::Column::Uuid.in_subquery(
                    block_property::Entity::find()
                        .filter(block_property::Column::Key.eq(key))
                        .filter(block_property::Column::Value.eq(value))
                        .select_only()
                        .column(block_property::Column::BlockUuid)
                        .into_query(),
                ),
            )
            .order_by_asc(block::Column::PageUuid)
            .order_by_asc(block::Column::OrderIndex)
            .order_by_asc(block::Column::Uuid)
            .all(conn)
            .await?)
    }

    /// Get the direct children of a block in order.
    pub async fn get_children<C>(conn: &C, parent_uuid: &Uuid) -> Result<Vec<block::Model>>
    where
        C: ConnectionTrait,
    {
        Ok(block::Entity::find()
            .filter(block::Column::ParentUuid.eq(*parent_uuid))
            .order_by_asc(block::Column::OrderIndex)
            .all(conn)
            .await?)
    }

    /// Get the top-level blocks of a page in order.
    pub async fn get_top_level<C>(conn: &C, page_uuid: &Uuid) -> Result<Vec<block::Model>>
    where
        C: ConnectionTrait,
    {
        Ok(block::Entity::find()
            .filter(block::Column::PageUuid.eq(*page_uuid))
            .filter(block::Column::ParentUuid.is_null())
            .order_by_asc(block::Column::OrderIndex)
            .all(conn)
            .await?)
    }

    /// Order index for a block appended after the existing siblings.
    pub async fn next_order_index<C>(conn: &C, page_uuid: &Uuid, parent_uuid: Option<&Uuid>) -> Result<i32>
    where
        C: ConnectionTrait,
    {
        let siblings = match parent_uuid {
            Some(parent) => Self::get_children(conn, parent).await?,
            None => Self::get_top_level(conn, page_uuid).await?,
        };
        Ok(siblings.last().map(|b| b.order_index + 1).unwrap_or(0))
    }

    /// Collect a block and all of its descendants, parents first.
    pub async fn get_subtree<C>(conn: &C, uuid: &Uuid) -> Result<Vec<Uuid>>
    where
        C: ConnectionTrait,
    {
        let mut subtree = vec![*uuid];
        let mut cursor = 0;
        while cursor < subtree.len() {
            let children = Self::get_children(conn, &subtree[cursor]).await?;
            subtree.extend(children.into_iter().map(|c| c.uuid));
            cursor += 1;
        }
        Ok(subtree)
    }

    /// Create a new block.
    pub async fn create<C>(conn: &C, block: block::ActiveModel) -> Result<block::Model>
    where
        C: ConnectionTrait,
    {
        Ok(block.insert(conn).await?)
    }

    /// Update a block in the database.
    pub async fn update<C>(conn: &C, block: block::ActiveModel) -> Result<block::Model>
    where
        C: ConnectionTrait,
    {
        Ok(block.update(conn).await?)
    }

    /// Delete blocks by UUID.
    pub async fn delete_many<C>(conn: &C, uuids: &[Uuid]) -> Result<()>
    where
        C: ConnectionTrait,
    {
        block::Entity::delete_many()
            .filter(block::Column::Uuid.is_in(uuids.iter().copied()))
            .exec(conn)
            .await?;
        Ok(())
    }
}
