//! Property index repository.

use anyhow::Result;
use sea_orm::{ActiveValue, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter};
use uuid::Uuid;

use crate::entities::block_property;
use crate::graph::Properties;

/// Repository for the `block_properties` lookup table.
pub struct PropertyRepository;

impl PropertyRepository {
    /// Replace every indexed property of a block with `properties`.
    pub async fn replace_for_block<C>(conn: &C, block_uuid: &Uuid, properties: &Properties) -> Result<()>
    where
        C: ConnectionTrait,
    {
        Self::delete_for_block(conn, block_uuid).await?;

        if properties.is_empty() {
            return Ok(());
        }

        let rows = properties.iter().map(|(key, value)| block_property::ActiveModel {
            block_uuid: ActiveValue::Set(*block_uuid),
            key: ActiveValue::Set(key.clone()),
            value: ActiveValue::Set(value.as_text()),
        });
        block_property::Entity::insert_many(rows).exec(conn).await?;
        Ok(())
    }

    /// Drop the index rows of a block.
    pub async fn delete_for_block<C>(conn: &C, block_uuid: &Uuid) -> Result<()>
    where
        C: ConnectionTrait,
    {
        block_property::Entity::delete_many()
            .filter(block_property::Column::BlockUuid.eq(*block_uuid))
            .exec(conn)
            .await?;
        Ok(())
    }
}
