//! Page repository for database operations.

use anyhow::Result;
use sea_orm::{ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter};
use uuid::Uuid;

use crate::entities::page;

/// Repository for page-related database operations.
pub struct PageRepository;

impl PageRepository {
    /// Get a page by name. Names are matched case-insensitively.
    pub async fn get_by_name<C>(conn: &C, name: &str) -> Result<Option<page::Model>>
    where
        C: ConnectionTrait,
    {
        Ok(page::Entity::find()
            .filter(page::Column::Name.eq(name.to_lowercase()))
            .one(conn)
            .await?)
    }

    /// Get a page by UUID.
    pub async fn get_by_uuid<C>(conn: &C, uuid: &Uuid) -> Result<Option<page::Model>>
    where
        C: ConnectionTrait,
    {
        Ok(page::Entity::find()
            .filter(page::Column::Uuid.eq(*uuid))
            .one(conn)
            .await?)
    }

    /// Create a new page.
    pub async fn create<C>(conn: &C, page: page::ActiveModel) -> Result<page::Model>
    where
        C: ConnectionTrait,
    {
        Ok(page.insert(conn).await?)
    }
}
