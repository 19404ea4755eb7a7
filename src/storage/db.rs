use anyhow::{Context, Result};
use log::info;
use sea_orm::sea_query::Index;
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, EntityTrait, Schema};
use std::path::Path;
use uuid::Uuid;

use crate::entities::{block, block_property, page};
use crate::graph::{parse_deadline, parse_marker, LocalBlock, Properties, UserPreferences};
use crate::repositories::BlockRepository;
use crate::utils::datetime::date_to_deadline;

/// SQLite-backed block graph
pub struct LocalStorage {
    pub conn: DatabaseConnection,
    pub(crate) preferences: UserPreferences,
}

impl LocalStorage {
    /// Open (or create) a graph database file.
    pub async fn open<P: AsRef<Path>>(path: P, preferences: UserPreferences) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create graph directory: {}", parent.display()))?;
        }

        let url = format!("sqlite://{}?mode=rwc", path.display());
        info!("💾 Opening graph database at {}", path.display());
        Self::connect(ConnectOptions::new(url), preferences).await
    }

    /// Create a throwaway graph that lives only as long as this value.
    pub async fn in_memory(preferences: UserPreferences) -> Result<Self> {
        // Every pooled connection to `sqlite::memory:` gets its own database
        let mut options = ConnectOptions::new("sqlite::memory:");
        options.max_connections(1).min_connections(1);
        Self::connect(options, preferences).await
    }

    async fn connect(mut options: ConnectOptions, preferences: UserPreferences) -> Result<Self> {
        options.sqlx_logging(false);
        let conn = Database::connect(options)
            .await
            .context("Failed to connect to graph database")?;

        // Page, parent and property rows cascade on delete
        conn.execute_unprepared("PRAGMA foreign_keys = ON")
            .await
            .context("Failed to enable foreign keys")?;

        let storage = LocalStorage { conn, preferences };
        storage.init_schema().await?;
        Ok(storage)
    }

    /// Initialize database schema
    async fn init_schema(&self) -> Result<()> {
        let backend = self.conn.get_database_backend();
        let schema = Schema::new(backend);

        let mut pages = schema.create_table_from_entity(page::Entity);
        pages.if_not_exists();
        self.conn.execute(backend.build(&pages)).await?;

        let mut blocks = schema.create_table_from_entity(block::Entity);
        blocks.if_not_exists();
        self.conn.execute(backend.build(&blocks)).await?;

        let mut properties = schema.create_table_from_entity(block_property::Entity);
        properties.if_not_exists();
        self.conn.execute(backend.build(&properties)).await?;

        let property_lookup = Index::create()
            .if_not_exists()
            .name("idx_block_properties_key_value")
            .table(block_property::Entity)
            .col(block_property::Column::Key)
            .col(block_property::Column::Value)
            .to_owned();
        self.conn.execute(backend.build(&property_lookup)).await?;

        let children_lookup = Index::create()
            .if_not_exists()
            .name("idx_blocks_parent")
            .table(block::Entity)
            .col(block::Column::ParentUuid)
            .to_owned();
        self.conn.execute(backend.build(&children_lookup)).await?;

        Ok(())
    }

    /// Number of blocks in the graph
    pub async fn block_count(&self) -> Result<u64> {
        use sea_orm::PaginatorTrait;
        Ok(block::Entity::find().count(&self.conn).await?)
    }

    /// Top-level blocks of a page, in order
    pub async fn page_blocks(&self, page_uuid: &Uuid) -> Result<Vec<LocalBlock>> {
        BlockRepository::get_top_level(&self.conn, page_uuid)
            .await?
            .into_iter()
            .map(LocalBlock::try_from)
            .collect()
    }

    /// Marker and compact deadline the graph derives from a block's content.
    pub(crate) fn derive_annotations(&self, content: &str) -> (Option<String>, Option<i32>) {
        let marker = parse_marker(content);
        let deadline = parse_deadline(content, &self.preferences.date_format).map(date_to_deadline);
        (marker, deadline)
    }
}

impl TryFrom<block::Model> for LocalBlock {
    type Error = anyhow::Error;

    fn try_from(model: block::Model) -> Result<Self> {
        let properties: Properties = if model.properties.is_empty() {
            Properties::new()
        } else {
            serde_json::from_str(&model.properties)
                .with_context(|| format!("Corrupt property map on block {}", model.uuid))?
        };

        Ok(LocalBlock {
            uuid: model.uuid,
            page_uuid: model.page_uuid,
            parent_uuid: model.parent_uuid,
            order_index: model.order_index,
            content: model.content,
            properties,
            deadline: model.deadline,
            marker: model.marker,
        })
    }
}
