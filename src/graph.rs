//! Local document graph interface.
//!
//! The graph is a set of pages, each holding an ordered tree of blocks. A
//! block has text content and a property map. The sync engine only touches
//! the graph through [`DocumentStore`], so it can run against the bundled
//! SQLite store or any other host that implements the trait.

use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::constants::{DEADLINE_PREFIX, KNOWN_MARKERS};
use crate::utils::datetime::GraphDateFormat;

/// A block property value: plain text or a list of strings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    Text(String),
    List(Vec<String>),
}

impl PropertyValue {
    /// The value as a single string; lists are joined with `", "`.
    pub fn as_text(&self) -> String {
        match self {
            PropertyValue::Text(text) => text.clone(),
            PropertyValue::List(items) => items.join(", "),
        }
    }
}

impl From<&str> for PropertyValue {
    fn from(value: &str) -> Self {
        PropertyValue::Text(value.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(value: String) -> Self {
        PropertyValue::Text(value)
    }
}

/// Ordered property map of a block
pub type Properties = BTreeMap<String, PropertyValue>;

/// A page in the graph.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Page {
    pub uuid: Uuid,
    /// Lower-cased lookup name
    pub name: String,
    /// Name as the user typed it
    pub original_name: String,
    /// `yyyymmdd` for journal pages
    pub journal_day: Option<i32>,
}

/// A block as stored in the graph.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LocalBlock {
    pub uuid: Uuid,
    pub page_uuid: Uuid,
    pub parent_uuid: Option<Uuid>,
    pub order_index: i32,
    pub content: String,
    pub properties: Properties,
    /// Compact `yyyymmdd` deadline parsed from the content
    pub deadline: Option<i32>,
    /// Leading task marker of the content (`TODO`, `DONE`, ...)
    pub marker: Option<String>,
}

impl LocalBlock {
    pub fn property(&self, key: &str) -> Option<String> {
        self.properties.get(key).map(PropertyValue::as_text)
    }
}

/// Content, properties and children of a block that is about to be written.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BlockDraft {
    pub content: String,
    pub properties: Properties,
    pub children: Vec<BlockDraft>,
}

/// Where a batch of blocks is inserted.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BlockParent {
    /// Appended as top-level blocks of the page
    Page(Uuid),
    /// Appended as children of the block
    Block(Uuid),
}

/// Options accepted by [`DocumentStore::create_page`].
#[derive(Clone, Copy, Debug, Default)]
pub struct PageOptions {
    /// Create the page as a journal page for this `yyyymmdd` day
    pub journal_day: Option<i32>,
}

/// User preferences the graph exposes to plugins.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UserPreferences {
    /// Pattern for journal page titles and date references
    pub date_format: GraphDateFormat,
    /// Marker for open tasks, `TODO` or `LATER`
    pub todo_marker: String,
}

impl Default for UserPreferences {
    fn default() -> Self {
        Self {
            date_format: GraphDateFormat::default(),
            todo_marker: crate::constants::MARKER_TODO.to_string(),
        }
    }
}

/// Leading task marker of a block's content, if the first word is one.
pub fn parse_marker(content: &str) -> Option<String> {
    let first = content.lines().next()?.split_whitespace().next()?;
    KNOWN_MARKERS.contains(&first).then(|| first.to_string())
}

/// Deadline written on a `DEADLINE: <...>` line of the content.
///
/// The date inside the angle brackets is read with the user's pattern first
/// and then as the graph-native `yyyy-MM-dd EEE` form.
pub fn parse_deadline(content: &str, date_format: &GraphDateFormat) -> Option<NaiveDate> {
    content.lines().find_map(|line| {
        let rest = line.trim().strip_prefix(DEADLINE_PREFIX)?;
        let inner = rest.trim().strip_prefix('<')?.split('>').next()?.trim();
        date_format.parse(inner).or_else(|| {
            inner
                .get(..10)
                .and_then(|prefix| NaiveDate::parse_from_str(prefix, "%Y-%m-%d").ok())
        })
    })
}

/// Local store operations used by the sync engine.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Look up a page by name, case-insensitively.
    async fn get_page(&self, name: &str) -> Result<Option<Page>>;

    async fn create_page(&self, name: &str, options: PageOptions) -> Result<Page>;

    /// All blocks whose property `key` equals `value`, ordered by page and position.
    async fn query_blocks_by_property(&self, key: &str, value: &str) -> Result<Vec<LocalBlock>>;

    /// Direct children of a block, in order.
    async fn child_blocks(&self, block_uuid: &Uuid) -> Result<Vec<LocalBlock>>;

    /// Insert drafts (with their children) after the existing blocks under `parent`.
    async fn insert_batch_block(&self, parent: BlockParent, blocks: &[BlockDraft]) -> Result<Vec<LocalBlock>>;

    /// Replace a block's content and its whole property set.
    async fn update_block(&self, block_uuid: &Uuid, content: &str, properties: &Properties) -> Result<()>;

    /// Remove a block together with its descendants.
    async fn remove_block(&self, block_uuid: &Uuid) -> Result<()>;

    async fn user_preferences(&self) -> Result<UserPreferences>;
}
