//! Mapping between remote tasks and graph blocks.
//!
//! A synced task becomes one block:
//!
//! ```text
//! TODO Buy milk
//! DEADLINE: <2024-03-01>
//! g-id:: abc123
//! g-list-id:: list1
//! g-list:: [[Groceries]]
//! g-updated:: 2024-02-28T09:12:44.000Z
//! g-link:: https://tasks.google.com/task/abc123
//!   - <notes>            (g-context:: notes)
//!   - ```json <links>``` (g-context:: links)
//! ```
//!
//! Properties are stored in the block's property map, not in the content.

use chrono::NaiveDate;
use log::debug;

use crate::backend::{RemoteTask, RemoteTaskList};
use crate::constants::{
    CONTEXT_LINKS, CONTEXT_NOTES, DEADLINE_PREFIX, GOOGLE_TASKS_WEB_URL, KNOWN_MARKERS, MARKER_DONE, PROP_COMPLETED,
    PROP_CONTEXT, PROP_DELETED, PROP_HIDDEN, PROP_LINK, PROP_LIST, PROP_LIST_ID, PROP_TASK_ID, PROP_UPDATED,
    SCHEDULED_PREFIX,
};
use crate::graph::{parse_marker, BlockDraft, LocalBlock, Properties, PropertyValue, UserPreferences};
use crate::utils::datetime::{deadline_to_date, parse_remote_date, GraphDateFormat};

/// Build the block a remote task should be stored as.
pub fn encode(list: &RemoteTaskList, task: &RemoteTask, prefs: &UserPreferences) -> BlockDraft {
    let content = block_content(task, prefs);

    let mut properties = Properties::new();
    properties.insert(PROP_TASK_ID.to_string(), task.id.as_str().into());
    properties.insert(PROP_LIST_ID.to_string(), list.id.as_str().into());
    properties.insert(PROP_LIST.to_string(), page_ref(&list.title).into());
    if let Some(updated) = &task.updated {
        properties.insert(PROP_UPDATED.to_string(), updated.as_str().into());
    }
    properties.insert(PROP_LINK.to_string(), web_link(task).into());
    if task.hidden && !task.is_completed() {
        properties.insert(PROP_HIDDEN.to_string(), "true".into());
    }
    if task.deleted {
        properties.insert(PROP_DELETED.to_string(), "true".into());
    }
    if let Some(date) = task.completed.as_deref().and_then(parse_remote_date) {
        properties.insert(
            PROP_COMPLETED.to_string(),
            page_ref(&prefs.date_format.format(date)).into(),
        );
    }

    let mut children = Vec::new();
    if let Some(notes) = task.notes.as_deref().map(str::trim).filter(|n| !n.is_empty()) {
        children.push(context_block(notes.to_string(), CONTEXT_NOTES));
    }
    if !task.links.is_empty() {
        // Links are plain serde structs; serialization cannot fail
        let rendered = serde_json::to_string_pretty(&task.links).unwrap_or_default();
        children.push(context_block(format!("```json\n{rendered}\n```"), CONTEXT_LINKS));
    }

    BlockDraft {
        content,
        properties,
        children,
    }
}

/// Block content for a task: marker, title and the deadline line.
pub fn block_content(task: &RemoteTask, prefs: &UserPreferences) -> String {
    let mut content = format!("{} {}", status_marker(task, prefs), task.title.trim());

    if let Some(due) = task.due.as_deref() {
        match parse_remote_date(due) {
            Some(date) => {
                content.push('\n');
                content.push_str(&format!("{} <{}>", DEADLINE_PREFIX, prefs.date_format.format(date)));
            }
            None => debug!("Ignoring unreadable due date '{}' on task {}", due, task.id),
        }
    }
    content
}

/// The title a freshly encoded block shows for `task`.
///
/// Title lines that read as properties or annotations do not survive
/// [`derive_title`], so block titles are compared against this rather than
/// the raw remote title.
pub fn encoded_title(task: &RemoteTask, prefs: &UserPreferences) -> String {
    derive_title(&block_content(task, prefs))
}

fn context_block(content: String, context: &str) -> BlockDraft {
    let mut properties = Properties::new();
    properties.insert(PROP_CONTEXT.to_string(), context.into());
    BlockDraft {
        content,
        properties,
        children: Vec::new(),
    }
}

fn status_marker<'a>(task: &RemoteTask, prefs: &'a UserPreferences) -> &'a str {
    if task.is_completed() {
        MARKER_DONE
    } else {
        &prefs.todo_marker
    }
}

fn web_link(task: &RemoteTask) -> String {
    task.web_view_link
        .clone()
        .unwrap_or_else(|| format!("{}/{}", GOOGLE_TASKS_WEB_URL, task.id))
}

/// Wrap a page name as a reference: `[[name]]`.
pub fn page_ref(name: &str) -> String {
    format!("[[{name}]]")
}

/// Strip one level of `[[...]]` around a value, if present.
pub fn strip_page_ref(value: &str) -> &str {
    let trimmed = value.trim();
    trimmed
        .strip_prefix("[[")
        .and_then(|inner| inner.strip_suffix("]]"))
        .unwrap_or(trimmed)
}

fn is_property_line(line: &str) -> bool {
    match line.trim().split_once("::") {
        Some((key, _)) => !key.is_empty() && !key.contains(char::is_whitespace),
        None => false,
    }
}

fn is_annotation_line(line: &str) -> bool {
    let trimmed = line.trim_start();
    trimmed.starts_with(DEADLINE_PREFIX) || trimmed.starts_with(SCHEDULED_PREFIX)
}

/// Task title as written in a block: the content without its marker,
/// deadline/scheduled lines and inline property lines.
pub fn derive_title(content: &str) -> String {
    let kept: Vec<&str> = content
        .lines()
        .filter(|line| !is_annotation_line(line) && !is_property_line(line))
        .collect();
    let text = kept.join("\n");
    let text = text.trim();

    match text.split_once(char::is_whitespace) {
        Some((first, rest)) if KNOWN_MARKERS.contains(&first) => rest.trim().to_string(),
        None if KNOWN_MARKERS.contains(&text) => String::new(),
        _ => text.to_string(),
    }
}

/// Whether the block's marker says the task is done.
pub fn is_done(block: &LocalBlock) -> bool {
    block
        .marker
        .clone()
        .or_else(|| parse_marker(&block.content))
        .is_some_and(|marker| marker == MARKER_DONE)
}

/// Calendar date of the block's deadline, when it is a valid 8-digit date.
pub fn deadline_date(block: &LocalBlock) -> Option<NaiveDate> {
    block.deadline.and_then(deadline_to_date)
}

/// Completion date recorded in the block's `g-completed` property.
pub fn completion_date(block: &LocalBlock, date_format: &GraphDateFormat) -> Option<NaiveDate> {
    let raw = block.property(PROP_COMPLETED)?;
    date_format.parse(strip_page_ref(&raw))
}

/// The `g-context` tag of a generated child block.
pub fn context_of(block: &LocalBlock) -> Option<String> {
    block.properties.get(PROP_CONTEXT).map(PropertyValue::as_text)
}

/// Whether a child block was generated by the sync (notes or links) rather than added by hand.
pub fn is_generated_child(block: &LocalBlock) -> bool {
    matches!(context_of(block).as_deref(), Some(CONTEXT_NOTES) | Some(CONTEXT_LINKS))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derive_title_strips_marker_and_annotations() {
        let content = "LATER Call the bank\nDEADLINE: <2024-03-01 Fri>\nfoo:: bar";
        assert_eq!(derive_title(content), "Call the bank");
    }

    #[test]
    fn test_encoded_title_drops_property_like_lines() {
        let mut task = crate::backend::RemoteTask {
            id: "t1".to_string(),
            title: "Refactor\nstd::fs helpers".to_string(),
            status: crate::backend::TaskStatus::NeedsAction,
            updated: Some("2024-01-05T10:00:00.000Z".to_string()),
            due: None,
            completed: None,
            notes: None,
            links: Vec::new(),
            deleted: false,
            hidden: false,
            web_view_link: None,
        };
        let prefs = UserPreferences::default();
        assert_eq!(encoded_title(&task, &prefs), "Refactor");

        task.title = "Plain".to_string();
        assert_eq!(encoded_title(&task, &prefs), "Plain");
    }

    #[test]
    fn test_derive_title_without_marker() {
        assert_eq!(derive_title("Plain title"), "Plain title");
    }

    #[test]
    fn test_derive_title_keeps_colons_in_text() {
        assert_eq!(derive_title("TODO Meeting: 10:00 with Bob"), "Meeting: 10:00 with Bob");
    }

    #[test]
    fn test_strip_page_ref() {
        assert_eq!(strip_page_ref("[[2024-03-01]]"), "2024-03-01");
        assert_eq!(strip_page_ref("2024-03-01"), "2024-03-01");
    }
}
