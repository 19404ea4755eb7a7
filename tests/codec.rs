mod common;

use common::{list, task};
use gtasks_sync::backend::{TaskLink, TaskStatus};
use gtasks_sync::graph::UserPreferences;
use gtasks_sync::sync::codec::{context_of, encode, page_ref};

#[test]
fn test_open_task_encoding() {
    let prefs = UserPreferences::default();
    let mut milk = task("abc123", "  Buy milk ", "2024-02-28T09:12:44.000Z");
    milk.due = Some("2024-03-01T00:00:00.000Z".to_string());

    let draft = encode(&list("list1", "Groceries"), &milk, &prefs);

    assert_eq!(draft.content, "TODO Buy milk\nDEADLINE: <2024-03-01>");
    let text = |key: &str| draft.properties.get(key).map(|v| v.as_text());
    assert_eq!(text("g-id").as_deref(), Some("abc123"));
    assert_eq!(text("g-list-id").as_deref(), Some("list1"));
    assert_eq!(text("g-list").as_deref(), Some("[[Groceries]]"));
    assert_eq!(text("g-updated").as_deref(), Some("2024-02-28T09:12:44.000Z"));
    assert_eq!(text("g-link").as_deref(), Some("https://tasks.google.com/task/abc123"));
    assert!(text("g-completed").is_none());
    assert!(text("g-hidden").is_none());
    assert!(draft.children.is_empty());
}

#[test]
fn test_completed_task_encoding() {
    let prefs = UserPreferences::default();
    let mut milk = task("t1", "Buy milk", "2024-02-28T09:12:44.000Z");
    milk.status = TaskStatus::Completed;
    milk.completed = Some("2024-02-28T09:12:40.000Z".to_string());
    milk.hidden = true;
    milk.web_view_link = Some("https://tasks.google.com/embed/t1".to_string());

    let draft = encode(&list("l1", "Groceries"), &milk, &prefs);

    assert_eq!(draft.content, "DONE Buy milk");
    let text = |key: &str| draft.properties.get(key).map(|v| v.as_text());
    assert_eq!(text("g-completed").as_deref(), Some("[[2024-02-28]]"));
    assert_eq!(text("g-link").as_deref(), Some("https://tasks.google.com/embed/t1"));
    assert!(text("g-hidden").is_none());
}

#[test]
fn test_hidden_open_task_is_flagged() {
    let prefs = UserPreferences::default();
    let mut milk = task("t1", "Buy milk", "2024-02-28T09:12:44.000Z");
    milk.hidden = true;
    milk.deleted = true;

    let draft = encode(&list("l1", "Groceries"), &milk, &prefs);
    assert_eq!(draft.properties["g-hidden"].as_text(), "true");
    assert_eq!(draft.properties["g-deleted"].as_text(), "true");
}

#[test]
fn test_notes_and_links_become_tagged_children() {
    let prefs = UserPreferences {
        todo_marker: "LATER".to_string(),
        ..UserPreferences::default()
    };
    let mut reply = task("t1", "Reply to Ana", "2024-02-28T09:12:44.000Z");
    reply.notes = Some("\nAbout the offsite\n".to_string());
    reply.links = vec![TaskLink {
        link_type: "email".to_string(),
        description: "Offsite".to_string(),
        link: "https://mail.google.com/mail/#all/123".to_string(),
    }];

    let draft = encode(&list("l1", "Inbox"), &reply, &prefs);

    assert_eq!(draft.content, "LATER Reply to Ana");
    assert_eq!(draft.children.len(), 2);
    assert_eq!(draft.children[0].content, "About the offsite");
    assert_eq!(draft.children[0].properties["g-context"].as_text(), "notes");
    assert!(draft.children[1].content.starts_with("```json\n"));
    assert!(draft.children[1].content.contains("\"type\": \"email\""));
    assert!(draft.children[1].content.ends_with("\n```"));
    assert_eq!(draft.children[1].properties["g-context"].as_text(), "links");
}

#[test]
fn test_generated_children_are_recognized() {
    let prefs = UserPreferences::default();
    let mut milk = task("t1", "Buy milk", "2024-02-28T09:12:44.000Z");
    milk.notes = Some("whole".to_string());
    let draft = encode(&list("l1", "Groceries"), &milk, &prefs);

    let notes = &draft.children[0];
    let block = gtasks_sync::graph::LocalBlock {
        uuid: uuid::Uuid::new_v4(),
        page_uuid: uuid::Uuid::new_v4(),
        parent_uuid: None,
        order_index: 0,
        content: notes.content.clone(),
        properties: notes.properties.clone(),
        deadline: None,
        marker: None,
    };
    assert_eq!(context_of(&block).as_deref(), Some("notes"));
    assert_eq!(page_ref("Groceries"), "[[Groceries]]");
}
