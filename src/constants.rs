//! Constants used throughout the application
//!
//! This module centralizes property keys, markers, endpoints and log text
//! so the codec, the reconciler and the storage layer agree on them.

// Block property keys written on every synced block
/// Remote task identifier; the join key between a task and its block
pub const PROP_TASK_ID: &str = "g-id";
/// Identifier of the task list that owns the task
pub const PROP_LIST_ID: &str = "g-list-id";
/// Page reference to the task list's container page
pub const PROP_LIST: &str = "g-list";
/// Remote `updated` timestamp recorded at the last sync
pub const PROP_UPDATED: &str = "g-updated";
/// Web link to the task in the remote UI
pub const PROP_LINK: &str = "g-link";
/// Present (as `true`) when the remote task is hidden and not completed
pub const PROP_HIDDEN: &str = "g-hidden";
/// Present (as `true`) when the remote task is deleted
pub const PROP_DELETED: &str = "g-deleted";
/// Completion date as a page reference
pub const PROP_COMPLETED: &str = "g-completed";
/// Tags a generated child block as notes or links
pub const PROP_CONTEXT: &str = "g-context";

// Context markers for generated child blocks
pub const CONTEXT_NOTES: &str = "notes";
pub const CONTEXT_LINKS: &str = "links";

// Status markers
pub const MARKER_DONE: &str = "DONE";
pub const MARKER_TODO: &str = "TODO";
pub const MARKER_LATER: &str = "LATER";
/// Every leading token the graph recognizes as a task marker
pub const KNOWN_MARKERS: [&str; 10] = [
    "TODO",
    "LATER",
    "NOW",
    "DOING",
    "DONE",
    "WAITING",
    "WAIT",
    "CANCELED",
    "CANCELLED",
    "IN-PROGRESS",
];

// Content annotations
pub const DEADLINE_PREFIX: &str = "DEADLINE:";
pub const SCHEDULED_PREFIX: &str = "SCHEDULED:";

// Remote service
pub const GOOGLE_TASKS_API: &str = "https://tasks.googleapis.com/tasks/v1";
pub const GOOGLE_OAUTH_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
pub const GOOGLE_TASKS_WEB_URL: &str = "https://tasks.google.com/task";
/// Largest page size the Tasks API accepts
pub const GOOGLE_MAX_RESULTS: &str = "100";
pub const STATUS_NEEDS_ACTION: &str = "needsAction";
pub const STATUS_COMPLETED: &str = "completed";

// Log Messages
pub const LOG_SYNC_STARTED: &str = "🔄 Starting Google Tasks sync...";
pub const LOG_SYNC_FINISHED: &str = "✅ Google Tasks sync finished";
pub const LOG_ERROR_FETCH: &str = "❌ Failed to fetch remote tasks";
pub const LOG_DUPLICATE_BLOCKS: &str = "⚠️  Multiple blocks linked to one remote task";

// User-facing messages
pub const CONFIG_GENERATED: &str = "✅ Generated default configuration file";
pub const MSG_REAUTHENTICATE: &str =
    "🔑 Google authorization expired. Sign in again, or run `gtasks-sync refresh` to use the stored refresh token.";
pub const MSG_TOKENS_RECEIVED: &str = "✅ Google auth tokens received";
