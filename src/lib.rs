//! gtasks-sync - Google Tasks into a Logseq-style block graph
//!
//! This library fetches every task list and task from Google Tasks and
//! mirrors them as blocks on journal pages of a local graph. Edits made to
//! the blocks (title, status, deadline) are pushed back when the remote
//! record has not moved in the meantime.
//!
//! # Modules
//!
//! The library is organized into several key modules:
//!
//! * [`backend`] - Remote task service abstraction and the Google Tasks client
//! * [`graph`] - Page/block model and the [`graph::DocumentStore`] interface
//! * [`storage`] - SQLite implementation of the graph
//! * [`sync`] - Fetch, index, reconcile and write
//! * [`auth`] - OAuth credential storage and refresh
//! * [`config`] - Application configuration management

/// OAuth credentials and token refresh
pub mod auth;

/// Remote task service abstraction
pub mod backend;

/// Command-line interface definition
pub mod cli;

/// Configuration module for managing application settings
pub mod config;

/// Application constants and default values
pub mod constants;

/// SeaORM entity models for database tables
pub mod entities;

/// Error types for sync runs
pub mod error;

/// Local document graph model
pub mod graph;

/// Logging setup
pub mod logger;

/// Repository layer for database operations
pub mod repositories;

/// Local storage layer holding the graph
pub mod storage;

/// Synchronization engine between the remote service and the graph
pub mod sync;

/// Utility functions for date handling
pub mod utils;

pub use error::{SyncError, SyncResult};
