//! Local storage module for the block graph
//!
//! This module provides a SQLite-backed implementation of
//! [`DocumentStore`](crate::graph::DocumentStore) using SeaORM for:
//! - Pages
//! - Blocks
//! - The block property index

pub mod blocks;
pub mod db;

pub use db::LocalStorage;
