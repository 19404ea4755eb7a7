//! Utility modules for gtasks-sync.
//!
//! - [`datetime`] - Graph date patterns, remote timestamps and compact deadlines

pub mod datetime;
