//! Repository layer for database operations.
//!
//! This module provides repository structs that encapsulate database queries
//! and operations, following the Data Mapper pattern recommended by SeaORM.
//! Repositories keep entities as pure data models while providing reusable
//! database access methods.

pub mod block;
pub mod page;
pub mod property;

pub use block::BlockRepository;
pub use page::PageRepository;
pub use property::PropertyRepository;
