pub mod block;
pub mod block_property;
pub mod page;

pub use block::Entity as Block;
pub use block_property::Entity as BlockProperty;
pub use page::Entity as Page;
