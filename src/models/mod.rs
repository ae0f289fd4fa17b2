//! Data models for the UN reports harvester

pub mod entity;
pub mod feed_item;
pub mod report;

// Re-export commonly used types
pub use entity::{Entity, EntityReport};
pub use feed_item::FeedItem;
pub use report::{Report, ReportCollection, ReportRow};
