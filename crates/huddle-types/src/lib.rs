//! # huddle-types
//!
//! Shared domain types for Huddle search.
//!
//! - Entities: discussions, tasks and comments as seen from the primary store
//! - Index entries: the searchable projection of an entity
//! - Settings: layered configuration for the search subsystem

pub mod config;
pub mod entity;
pub mod entry;
pub mod error;

pub use config::Settings;
pub use entity::{Comment, Discussion, Entity, EntityType, Task};
pub use entry::{entry_key, IndexEntry};
pub use error::HuddleError;
