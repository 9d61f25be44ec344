//! Keeps the search index in step with the primary document store.
//!
//! ## Key Components
//!
//! - [`DocumentLifecycleHook`]: create/update/delete notifications from the
//!   primary store, turned into index upserts and deletes
//! - [`EntitySource`]: read access to every indexable entity of a type
//! - [`Corpus`]: an in-memory or JSON-file backed [`EntitySource`]
//! - [`rebuild_index`]: drop and re-populate the index from a source
//! - [`IndexingError`]: failures while reading a source or rebuilding
//!
//! The hook never fails the primary-store write that triggered it; see
//! [`huddle_search::IndexOutcome`].

pub mod error;
pub mod hook;
pub mod rebuild;
pub mod source;

pub use error::IndexingError;
pub use hook::DocumentLifecycleHook;
pub use rebuild::{
    rebuild_index, LoggingProgressCallback, NoOpProgressCallback, ProgressCallback,
    RebuildConfig, RebuildProgress, RebuildResult,
};
pub use source::{Corpus, EntitySource};
