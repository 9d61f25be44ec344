//! Tantivy index management.
//!
//! Handles index creation, opening, and writer/reader construction.

use std::path::{Path, PathBuf};

use tantivy::{Index, IndexReader, IndexWriter, ReloadPolicy};
use tracing::{debug, info};

use huddle_types::Settings;

use crate::error::SearchError;
use crate::schema::{build_entity_schema, SearchSchema};

/// Default memory budget for IndexWriter (50MB)
const DEFAULT_WRITER_MEMORY_MB: usize = 50;

/// Where the index lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IndexLocation {
    /// MmapDirectory at the given path
    Directory(PathBuf),
    /// RAM-only index, lost on close
    InMemory,
}

/// Search index configuration
#[derive(Debug, Clone)]
pub struct SearchIndexConfig {
    pub location: IndexLocation,
    /// Memory budget for writer in MB
    pub writer_memory_mb: usize,
}

impl Default for SearchIndexConfig {
    fn default() -> Self {
        Self::new("./search-index")
    }
}

impl SearchIndexConfig {
    pub fn new(index_path: impl Into<PathBuf>) -> Self {
        Self {
            location: IndexLocation::Directory(index_path.into()),
            writer_memory_mb: DEFAULT_WRITER_MEMORY_MB,
        }
    }

    pub fn in_memory() -> Self {
        Self {
            location: IndexLocation::InMemory,
            writer_memory_mb: 15,
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(settings.expanded_index_path()).with_memory_mb(settings.writer_memory_mb)
    }

    pub fn with_memory_mb(mut self, mb: usize) -> Self {
        self.writer_memory_mb = mb;
        self
    }

    /// Index directory, if the index is on disk
    pub fn index_path(&self) -> Option<&Path> {
        match &self.location {
            IndexLocation::Directory(path) => Some(path),
            IndexLocation::InMemory => None,
        }
    }
}

/// Wrapper for Tantivy index with schema access.
pub struct SearchIndex {
    index: Index,
    schema: SearchSchema,
    config: SearchIndexConfig,
}

impl SearchIndex {
    /// Open existing index or create new one.
    pub fn open_or_create(config: SearchIndexConfig) -> Result<Self, SearchError> {
        let index = match &config.location {
            IndexLocation::Directory(path) => open_or_create_index(path)?,
            IndexLocation::InMemory => Index::create_in_ram(build_entity_schema().schema().clone()),
        };
        let schema = SearchSchema::from_schema(index.schema())?;

        info!(location = ?config.location, "Opened search index");

        Ok(Self {
            index,
            schema,
            config,
        })
    }

    /// Get the search schema
    pub fn schema(&self) -> &SearchSchema {
        &self.schema
    }

    /// Get the underlying Tantivy index
    pub fn index(&self) -> &Index {
        &self.index
    }

    /// Create an IndexWriter with configured memory budget
    pub fn writer(&self) -> Result<IndexWriter, SearchError> {
        let memory_budget = self.config.writer_memory_mb * 1024 * 1024;
        let writer = self.index.writer(memory_budget)?;
        debug!(
            memory_mb = self.config.writer_memory_mb,
            "Created index writer"
        );
        Ok(writer)
    }

    /// Create an IndexReader that is reloaded explicitly after each commit
    pub fn reader(&self) -> Result<IndexReader, SearchError> {
        let reader = self
            .index
            .reader_builder()
            .reload_policy(ReloadPolicy::Manual)
            .try_into()?;
        debug!("Created index reader");
        Ok(reader)
    }

    pub fn config(&self) -> &SearchIndexConfig {
        &self.config
    }
}

/// Open an existing index or create a new one.
///
/// Uses MmapDirectory for persistence.
pub fn open_or_create_index(path: &Path) -> Result<Index, SearchError> {
    if path.join("meta.json").exists() {
        debug!(path = ?path, "Opening existing index");
        let index = Index::open_in_dir(path)?;
        Ok(index)
    } else {
        info!(path = ?path, "Creating new index");
        std::fs::create_dir_all(path)?;
        let schema = build_entity_schema();
        let index = Index::create_in_dir(path, schema.schema().clone())?;
        Ok(index)
    }
}
