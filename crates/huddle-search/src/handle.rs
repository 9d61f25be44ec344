//! Explicit handle to the index backend.
//!
//! The handle is created closed, opened with [`IndexHandle::open`] and may
//! be closed again at any time. Every consumer asks for the backend through
//! [`IndexHandle::acquire`], which returns a [`Backend`] value: the write path
//! discards `Unavailable`, the read path turns it into
//! [`SearchError::IndexUnavailable`].

use std::sync::{Arc, Mutex, RwLock};

use tantivy::{IndexReader, IndexWriter, Searcher};
use tracing::{debug, info, warn};

use crate::error::SearchError;
use crate::index::{SearchIndex, SearchIndexConfig};
use crate::schema::SearchSchema;

/// Availability of the index backend.
#[derive(Debug)]
pub enum Backend<T> {
    Available(T),
    /// Closed, never opened, or failed to open
    Unavailable(String),
}

impl<T> Backend<T> {
    /// Convert to a read-path result.
    pub fn into_result(self) -> Result<T, SearchError> {
        match self {
            Backend::Available(value) => Ok(value),
            Backend::Unavailable(reason) => Err(SearchError::IndexUnavailable(reason)),
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, Backend::Available(_))
    }
}

/// An opened index with its single writer and a shared reader.
pub struct OpenIndex {
    index: SearchIndex,
    writer: Mutex<IndexWriter>,
    reader: IndexReader,
}

impl OpenIndex {
    fn open(config: SearchIndexConfig) -> Result<Self, SearchError> {
        let index = SearchIndex::open_or_create(config)?;
        let writer = index.writer()?;
        let reader = index.reader()?;
        Ok(Self {
            index,
            writer: Mutex::new(writer),
            reader,
        })
    }

    pub fn schema(&self) -> &SearchSchema {
        self.index.schema()
    }

    /// Snapshot searcher over the last reloaded commit.
    pub fn searcher(&self) -> Searcher {
        self.reader.searcher()
    }

    /// Apply a write operation, commit it and reload the reader.
    ///
    /// On failure the uncommitted operations are rolled back.
    pub fn write<F>(&self, op: F) -> Result<u64, SearchError>
    where
        F: FnOnce(&IndexWriter, &SearchSchema) -> Result<(), SearchError>,
    {
        let mut writer = self
            .writer
            .lock()
            .map_err(|e| SearchError::IndexLocked(e.to_string()))?;

        if let Err(e) = op(&writer, self.index.schema()) {
            if let Err(rollback_err) = writer.rollback() {
                warn!(error = %rollback_err, "Rollback after failed write also failed");
            }
            return Err(e);
        }

        let opstamp = writer.commit()?;
        drop(writer);

        self.reader.reload()?;
        debug!(opstamp, "Committed index changes");
        Ok(opstamp)
    }

    /// Number of live documents in the current reader snapshot.
    pub fn num_docs(&self) -> u64 {
        self.reader.searcher().num_docs()
    }
}

/// Shared handle to the search backend with an explicit open/close lifecycle.
pub struct IndexHandle {
    config: SearchIndexConfig,
    state: RwLock<Option<Arc<OpenIndex>>>,
}

impl IndexHandle {
    /// Create a closed handle.
    pub fn new(config: SearchIndexConfig) -> Self {
        Self {
            config,
            state: RwLock::new(None),
        }
    }

    /// Create a handle and open it immediately.
    pub fn open_with(config: SearchIndexConfig) -> Result<Self, SearchError> {
        let handle = Self::new(config);
        handle.open()?;
        Ok(handle)
    }

    /// Open an in-memory handle (tests, ephemeral use).
    pub fn in_memory() -> Result<Self, SearchError> {
        Self::open_with(SearchIndexConfig::in_memory())
    }

    /// Open the backend. Opening an already open handle is a no-op.
    pub fn open(&self) -> Result<(), SearchError> {
        let mut state = self
            .state
            .write()
            .map_err(|e| SearchError::IndexLocked(e.to_string()))?;
        if state.is_some() {
            return Ok(());
        }
        let opened = OpenIndex::open(self.config.clone())?;
        *state = Some(Arc::new(opened));
        info!(location = ?self.config.location, "Search backend opened");
        Ok(())
    }

    /// Close the backend. In-flight operations finish on their own snapshot.
    pub fn close(&self) {
        match self.state.write() {
            Ok(mut state) => {
                if state.take().is_some() {
                    info!(location = ?self.config.location, "Search backend closed");
                }
            }
            Err(e) => warn!(error = %e, "Search backend state poisoned on close"),
        }
    }

    pub fn is_open(&self) -> bool {
        self.state.read().map(|s| s.is_some()).unwrap_or(false)
    }

    /// Get the opened backend, or the reason it is unavailable.
    pub fn acquire(&self) -> Backend<Arc<OpenIndex>> {
        match self.state.read() {
            Ok(state) => match state.as_ref() {
                Some(open) => Backend::Available(Arc::clone(open)),
                None => Backend::Unavailable("search index is not open".to_string()),
            },
            Err(e) => Backend::Unavailable(format!("search index state poisoned: {}", e)),
        }
    }

    pub fn config(&self) -> &SearchIndexConfig {
        &self.config
    }
}
