//! Search service: the caller-facing entry point.
//!
//! Ties the normalizer, engine and aggregator together over one explicit
//! index handle. The same handle feeds the [`SearchIndexer`] used by the
//! document lifecycle hook.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::{info, warn};

use huddle_types::Settings;

use crate::aggregate::{aggregate, ParentLookup, SearchResult};
use crate::error::SearchError;
use crate::handle::IndexHandle;
use crate::index::SearchIndexConfig;
use crate::indexer::SearchIndexer;
use crate::normalize::{normalize, normalize_to_string};
use crate::render::SearchFilters;
use crate::searcher::QueryEngine;

pub struct SearchService {
    handle: Arc<IndexHandle>,
    engine: QueryEngine,
    indexer: SearchIndexer,
    lookup: Option<Arc<dyn ParentLookup>>,
}

impl SearchService {
    pub fn new(handle: Arc<IndexHandle>, page_size: usize) -> Self {
        Self {
            engine: QueryEngine::with_page_size(handle.clone(), page_size),
            indexer: SearchIndexer::new(handle.clone()),
            handle,
            lookup: None,
        }
    }

    /// Build from settings and try to open the index.
    ///
    /// A backend that fails to open leaves the service in degraded mode:
    /// writes are dropped and searches report `IndexUnavailable` until
    /// [`IndexHandle::open`] succeeds.
    pub fn from_settings(settings: &Settings) -> Self {
        let handle = Arc::new(IndexHandle::new(SearchIndexConfig::from_settings(settings)));
        if let Err(e) = handle.open() {
            warn!(error = %e, "Search index unavailable, continuing without search");
        }
        Self::new(handle, settings.page_size)
    }

    /// Resolve parents of matching comments against the primary store.
    pub fn with_parent_lookup(mut self, lookup: Arc<dyn ParentLookup>) -> Self {
        self.lookup = Some(lookup);
        self
    }

    pub fn handle(&self) -> &Arc<IndexHandle> {
        &self.handle
    }

    pub fn indexer(&self) -> &SearchIndexer {
        &self.indexer
    }

    pub fn engine(&self) -> &QueryEngine {
        &self.engine
    }

    /// Search discussions and tasks, surfacing comment matches via their parent.
    pub fn search(
        &self,
        query: &str,
        filters: Option<&SearchFilters>,
        start: usize,
    ) -> Result<SearchResult, SearchError> {
        let normalized = normalize(query);
        let empty = SearchFilters::new();
        let raw = self
            .engine
            .search(&normalized, filters.unwrap_or(&empty), start)?;

        let result = aggregate(raw, self.lookup.as_deref());
        info!(
            query,
            entries = result.len(),
            total = result.total,
            "Search results aggregated"
        );
        Ok(result)
    }

    /// Available filter fields and their known values.
    pub fn get_filter_options(&self) -> Result<BTreeMap<String, Vec<String>>, SearchError> {
        self.engine.filter_options()
    }

    /// Canonical rendering of a normalized query.
    pub fn normalize(&self, raw: &str) -> String {
        normalize_to_string(raw)
    }
}
