//! Query engine: executes normalized queries against the index.
//!
//! Hits are ordered by descending `modified_at` and paginated with a fixed
//! page size. Each hit carries a highlighted excerpt of its content when
//! one can be produced, otherwise the plain content.
//!
//! The total is counted before any page is collected: an offset at or past
//! the total yields an empty page, and the collector never sees a window
//! larger than the remaining hits.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use tantivy::collector::{Count, DocSetCollector, TopDocs};
use tantivy::query::AllQuery;
use tantivy::{Order, TantivyDocument};
use tracing::{debug, info, warn};

use huddle_types::EntityType;

use crate::document::{stored_entity_type, stored_modified_at, stored_text};
use crate::error::SearchError;
use crate::handle::IndexHandle;
use crate::highlight::Highlighter;
use crate::normalize::NormalizedQuery;
use crate::render::{build_query, SearchFilters};
use crate::schema::{SearchSchema, MODIFIED_AT_FIELD};

/// Default number of hits per page.
pub const DEFAULT_PAGE_SIZE: usize = 20;

/// One matching index entry.
#[derive(Debug, Clone, PartialEq)]
pub struct RawHit {
    pub entity_type: EntityType,
    pub entity_id: String,
    pub title: Option<String>,
    /// Plain stored content
    pub content: String,
    /// Highlighted content, or the plain content when highlighting failed
    pub excerpt: String,
    pub highlighted: bool,
    pub project: Option<String>,
    pub team: Option<String>,
    pub reference_type: Option<EntityType>,
    pub reference_id: Option<String>,
    pub modified_at: DateTime<Utc>,
}

/// A page of hits with the total match count.
#[derive(Debug, Clone, Default)]
pub struct RawHitSet {
    pub hits: Vec<RawHit>,
    /// Matches across all pages
    pub total: usize,
    pub duration: Duration,
}

/// Executes searches against the shared index handle.
pub struct QueryEngine {
    handle: Arc<IndexHandle>,
    page_size: usize,
}

impl QueryEngine {
    pub fn new(handle: Arc<IndexHandle>) -> Self {
        Self::with_page_size(handle, DEFAULT_PAGE_SIZE)
    }

    /// A zero page size is raised to one.
    pub fn with_page_size(handle: Arc<IndexHandle>, page_size: usize) -> Self {
        Self {
            handle,
            page_size: page_size.max(1),
        }
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Run a query. `start` is the offset of the first hit returned.
    ///
    /// Empty queries and malformed filters are rejected before the backend
    /// is touched; a closed backend yields [`SearchError::IndexUnavailable`].
    pub fn search(
        &self,
        query: &NormalizedQuery,
        filters: &SearchFilters,
        start: usize,
    ) -> Result<RawHitSet, SearchError> {
        if query.is_empty() {
            return Err(SearchError::InvalidQuery("query is empty".to_string()));
        }
        let clauses = filters.clauses()?;

        let open = self.handle.acquire().into_result()?;
        let started = Instant::now();

        let schema = open.schema();
        let searcher = open.searcher();
        let final_query = build_query(schema, query, &clauses)?;

        let total = searcher.search(&final_query, &Count)?;
        if start >= total {
            debug!(query = %query, start, total, "Offset past last hit");
            return Ok(RawHitSet {
                hits: Vec::new(),
                total,
                duration: started.elapsed(),
            });
        }

        let limit = self.page_size.min(total - start);
        let top = TopDocs::with_limit(limit)
            .and_offset(start)
            .order_by_fast_field::<i64>(MODIFIED_AT_FIELD, Order::Desc);
        let top_docs = searcher.search(&final_query, &top)?;

        let highlighter = Highlighter::new(&searcher, schema.content, query.terms())?;
        let mut hits = Vec::with_capacity(top_docs.len());
        for (_modified, doc_address) in top_docs {
            let doc: TantivyDocument = searcher.doc(doc_address)?;
            match doc_to_hit(schema, &doc, &highlighter) {
                Some(hit) => hits.push(hit),
                None => warn!(?doc_address, "Skipping index document without entity type or id"),
            }
        }

        let duration = started.elapsed();
        info!(
            query = %query,
            start,
            hits = hits.len(),
            total,
            duration_ms = duration.as_millis() as u64,
            "Search complete"
        );

        Ok(RawHitSet {
            hits,
            total,
            duration,
        })
    }

    /// Known values per filter field, from live documents.
    ///
    /// Comments contribute their parent's type to `entity_type`, since only
    /// parents surface in results.
    pub fn filter_options(&self) -> Result<BTreeMap<String, Vec<String>>, SearchError> {
        let open = self.handle.acquire().into_result()?;
        let schema = open.schema();
        let searcher = open.searcher();

        let addresses = searcher.search(&AllQuery, &DocSetCollector)?;

        let mut entity_types = BTreeSet::new();
        let mut projects = BTreeSet::new();
        let mut teams = BTreeSet::new();
        for address in addresses {
            let doc: TantivyDocument = searcher.doc(address)?;
            let surfaced_type = match stored_entity_type(&doc, schema.entity_type) {
                Some(EntityType::Comment) => stored_entity_type(&doc, schema.reference_type),
                other => other,
            };
            if let Some(t) = surfaced_type {
                entity_types.insert(t.as_str().to_string());
            }
            if let Some(project) = stored_text(&doc, schema.project) {
                projects.insert(project);
            }
            if let Some(team) = stored_text(&doc, schema.team) {
                teams.insert(team);
            }
        }

        debug!(
            entity_types = entity_types.len(),
            projects = projects.len(),
            teams = teams.len(),
            "Collected filter options"
        );

        let mut options = BTreeMap::new();
        options.insert("entity_type".to_string(), entity_types.into_iter().collect());
        options.insert("project".to_string(), projects.into_iter().collect());
        options.insert("team".to_string(), teams.into_iter().collect());
        Ok(options)
    }

    /// Number of indexed entries, comments included.
    pub fn num_docs(&self) -> Result<u64, SearchError> {
        let open = self.handle.acquire().into_result()?;
        Ok(open.num_docs())
    }
}

fn doc_to_hit(schema: &SearchSchema, doc: &TantivyDocument, highlighter: &Highlighter) -> Option<RawHit> {
    let entity_type = stored_entity_type(doc, schema.entity_type)?;
    let entity_id = stored_text(doc, schema.entity_id)?;
    let content = stored_text(doc, schema.content).unwrap_or_default();
    let (excerpt, highlighted) = highlighter.highlight_or_plain(&content);

    Some(RawHit {
        entity_type,
        entity_id,
        title: stored_text(doc, schema.title),
        content,
        excerpt,
        highlighted,
        project: stored_text(doc, schema.project),
        team: stored_text(doc, schema.team),
        reference_type: stored_entity_type(doc, schema.reference_type),
        reference_id: stored_text(doc, schema.reference_id),
        modified_at: stored_modified_at(doc, schema),
    })
}
