//! # huddle-search
//!
//! Full-text search over discussions, tasks and comments using Tantivy.
//!
//! The index is a derived projection of the primary document store: it can
//! be dropped and rebuilt at any time. Writes never fail the caller; reads
//! report an unavailable backend explicitly.
//!
//! ## Pipeline
//! - [`normalize()`]: raw text to a structured AND-of-terms query
//! - [`QueryEngine`]: filtered, recency-ordered, paginated, highlighted hits
//! - [`aggregate()`]: per-type grouping with comment matches attributed to
//!   their parent entity
//! - [`SearchService`]: the three steps behind one call

pub mod aggregate;
pub mod document;
pub mod error;
pub mod handle;
pub mod highlight;
pub mod index;
pub mod indexer;
pub mod normalize;
pub mod render;
pub mod schema;
pub mod searcher;
pub mod service;

pub use aggregate::{aggregate, MatchedVia, ParentLookup, ParentSummary, ResultEntry, SearchResult};
pub use document::entry_to_doc;
pub use error::SearchError;
pub use handle::{Backend, IndexHandle, OpenIndex};
pub use highlight::{expand_terms, strip_highlight, Highlighter, HIGHLIGHT_POST, HIGHLIGHT_PRE};
pub use index::{open_or_create_index, IndexLocation, SearchIndex, SearchIndexConfig};
pub use indexer::{IndexOutcome, SearchIndexer};
pub use normalize::{normalize, normalize_to_string, MatchMode, NormalizedQuery, QueryTerm};
pub use render::{FilterClause, SearchFilters, FILTER_FIELDS};
pub use schema::{build_entity_schema, SearchSchema};
pub use searcher::{QueryEngine, RawHit, RawHitSet, DEFAULT_PAGE_SIZE};
pub use service::SearchService;
