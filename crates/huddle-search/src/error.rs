//! Search error types.

use thiserror::Error;

/// Errors that can occur during search operations.
#[derive(Debug, Error)]
pub enum SearchError {
    /// The index backend is closed or could not be opened.
    ///
    /// Distinct from an empty result so callers can fall back to a plain listing.
    #[error("Search index unavailable: {0}")]
    IndexUnavailable(String),

    /// Query is empty after normalization, or a filter is malformed
    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    /// Excerpt could not be highlighted; always recovered with plain content
    #[error("Highlight unsupported: {0}")]
    HighlightUnsupported(String),

    /// Tantivy index error
    #[error("Tantivy error: {0}")]
    Tantivy(#[from] tantivy::TantivyError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Schema mismatch
    #[error("Schema mismatch: {0}")]
    SchemaMismatch(String),

    /// Writer or handle lock is poisoned
    #[error("Index is locked: {0}")]
    IndexLocked(String),
}

impl SearchError {
    /// Whether the error means the backend cannot be reached at all.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, SearchError::IndexUnavailable(_))
    }
}
