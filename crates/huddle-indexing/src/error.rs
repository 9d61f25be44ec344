//! Error types for rebuilding and entity sources.

use huddle_types::HuddleError;
use thiserror::Error;

/// Errors that can occur while rebuilding the index
#[derive(Error, Debug)]
pub enum IndexingError {
    /// Reading entities from the primary store failed
    #[error("Source error: {0}")]
    Source(String),

    /// The index backend is closed or rejected a write
    #[error("Search index unavailable: {0}")]
    Unavailable(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON encoding/decoding errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error(transparent)]
    Invalid(#[from] HuddleError),
}

impl From<serde_json::Error> for IndexingError {
    fn from(err: serde_json::Error) -> Self {
        IndexingError::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = IndexingError::Source("store offline".to_string());
        assert_eq!(err.to_string(), "Source error: store offline");

        let err = IndexingError::Unavailable("index closed".to_string());
        assert_eq!(err.to_string(), "Search index unavailable: index closed");
    }

    #[test]
    fn test_from_serde_error() {
        let json_err = serde_json::from_str::<i32>("not a number").unwrap_err();
        let indexing_err: IndexingError = json_err.into();
        assert!(matches!(indexing_err, IndexingError::Serialization(_)));
    }
}
