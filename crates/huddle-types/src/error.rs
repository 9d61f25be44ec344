//! Error types shared across the huddle crates.

use thiserror::Error;

/// Unified error type for entity and configuration handling.
#[derive(Debug, Error)]
pub enum HuddleError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Entity fails validation or a value cannot be parsed
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}
