//! CLI argument parsing for huddle search.
//!
//! CLI flags override all other config sources.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Huddle search
///
/// Full-text search over discussions, tasks and comments.
#[derive(Parser, Debug)]
#[command(name = "huddle-search")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to config file (overrides default ~/.config/huddle/config.toml)
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Set log level (trace, debug, info, warn, error)
    #[arg(short, long, global = true)]
    pub log_level: Option<String>,

    /// Override search index directory
    #[arg(long, global = true)]
    pub index_path: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Rebuild the index from a JSON export of the primary store
    Rebuild {
        /// JSON array of discussions, tasks and comments
        #[arg(long)]
        corpus: PathBuf,

        /// Entries written per commit
        #[arg(long, default_value = "100")]
        batch_size: usize,

        /// Keep existing entries instead of clearing the index first
        #[arg(long)]
        keep_existing: bool,
    },

    /// Search the index
    Query {
        /// Free-text query
        text: String,

        /// Filter as field=value (entity_type, project, team); repeatable
        #[arg(short, long = "filter", value_parser = parse_filter)]
        filters: Vec<(String, String)>,

        /// Offset of the first hit
        #[arg(short, long, default_value = "0")]
        start: usize,

        /// JSON export used to resolve parents of matching comments
        #[arg(long)]
        corpus: Option<PathBuf>,
    },

    /// List filter fields and their known values
    Filters,

    /// Show the normalized form of a query
    Normalize {
        text: String,
    },
}

/// Parse a `field=value` filter argument.
pub fn parse_filter(s: &str) -> Result<(String, String), String> {
    let (field, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected field=value, got '{}'", s))?;
    let field = field.trim();
    let value = value.trim();
    if field.is_empty() || value.is_empty() {
        return Err(format!("expected field=value, got '{}'", s));
    }
    Ok((field.to_string(), value.to_string()))
}
