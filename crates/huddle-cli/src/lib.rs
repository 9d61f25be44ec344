//! Huddle search command-line library exports.
//!
//! # Modules
//!
//! - `cli`: Command-line argument parsing with clap
//! - `commands`: Command implementations (rebuild, query, filters, normalize)

pub mod cli;
pub mod commands;

pub use cli::{parse_filter, Cli, Commands};
pub use commands::{
    init_logging, load_settings, open_service, print_json, run, run_filters, run_normalize,
    run_query, run_rebuild, with_corpus_lookup,
};
