//! Command implementations for the huddle search CLI.
//!
//! Handles:
//! - rebuild: Load a JSON corpus and re-populate the index
//! - query: Run a search and print grouped results
//! - filters: Print filter fields and their values
//! - normalize: Print the normalized form of a query

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::info;

use huddle_indexing::{rebuild_index, Corpus, LoggingProgressCallback, RebuildConfig, RebuildResult};
use huddle_search::{IndexHandle, SearchFilters, SearchIndexConfig, SearchResult, SearchService};
use huddle_types::Settings;

use crate::cli::Commands;

/// Load configuration and apply CLI overrides (highest precedence).
pub fn load_settings(
    config_path: Option<&str>,
    index_path_override: Option<&str>,
    log_level_override: Option<&str>,
) -> Result<Settings> {
    let mut settings = Settings::load(config_path).context("Failed to load configuration")?;

    if let Some(index_path) = index_path_override {
        settings.search_index_path = index_path.to_string();
    }
    if let Some(log_level) = log_level_override {
        settings.log_level = log_level.to_string();
    }

    Ok(settings)
}

/// Install the global tracing subscriber. `RUST_LOG` wins over settings.
///
/// Logs go to stderr so stdout carries only command output.
pub fn init_logging(settings: &Settings) -> Result<()> {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&settings.log_level)),
        )
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")?;
    Ok(())
}

/// Open the configured index.
///
/// Unlike a long-running host, the CLI has nothing useful to do without
/// an index, so a failed open is an error here.
pub fn open_service(settings: &Settings) -> Result<SearchService> {
    let config = SearchIndexConfig::from_settings(settings);
    info!("Opening search index at {:?}", settings.expanded_index_path());
    let handle = IndexHandle::open_with(config).context("Failed to open search index")?;
    Ok(SearchService::new(Arc::new(handle), settings.page_size))
}

/// Execute a command and render its output as JSON.
pub fn run(settings: &Settings, command: Commands) -> Result<String> {
    match command {
        Commands::Normalize { text } => print_json(&run_normalize(&text)),
        Commands::Rebuild {
            corpus,
            batch_size,
            keep_existing,
        } => {
            let service = open_service(settings)?;
            let config = RebuildConfig::default()
                .with_batch_size(batch_size)
                .with_clear_first(!keep_existing);
            print_json(&run_rebuild(&service, &corpus, &config)?)
        }
        Commands::Query {
            text,
            filters,
            start,
            corpus,
        } => {
            let mut service = open_service(settings)?;
            if let Some(path) = corpus {
                service = with_corpus_lookup(service, &path)?;
            }
            print_json(&run_query(&service, &text, filters, start)?)
        }
        Commands::Filters => {
            let service = open_service(settings)?;
            print_json(&run_filters(&service)?)
        }
    }
}

/// Resolve parents of comment matches against a JSON corpus.
pub fn with_corpus_lookup(service: SearchService, corpus_path: &Path) -> Result<SearchService> {
    let corpus = Corpus::from_json_file(corpus_path)
        .with_context(|| format!("Failed to load corpus from {:?}", corpus_path))?;
    info!(entities = corpus.len(), "Resolving comment parents from corpus");
    Ok(service.with_parent_lookup(Arc::new(corpus)))
}

pub fn run_rebuild(
    service: &SearchService,
    corpus_path: &Path,
    config: &RebuildConfig,
) -> Result<RebuildResult> {
    let corpus = Corpus::from_json_file(corpus_path)
        .with_context(|| format!("Failed to load corpus from {:?}", corpus_path))?;
    info!(entities = corpus.len(), "Loaded corpus");

    rebuild_index(&corpus, service.indexer(), config, &LoggingProgressCallback)
        .context("Rebuild failed")
}

pub fn run_query(
    service: &SearchService,
    text: &str,
    filters: Vec<(String, String)>,
    start: usize,
) -> Result<SearchResult> {
    let filters: SearchFilters = filters.into_iter().collect();
    let filters = (!filters.is_empty()).then_some(&filters);
    service
        .search(text, filters, start)
        .with_context(|| format!("Search for {:?} failed", text))
}

pub fn run_filters(service: &SearchService) -> Result<BTreeMap<String, Vec<String>>> {
    service
        .get_filter_options()
        .context("Failed to collect filter options")
}

#[derive(Debug, Serialize)]
pub struct NormalizeOutput {
    pub raw: String,
    pub normalized: String,
}

pub fn run_normalize(text: &str) -> NormalizeOutput {
    NormalizeOutput {
        raw: text.to_string(),
        normalized: huddle_search::normalize_to_string(text),
    }
}

pub fn print_json<T: Serialize>(value: &T) -> Result<String> {
    serde_json::to_string_pretty(value).context("Failed to encode output")
}
