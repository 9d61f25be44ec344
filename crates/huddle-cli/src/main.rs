//! Huddle search CLI
//!
//! Builds and queries the full-text index over discussions, tasks and
//! comments.
//!
//! # Usage
//!
//! ```bash
//! huddle-search rebuild --corpus export.json
//! huddle-search query "urgent fix" --filter project=apollo
//! huddle-search filters
//! huddle-search normalize "alpha proj"
//! ```
//!
//! # Configuration
//!
//! Configuration is loaded in order (later sources override earlier):
//! 1. Built-in defaults
//! 2. Config file (~/.config/huddle/config.toml)
//! 3. Environment variables (HUDDLE_*)
//! 4. CLI flags

use anyhow::{Context, Result};
use clap::Parser;

use huddle_cli::{init_logging, load_settings, run, Cli};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let settings = load_settings(
        cli.config.as_deref(),
        cli.index_path.as_deref(),
        cli.log_level.as_deref(),
    )?;
    init_logging(&settings)?;

    // Index reads and commits block; keep them off the runtime workers
    let output = tokio::task::spawn_blocking(move || run(&settings, cli.command))
        .await
        .context("Command task panicked")??;

    println!("{}", output);
    Ok(())
}
