//! Configuration loading for huddle search.
//!
//! Layered config: defaults -> config file -> env vars -> CLI flags.
//! The default config file lives at ~/.config/huddle/config.toml.

use config::{Config, Environment, File};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::HuddleError;

/// Search subsystem settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Path to the full-text index directory
    #[serde(default = "default_search_index_path")]
    pub search_index_path: String,

    /// Memory budget for the index writer, in MB
    #[serde(default = "default_writer_memory_mb")]
    pub writer_memory_mb: usize,

    /// Number of hits per result page
    #[serde(default = "default_page_size")]
    pub page_size: usize,

    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_search_index_path() -> String {
    ProjectDirs::from("", "", "huddle")
        .map(|p| p.data_local_dir().join("search-index"))
        .unwrap_or_else(|| PathBuf::from("./search-index"))
        .to_string_lossy()
        .to_string()
}

fn default_writer_memory_mb() -> usize {
    50
}

fn default_page_size() -> usize {
    20
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            search_index_path: default_search_index_path(),
            writer_memory_mb: default_writer_memory_mb(),
            page_size: default_page_size(),
            log_level: default_log_level(),
        }
    }
}

impl Settings {
    /// Load settings with layered precedence:
    /// 1. Built-in defaults
    /// 2. Config file (~/.config/huddle/config.toml)
    /// 3. CLI-specified config file (optional)
    /// 4. Environment variables (HUDDLE_*)
    ///
    /// CLI flags should be applied by the caller after this returns.
    pub fn load(cli_config_path: Option<&str>) -> Result<Self, HuddleError> {
        let config_dir = ProjectDirs::from("", "", "huddle")
            .map(|p| p.config_dir().to_path_buf())
            .unwrap_or_else(|| PathBuf::from("."));

        let default_config_path = config_dir.join("config");

        let mut builder = Config::builder()
            .set_default("search_index_path", default_search_index_path())
            .map_err(|e| HuddleError::Config(e.to_string()))?
            .set_default("writer_memory_mb", default_writer_memory_mb() as i64)
            .map_err(|e| HuddleError::Config(e.to_string()))?
            .set_default("page_size", default_page_size() as i64)
            .map_err(|e| HuddleError::Config(e.to_string()))?
            .set_default("log_level", default_log_level())
            .map_err(|e| HuddleError::Config(e.to_string()))?
            .add_source(File::with_name(&default_config_path.to_string_lossy()).required(false));

        if let Some(path) = cli_config_path {
            builder = builder.add_source(File::with_name(path).required(true));
        }

        // HUDDLE_PAGE_SIZE, HUDDLE_LOG_LEVEL, ... (prefix separator only, so
        // multi-word keys keep their underscores)
        builder = builder.add_source(
            Environment::with_prefix("HUDDLE")
                .prefix_separator("_")
                .try_parsing(true),
        );

        let settings: Settings = builder
            .build()
            .map_err(|e| HuddleError::Config(e.to_string()))?
            .try_deserialize()
            .map_err(|e| HuddleError::Config(e.to_string()))?;

        settings.validate()?;
        Ok(settings)
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), HuddleError> {
        if self.page_size == 0 {
            return Err(HuddleError::Config("page_size must be > 0".to_string()));
        }
        if self.writer_memory_mb < 15 {
            return Err(HuddleError::Config(format!(
                "writer_memory_mb must be >= 15, got {}",
                self.writer_memory_mb
            )));
        }
        Ok(())
    }

    /// Expand ~ in the index path to the home directory
    pub fn expanded_index_path(&self) -> PathBuf {
        if let Some(rest) = self.search_index_path.strip_prefix("~/") {
            if let Some(home) = directories::BaseDirs::new().map(|b| b.home_dir().to_path_buf()) {
                return home.join(rest);
            }
        }
        PathBuf::from(&self.search_index_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.page_size, 20);
        assert_eq!(settings.writer_memory_mb, 50);
        assert_eq!(settings.log_level, "info");
    }

    #[test]
    fn test_load_with_defaults() {
        let settings = Settings::load(None).unwrap();
        assert!(settings.page_size > 0);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("huddle.toml");
        std::fs::write(&path, "page_size = 5\nsearch_index_path = \"/tmp/huddle-idx\"\n").unwrap();

        let settings = Settings::load(Some(path.to_str().unwrap())).unwrap();
        assert_eq!(settings.page_size, 5);
        assert_eq!(settings.search_index_path, "/tmp/huddle-idx");
    }

    #[test]
    fn test_validation() {
        let mut settings = Settings::default();
        assert!(settings.validate().is_ok());

        settings.page_size = 0;
        assert!(settings.validate().is_err());

        settings.page_size = 20;
        settings.writer_memory_mb = 1;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_expanded_index_path_plain() {
        let settings = Settings {
            search_index_path: "/var/lib/huddle".to_string(),
            ..Default::default()
        };
        assert_eq!(settings.expanded_index_path(), PathBuf::from("/var/lib/huddle"));
    }
}
