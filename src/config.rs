//! Pipeline configuration loaded from an optional YAML file.
//!
//! Every field has a default, so an absent file or a partial file is fine.
//! CLI flags are applied on top in `main` (flag > env > YAML > default).
//!
//! ```yaml
//! scraper:
//!   base_url: https://liquipedia.net/mobilelegends
//!   rate_limit_ms: 2000
//! pipeline:
//!   output_dir: scraped-data
//!   batch_size: 5
//! upload:
//!   d1_database: mlbb-tools-db
//!   remote: true
//! ```

use crate::error::{PipelineError, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, instrument};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub scraper: ScraperConfig,
    pub pipeline: PipelineConfig,
    pub upload: UploadConfig,
}

/// Source site and HTTP politeness settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScraperConfig {
    /// Hero pages live at `{base_url}/{hero}`.
    pub base_url: String,
    pub rate_limit_ms: u64,
    pub retry_attempts: u32,
    pub timeout_ms: u64,
    pub user_agent: String,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            base_url: "https://liquipedia.net/mobilelegends".to_string(),
            rate_limit_ms: 2000,
            retry_attempts: 3,
            timeout_ms: 30_000,
            user_agent: concat!(
                "mlbb_ingest/",
                env!("CARGO_PKG_VERSION"),
                " (hero data collection; respects rate limits)"
            )
            .to_string(),
        }
    }
}

impl ScraperConfig {
    pub fn rate_limit(&self) -> Duration {
        Duration::from_millis(self.rate_limit_ms)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Scrape run sizing and where progress is persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub output_dir: PathBuf,
    pub max_heroes: usize,
    pub batch_size: usize,
    pub delay_between_batches_ms: u64,
    /// Settings used by the `continue` command.
    pub resume_max_heroes: usize,
    pub resume_batch_size: usize,
    pub resume_delay_between_batches_ms: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("scraped-data"),
            max_heroes: 50,
            batch_size: 5,
            delay_between_batches_ms: 10_000,
            resume_max_heroes: 200,
            resume_batch_size: 3,
            resume_delay_between_batches_ms: 8000,
        }
    }
}

/// Upload sinks and write throttling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UploadConfig {
    /// D1 database name passed to `wrangler d1 execute`.
    pub d1_database: String,
    /// Target the deployed D1 database instead of the local one.
    pub remote: bool,
    /// When set, write into this SQLite file instead of D1.
    pub sqlite_path: Option<PathBuf>,
    /// Base URL of the HTTP API (`{api_url}/heroes`).
    pub api_url: Option<String>,
    pub batch_size: usize,
    pub delay_between_batches_ms: u64,
    pub statement_delay_ms: u64,
    /// Role written for heroes whose scraped role is `Unknown`.
    pub default_role: String,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            d1_database: "mlbb-tools-db".to_string(),
            remote: false,
            sqlite_path: None,
            api_url: None,
            batch_size: 5,
            delay_between_batches_ms: 3000,
            statement_delay_ms: 100,
            default_role: "Fighter".to_string(),
        }
    }
}

impl AppConfig {
    /// Load from `path`, or defaults when no path is given.
    #[instrument(level = "info")]
    pub fn load(path: Option<&str>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let raw = std::fs::read_to_string(path).map_err(|source| PipelineError::Config {
            path: path.to_string(),
            reason: source.to_string(),
        })?;
        let config = Self::from_yaml(&raw).map_err(|e| PipelineError::Config {
            path: path.to_string(),
            reason: e.to_string(),
        })?;
        info!(path, "Loaded configuration");
        Ok(config)
    }

    pub fn from_yaml(raw: &str) -> std::result::Result<Self, serde_yaml::Error> {
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_politeness_settings() {
        let config = AppConfig::default();
        assert_eq!(config.scraper.rate_limit(), Duration::from_secs(2));
        assert_eq!(config.scraper.retry_attempts, 3);
        assert_eq!(config.scraper.timeout(), Duration::from_secs(30));
        assert_eq!(config.pipeline.batch_size, 5);
        assert_eq!(config.upload.delay_between_batches_ms, 3000);
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let yaml = "scraper:\n  rate_limit_ms: 500\nupload:\n  remote: true\n";
        let config = AppConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.scraper.rate_limit_ms, 500);
        assert_eq!(config.scraper.retry_attempts, 3);
        assert!(config.upload.remote);
        assert_eq!(config.upload.d1_database, "mlbb-tools-db");
        assert_eq!(config.pipeline.output_dir, PathBuf::from("scraped-data"));
    }

    #[test]
    fn test_empty_yaml_is_default() {
        assert_eq!(AppConfig::from_yaml("  \n").unwrap(), AppConfig::default());
    }

    #[test]
    fn test_missing_file_is_config_error() {
        let err = AppConfig::load(Some("/definitely/not/here.yaml")).unwrap_err();
        assert!(matches!(err, PipelineError::Config { .. }));
    }

    #[test]
    fn test_no_path_is_default() {
        assert_eq!(AppConfig::load(None).unwrap(), AppConfig::default());
    }
}
