//! Configuration infrastructure
//!
//! All knobs live in one JSON file next to the binary's working
//! directory. A missing file is not an error: defaults are written out on
//! first run so the target URL and selector chains can be adjusted
//! without touching code.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

use super::parsing::SelectorConfig;

pub const DEFAULT_CONFIG_FILE: &str = "pricewatch.json";

/// Complete application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Target catalog and extraction selectors
    pub scrape: ScrapeConfig,

    /// HTTP fetch behavior
    pub fetch: FetchConfig,

    /// History store location
    pub store: StoreConfig,

    /// Trend report output
    pub report: ReportConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// What to scrape and how to read it
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScrapeConfig {
    /// Catalog page URL. Left empty by default; the run refuses to start
    /// until it is filled in.
    pub target_url: String,

    /// Currency markers stripped during price normalization.
    pub currency_markers: Vec<String>,

    /// Selector fallback chains for the catalog layout.
    pub selectors: SelectorConfig,
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        Self {
            target_url: String::new(),
            currency_markers: vec![
                "лв.".to_string(),
                "BGN".to_string(),
                "$".to_string(),
                "€".to_string(),
            ],
            selectors: SelectorConfig::default(),
        }
    }
}

/// HTTP client behavior for the fetch collaborator
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Request timeout in seconds
    pub timeout_seconds: u64,

    /// Maximum retry attempts per request
    pub max_retries: u32,

    /// User agent string
    pub user_agent: String,

    /// Upper bound on content-stabilization polls. The catalog keeps
    /// growing while lazy content loads; polling stops early once two
    /// consecutive snapshots have equal length.
    pub stabilization_max_polls: u32,

    /// Delay between stabilization polls in milliseconds
    pub stabilization_delay_ms: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: 30,
            max_retries: 3,
            user_agent: "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36".to_string(),
            stabilization_max_polls: 8,
            stabilization_delay_ms: 2000,
        }
    }
}

/// History store location
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Backing CSV file for the accumulated price history
    pub history_path: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            history_path: PathBuf::from("price_history.csv"),
        }
    }
}

/// Trend report output
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Whether to render the trend chart after a successful run
    pub enabled: bool,

    /// Output path of the SVG chart artifact
    pub output_path: PathBuf,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            output_path: PathBuf::from("price_trends.svg"),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level filter ("trace".."error")
    pub level: String,

    /// Mirror logs to stdout
    pub console_output: bool,

    /// Write logs to the rotating file
    pub file_output: bool,

    /// Directory for log files
    pub directory: PathBuf,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            console_output: true,
            file_output: true,
            directory: PathBuf::from("logs"),
        }
    }
}

/// Loads and persists the application configuration file.
pub struct ConfigManager {
    config_path: PathBuf,
}

impl ConfigManager {
    pub fn new() -> Self {
        Self {
            config_path: PathBuf::from(DEFAULT_CONFIG_FILE),
        }
    }

    pub fn with_path(config_path: impl Into<PathBuf>) -> Self {
        Self {
            config_path: config_path.into(),
        }
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// Load the configuration, writing defaults on first run.
    pub fn load(&self) -> Result<AppConfig> {
        if self.config_path.exists() {
            let raw = std::fs::read_to_string(&self.config_path)
                .with_context(|| format!("failed to read config file {:?}", self.config_path))?;
            let config: AppConfig = serde_json::from_str(&raw)
                .with_context(|| format!("config file {:?} is not valid JSON", self.config_path))?;
            Ok(config)
        } else {
            let config = AppConfig::default();
            self.save(&config)?;
            info!("Wrote default configuration to {:?}", self.config_path);
            Ok(config)
        }
    }

    pub fn save(&self, config: &AppConfig) -> Result<()> {
        let raw = serde_json::to_string_pretty(config).context("failed to serialize config")?;
        std::fs::write(&self.config_path, raw)
            .with_context(|| format!("failed to write config file {:?}", self.config_path))?;
        Ok(())
    }
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_empty_target_and_sane_fetch_limits() {
        let config = AppConfig::default();
        assert!(config.scrape.target_url.is_empty());
        assert!(config.fetch.max_retries >= 1);
        assert!(config.fetch.stabilization_max_polls >= 1);
        assert!(config.report.enabled);
    }

    #[test]
    fn first_load_writes_the_default_file() {
        let dir = tempfile::tempdir().unwrap();
        let manager = ConfigManager::with_path(dir.path().join("pricewatch.json"));

        let config = manager.load().unwrap();
        assert!(manager.config_path().exists());
        assert_eq!(config.store.history_path, PathBuf::from("price_history.csv"));
    }

    #[test]
    fn partial_config_files_fall_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pricewatch.json");
        std::fs::write(&path, r#"{"scrape": {"target_url": "https://shop.example/coins"}}"#)
            .unwrap();

        let config = ConfigManager::with_path(&path).load().unwrap();
        assert_eq!(config.scrape.target_url, "https://shop.example/coins");
        assert_eq!(config.fetch.timeout_seconds, 30);
        assert!(!config.scrape.currency_markers.is_empty());
    }

    #[test]
    fn invalid_config_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pricewatch.json");
        std::fs::write(&path, "{not json").unwrap();

        assert!(ConfigManager::with_path(&path).load().is_err());
    }
}
