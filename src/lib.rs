//! Pricewatch - catalog price scraper that grows a per-product price
//! history across runs.
//!
//! The library exposes the full pipeline (fetch, extraction, history
//! merge, report) so the binary stays a thin shell and tests can drive
//! the pipeline with fixture documents.

pub mod application;
pub mod domain;
pub mod infrastructure;

pub use application::{RunSummary, ScrapeUseCase};

use anyhow::{Context, Result};

/// Load configuration, initialize logging and execute one scrape run.
pub async fn run() -> Result<RunSummary> {
    let config = infrastructure::config::ConfigManager::new()
        .load()
        .context("failed to load configuration")?;

    infrastructure::logging::init_logging(&config.logging)?;
    infrastructure::logging::log_system_info();

    let fetcher = infrastructure::http_client::HttpFetcher::with_config(&config.fetch)
        .context("failed to build HTTP client")?;
    let use_case = ScrapeUseCase::new(config, fetcher)?;

    use_case.execute().await
}
