//! The one workflow this application has: a scrape run.
//!
//! fetch -> assemble -> merge into history -> report. Fetch and store
//! failures are fatal; an unparsable document or an all-dropped batch is
//! a "no data" run that finishes cleanly but persists nothing; report
//! failures are logged and never fail a run that already persisted.

use anyhow::{Context, Result, bail};
use scraper::Html;
use tracing::{error, info, warn};

use crate::infrastructure::config::AppConfig;
use crate::infrastructure::history_store::HistoryStore;
use crate::infrastructure::http_client::PageFetcher;
use crate::infrastructure::parsing::{ExtractionError, ObservationParser};
use crate::infrastructure::report;

/// What one run accomplished.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Observations extracted from the document.
    pub observations: usize,

    /// Rows actually appended to the history store.
    pub persisted: usize,
}

impl RunSummary {
    pub fn persisted_any(&self) -> bool {
        self.persisted > 0
    }
}

/// One scrape run against one catalog and one history store.
pub struct ScrapeUseCase<F: PageFetcher> {
    config: AppConfig,
    fetcher: F,
    parser: ObservationParser,
    store: HistoryStore,
}

impl<F: PageFetcher> ScrapeUseCase<F> {
    pub fn new(config: AppConfig, fetcher: F) -> Result<Self> {
        if config.scrape.target_url.trim().is_empty() {
            bail!("target_url is not configured; set it in the configuration file");
        }

        let parser =
            ObservationParser::new(&config.scrape).context("failed to compile catalog selectors")?;
        let store = HistoryStore::new(config.store.history_path.clone());

        Ok(Self {
            config,
            fetcher,
            parser,
            store,
        })
    }

    pub async fn execute(&self) -> Result<RunSummary> {
        info!("Starting price scrape for {}", self.config.scrape.target_url);

        let raw_markup = self
            .fetcher
            .fetch(&self.config.scrape.target_url)
            .await
            .context("failed to fetch catalog page")?;
        let document = Html::parse_document(&raw_markup);

        let batch = match self.parser.assemble(&document) {
            Ok(batch) => batch,
            Err(e @ ExtractionError::NoEntriesFound { .. }) => {
                error!("Could not find catalog entries using any selector: {}", e);
                return Ok(RunSummary::default());
            }
            Err(e) => return Err(e).context("catalog extraction failed"),
        };

        if batch.is_empty() {
            warn!("No observations were scraped");
            return Ok(RunSummary::default());
        }

        let outcome = self
            .store
            .merge_and_persist(&batch)
            .context("failed to merge observations into the history store")?;

        let summary = RunSummary {
            observations: batch.len(),
            persisted: outcome.appended,
        };
        info!(
            "Successfully scraped {} products ({} rows in history)",
            summary.observations, outcome.total_rows
        );

        if self.config.report.enabled && summary.persisted_any() {
            self.render_report();
        }

        Ok(summary)
    }

    /// Render the trend chart from the full history. Failures are logged;
    /// the scraped data is already safe on disk at this point.
    fn render_report(&self) {
        let table = match self.store.load() {
            Ok(table) => table,
            Err(e) => {
                error!("Could not reload history for the report: {}", e);
                return;
            }
        };
        if let Err(e) = report::render_price_trends(&table, &self.config.report.output_path) {
            error!("Error generating report: {:#}", e);
        }
    }
}
