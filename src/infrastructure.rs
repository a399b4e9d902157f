//! Infrastructure layer - parsing, persistence, fetch and reporting
//!
//! Everything that touches the outside world lives here; the application
//! layer only sees the traits and tables these modules expose.

pub mod config;
pub mod history_store;
pub mod http_client;
pub mod logging;
pub mod parsing;
pub mod report;

// Re-export commonly used items
pub use config::{AppConfig, ConfigManager};
pub use history_store::{HistoryStore, HistoryTable, MergeOutcome, StoreError};
pub use http_client::{FetchError, HttpFetcher, PageFetcher};
pub use parsing::{ExtractionError, ObservationParser, SelectorConfig};
