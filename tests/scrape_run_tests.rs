//! End-to-end scrape runs against fixture documents.

use async_trait::async_trait;
use pricewatch::ScrapeUseCase;
use pricewatch::infrastructure::config::AppConfig;
use pricewatch::infrastructure::history_store::HistoryStore;
use pricewatch::infrastructure::http_client::{FetchError, PageFetcher};
use std::path::Path;

const CATALOG: &str = r#"
<html><body>
  <div class="catalog">
    <a class="product" href="/coins/coin-x">
      <span class="product__title-inner">Coin X</span>
      <span class="price--selling">125,00 лв.</span>
      <span class="price--buying">120,00 лв.</span>
    </a>
    <a class="product" href="/coins/coin-y">
      <span class="product__title-inner">Coin Y</span>
      <span class="product__availability">Изчерпан</span>
    </a>
    <a class="product" href="/coins/coin-z">
      <span class="product__title-inner">Coin Z</span>
      <span class="price--selling">55,00 лв.</span>
    </a>
  </div>
</body></html>
"#;

struct FixtureFetcher {
    body: String,
}

#[async_trait]
impl PageFetcher for FixtureFetcher {
    async fn fetch(&self, _url: &str) -> Result<String, FetchError> {
        Ok(self.body.clone())
    }
}

struct FailingFetcher;

#[async_trait]
impl PageFetcher for FailingFetcher {
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        Err(FetchError::Status {
            status: 503,
            url: url.to_string(),
        })
    }
}

fn config_in(dir: &Path) -> AppConfig {
    let mut config = AppConfig::default();
    config.scrape.target_url = "https://shop.example/catalog".to_string();
    config.store.history_path = dir.join("price_history.csv");
    config.report.output_path = dir.join("price_trends.svg");
    config
}

fn fixture_use_case(dir: &Path, body: &str) -> ScrapeUseCase<FixtureFetcher> {
    ScrapeUseCase::new(
        config_in(dir),
        FixtureFetcher {
            body: body.to_string(),
        },
    )
    .unwrap()
}

#[tokio::test]
async fn a_run_persists_only_valid_observations_and_renders_the_report() {
    let dir = tempfile::tempdir().unwrap();
    let use_case = fixture_use_case(dir.path(), CATALOG);

    let summary = use_case.execute().await.unwrap();

    // Coin X survives; Coin Y has no selling price; Coin Z is in stock
    // without a buying price.
    assert_eq!(summary.observations, 1);
    assert_eq!(summary.persisted, 1);
    assert!(summary.persisted_any());

    let table = HistoryStore::new(dir.path().join("price_history.csv"))
        .load()
        .unwrap();
    assert_eq!(table.len(), 1);
    let product = table.column_index("Product").unwrap();
    let selling = table.column_index("Selling_Price").unwrap();
    let buying = table.column_index("Buying_Price").unwrap();
    let url = table.column_index("URL").unwrap();
    assert_eq!(table.rows[0][product], "Coin X");
    assert_eq!(table.rows[0][selling], "125.00");
    assert_eq!(table.rows[0][buying], "120.00");
    assert_eq!(table.rows[0][url], "https://shop.example/coins/coin-x");

    let svg = std::fs::read_to_string(dir.path().join("price_trends.svg")).unwrap();
    assert!(svg.contains("<svg"));
}

#[tokio::test]
async fn repeated_runs_grow_the_time_series() {
    let dir = tempfile::tempdir().unwrap();

    fixture_use_case(dir.path(), CATALOG).execute().await.unwrap();
    let summary = fixture_use_case(dir.path(), CATALOG).execute().await.unwrap();

    assert_eq!(summary.persisted, 1);
    let table = HistoryStore::new(dir.path().join("price_history.csv"))
        .load()
        .unwrap();
    assert_eq!(table.len(), 2);
}

#[tokio::test]
async fn a_legacy_store_is_reconciled_not_rewritten_away() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("price_history.csv"),
        "Timestamp,Product,Price,URL\n\
         2024-01-01 10:00:00,Coin X,110.00,https://shop.example/coins/coin-x\n",
    )
    .unwrap();

    fixture_use_case(dir.path(), CATALOG).execute().await.unwrap();

    let table = HistoryStore::new(dir.path().join("price_history.csv"))
        .load()
        .unwrap();
    assert_eq!(table.len(), 2);
    let legacy_price = table.column_index("Price").unwrap();
    let selling = table.column_index("Selling_Price").unwrap();
    assert_eq!(table.rows[0][legacy_price], "110.00");
    assert_eq!(table.rows[1][selling], "125.00");
}

#[tokio::test]
async fn an_unparsable_document_is_a_clean_no_data_run() {
    let dir = tempfile::tempdir().unwrap();
    let use_case = fixture_use_case(dir.path(), "<html><body>maintenance</body></html>");

    let summary = use_case.execute().await.unwrap();

    assert!(!summary.persisted_any());
    assert!(!dir.path().join("price_history.csv").exists());
    assert!(!dir.path().join("price_trends.svg").exists());
}

#[tokio::test]
async fn fetch_failures_are_fatal_and_touch_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let use_case = ScrapeUseCase::new(config_in(dir.path()), FailingFetcher).unwrap();

    let result = use_case.execute().await;

    assert!(result.is_err());
    assert!(!dir.path().join("price_history.csv").exists());
}

#[tokio::test]
async fn an_unconfigured_target_url_refuses_to_run() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = config_in(dir.path());
    config.scrape.target_url = String::new();

    assert!(ScrapeUseCase::new(config, FailingFetcher).is_err());
}
