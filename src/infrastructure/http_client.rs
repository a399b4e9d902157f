//! HTTP fetch collaborator.
//!
//! The catalog page lazy-loads entries, so a single response is not
//! necessarily the full document. The fetcher retries transport failures
//! with exponential backoff and then polls until the document stops
//! growing: two consecutive snapshots of equal length count as stable,
//! and the poll count is capped so the loop always terminates.

use async_trait::async_trait;
use reqwest::{Client, ClientBuilder};
use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use super::config::FetchConfig;

/// Fatal fetch failures; propagated unchanged, no partial extraction.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("HTTP status {status} for {url}")]
    Status { status: u16, url: String },

    #[error("empty document from {url}")]
    EmptyDocument { url: String },

    #[error("failed to build HTTP client: {0}")]
    ClientBuild(#[source] reqwest::Error),
}

/// The one operation the extraction pipeline needs from the outside
/// world: the fully-loaded catalog markup, or a fatal error.
#[async_trait]
pub trait PageFetcher {
    async fn fetch(&self, url: &str) -> Result<String, FetchError>;
}

/// `reqwest`-backed fetcher with retry and content stabilization.
pub struct HttpFetcher {
    client: Client,
    config: FetchConfig,
}

impl HttpFetcher {
    pub fn with_config(config: &FetchConfig) -> Result<Self, FetchError> {
        let client = ClientBuilder::new()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent(&config.user_agent)
            .cookie_store(true)
            .gzip(true)
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()
            .map_err(FetchError::ClientBuild)?;

        Ok(Self {
            client,
            config: config.clone(),
        })
    }

    async fn fetch_with_retry(&self, url: &str) -> Result<String, FetchError> {
        let mut last_error = None;

        for attempt in 1..=self.config.max_retries {
            match self.fetch_once(url).await {
                Ok(body) => {
                    debug!("Fetched {} bytes from {} on attempt {}", body.len(), url, attempt);
                    return Ok(body);
                }
                Err(e) => {
                    warn!("Attempt {} failed for {}: {}", attempt, url, e);
                    last_error = Some(e);

                    if attempt < self.config.max_retries {
                        // Exponential backoff
                        let delay_seconds = 2_u64.pow(attempt - 1);
                        sleep(Duration::from_secs(delay_seconds)).await;
                    }
                }
            }
        }

        Err(last_error.unwrap_or(FetchError::EmptyDocument {
            url: url.to_string(),
        }))
    }

    async fn fetch_once(&self, url: &str) -> Result<String, FetchError> {
        let response = self.client.get(url).send().await.map_err(|e| FetchError::Request {
            url: url.to_string(),
            source: e,
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let body = response.text().await.map_err(|e| FetchError::Request {
            url: url.to_string(),
            source: e,
        })?;

        if body.is_empty() {
            return Err(FetchError::EmptyDocument {
                url: url.to_string(),
            });
        }

        Ok(body)
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        info!("Fetching catalog page: {}", url);

        let first = self.fetch_with_retry(url).await?;
        poll_until_stable(
            first,
            self.config.stabilization_max_polls,
            Duration::from_millis(self.config.stabilization_delay_ms),
            || self.fetch_with_retry(url),
        )
        .await
    }
}

/// Refetch until two consecutive snapshots have equal length, bounded by
/// `max_polls` total fetches. A document still growing at the cap is used
/// as-is rather than looping forever.
async fn poll_until_stable<F, Fut>(
    first: String,
    max_polls: u32,
    delay: Duration,
    mut refetch: F,
) -> Result<String, FetchError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<String, FetchError>>,
{
    if max_polls <= 1 {
        return Ok(first);
    }

    let mut body = first;
    for poll in 1..max_polls {
        sleep(delay).await;
        let next = refetch().await?;
        if next.len() == body.len() {
            debug!("Document stabilized after {} polls", poll);
            return Ok(next);
        }
        body = next;
    }

    warn!(
        "Document still growing after {} polls; using the last snapshot",
        max_polls
    );
    Ok(body)
}
