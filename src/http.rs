//! HTTP fetching for the scraping pipeline.
//!
//! One [`HttpClient`] is shared by every phase. It fetches raw markup for a
//! single logical unit of work (a letter page, an event, a fighter, a fight)
//! and classifies transport failures as [`Error::Scraping`] carrying the URL.
//! Retry is a policy decided by the calling phase, never here. The
//! [`HttpClient::throttle`] primitive provides the fixed inter-batch delay
//! used between sequential fetches; it is not applied inside worker pools.

use crate::config::ScrapeConfig;
use crate::error::{Error, Result};
use std::time::Duration;
use tracing::debug;

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                          (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

/// Shared HTTP client with a fixed User-Agent and inter-batch delay.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: reqwest::Client,
    delay: Duration,
}

impl HttpClient {
    /// Build the client from the pipeline configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] if the underlying client cannot be
    /// constructed.
    pub fn new(config: &ScrapeConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| Error::Configuration(format!("failed to build http client: {e}")))?;
        Ok(Self {
            client,
            delay: Duration::from_secs_f64(config.delay_seconds),
        })
    }

    /// Fetch the raw markup for a URL.
    ///
    /// Non-success status codes and transport errors are both classified as
    /// [`Error::Scraping`] with the URL attached.
    pub async fn get_html(&self, url: &str) -> Result<String> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|source| Error::Scraping {
                url: url.to_string(),
                source,
            })?;
        let body = response.text().await.map_err(|source| Error::Scraping {
            url: url.to_string(),
            source,
        })?;
        debug!(%url, bytes = body.len(), "Fetched page");
        Ok(body)
    }

    /// Sleep for the configured inter-batch delay.
    pub async fn throttle(&self) {
        tokio::time::sleep(self.delay).await;
    }
}
