//! Page fetching over plain HTTP(S) GET.
//!
//! [`PageFetcher`] is the seam between the scheduler and the network; the
//! production implementation is [`HttpFetcher`] on top of reqwest.

use crate::error::FetchError;
use async_trait::async_trait;
use inkwatch_core::CollectorConfig;
use reqwest::Client;
use std::time::Duration;

/// A successfully fetched status page (2xx).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedPage {
    /// Requested URL
    pub url: String,
    /// HTTP status code
    pub status: u16,
    /// Response body as text
    pub body: String,
}

/// Raw outcome of one fetch, consumed immediately by extraction.
pub type RawResponse = std::result::Result<FetchedPage, FetchError>;

/// Performs one GET per call. No retries.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Fetch `url`, returning the body of a 2xx response.
    async fn fetch(&self, url: &str) -> RawResponse;
}

/// reqwest-backed fetcher with a fixed per-request timeout.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
    timeout: Duration,
}

impl HttpFetcher {
    /// Build a fetcher from collector settings.
    ///
    /// # Errors
    /// Returns error if the HTTP client cannot be created.
    pub fn new(config: &CollectorConfig) -> Result<Self, reqwest::Error> {
        let timeout = Duration::from_secs(config.timeout_secs);
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(config.user_agent.clone())
            .danger_accept_invalid_certs(config.accept_invalid_certs)
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()?;

        Ok(Self { client, timeout })
    }

    /// Per-request timeout.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn classify(&self, url: &str, err: &reqwest::Error) -> FetchError {
        if err.is_timeout() {
            FetchError::Timeout {
                url: url.to_string(),
                timeout_ms: u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX),
            }
        } else if let Some(status) = err.status() {
            FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            }
        } else if err.is_builder() {
            FetchError::InvalidAddress {
                address: url.to_string(),
                reason: err.to_string(),
            }
        } else {
            FetchError::Transport {
                url: url.to_string(),
                message: err.to_string(),
            }
        }
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> RawResponse {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| self.classify(url, &e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.text().await.map_err(|e| self.classify(url, &e))?;

        Ok(FetchedPage {
            url: url.to_string(),
            status: status.as_u16(),
            body,
        })
    }
}
