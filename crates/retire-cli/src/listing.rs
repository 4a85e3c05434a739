//! # Live Listing Client
//!
//! Fetches the list of files the public mirror still serves. The endpoint
//! returns plain text with one path per line; only basenames matter.
//! Anything in the listing is protected from retirement even when a newer
//! version exists.
//!
//! The fetch is a plain GET, so it is retried with exponential backoff
//! when the mirror is unreachable or answers with a server-side status
//! (5xx or 429). Any other status is a definitive answer.

use std::time::Duration;

use thiserror::Error;
use url::Url;

use retire_engine::LiveSet;

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// How often, and how patiently, a failed fetch is repeated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Attempts after the initial request.
    pub max_retries: u32,
    /// Delay before the first retry; doubles with each further attempt.
    pub base_delay: Duration,
}

impl RetryPolicy {
    /// No retries at all.
    pub const NONE: Self = Self {
        max_retries: 0,
        base_delay: Duration::ZERO,
    };

    fn delay(&self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(2u32.saturating_pow(attempt))
    }
}

impl Default for RetryPolicy {
    /// Three retries after 200ms, 400ms and 800ms.
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_millis(200),
        }
    }
}

/// Errors from fetching the live listing.
#[derive(Error, Debug)]
pub enum ListingError {
    /// Transport failure after all retries, or a body that could not be read.
    #[error("listing request to {url} failed: {source}")]
    Http {
        /// Requested URL.
        url: String,
        /// Underlying error.
        #[source]
        source: reqwest::Error,
    },

    /// The server answered with a non-success status.
    #[error("listing request to {url} returned HTTP {status}: {body}")]
    Status {
        /// Requested URL.
        url: String,
        /// HTTP status code.
        status: u16,
        /// Response body, truncated.
        body: String,
    },

    /// The HTTP client could not be constructed.
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
}

impl ListingError {
    /// Whether repeating the same request could succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Http { .. } => true,
            Self::Status { status, .. } => *status >= 500 || *status == 429,
            Self::Client(_) => false,
        }
    }
}

/// HTTP client for the live listing endpoint.
#[derive(Debug, Clone)]
pub struct ListingClient {
    http: reqwest::Client,
    url: Url,
    retry: RetryPolicy,
}

impl ListingClient {
    /// Client for `url` with the default timeout.
    pub fn new(url: Url) -> Result<Self, ListingError> {
        Self::with_timeout(url, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(url: Url, timeout: Duration) -> Result<Self, ListingError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(ListingError::Client)?;
        Ok(Self {
            http,
            url,
            retry: RetryPolicy::default(),
        })
    }

    /// Replace the retry policy.
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Fetch and parse the listing, retrying transient failures.
    pub async fn fetch(&self) -> Result<LiveSet, ListingError> {
        let mut attempt = 0;
        loop {
            match self.fetch_once().await {
                Err(e) if e.is_transient() && attempt < self.retry.max_retries => {
                    let delay = self.retry.delay(attempt);
                    attempt += 1;
                    tracing::warn!(
                        url = %self.url,
                        attempt,
                        max_retries = self.retry.max_retries,
                        "listing fetch failed, retrying in {delay:?}: {e}"
                    );
                    tokio::time::sleep(delay).await;
                }
                result => return result,
            }
        }
    }

    async fn fetch_once(&self) -> Result<LiveSet, ListingError> {
        let http_err = |source: reqwest::Error| ListingError::Http {
            url: self.url.to_string(),
            source,
        };
        let resp = self
            .http
            .get(self.url.clone())
            .send()
            .await
            .map_err(http_err)?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp
                .text()
                .await
                .unwrap_or_default()
                .chars()
                .take(256)
                .collect();
            return Err(ListingError::Status {
                url: self.url.to_string(),
                status: status.as_u16(),
                body,
            });
        }

        let text = resp.text().await.map_err(http_err)?;
        let live = LiveSet::from_listing(&text);
        tracing::info!(url = %self.url, live = live.len(), "fetched live listing");
        Ok(live)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_error_display() {
        let err = ListingError::Status {
            url: "https://mirror.example.org/files.txt".into(),
            status: 503,
            body: "maintenance".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("503"));
        assert!(msg.contains("maintenance"));
    }

    #[test]
    fn only_server_side_statuses_are_transient() {
        let status = |status| ListingError::Status {
            url: String::new(),
            status,
            body: String::new(),
        };
        assert!(status(503).is_transient());
        assert!(status(429).is_transient());
        assert!(!status(404).is_transient());
        assert!(!status(403).is_transient());
    }

    #[test]
    fn backoff_doubles() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay(0), Duration::from_millis(200));
        assert_eq!(policy.delay(2), Duration::from_millis(800));
    }

    #[tokio::test]
    async fn refused_connection_is_retried_then_reported() {
        // Port 1 is closed, so every attempt is refused.
        let url = Url::parse("http://127.0.0.1:1/files.txt").unwrap();
        let client = ListingClient::with_timeout(url, Duration::from_millis(200))
            .unwrap()
            .with_retry(RetryPolicy {
                max_retries: 2,
                base_delay: Duration::from_millis(1),
            });

        let err = client.fetch().await.unwrap_err();

        assert!(matches!(err, ListingError::Http { .. }));
    }
}
