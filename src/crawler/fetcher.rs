//! Fetching of page content
//!
//! The crawl engine consumes fetching through the [`Fetcher`] trait so tests
//! can substitute deterministic in-memory implementations. [`HttpFetcher`] is
//! the production implementation: a reqwest client configured with the
//! crawler's user-agent string, timeouts, and compression support.

use crate::config::UserAgentConfig;
use reqwest::Client;
use std::future::Future;
use std::time::Duration;
use thiserror::Error;

/// Per-URL fetch failures
///
/// Every variant is non-fatal to the crawl: the task that hit it logs the
/// failure and finishes without producing a result or children.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Request timeout for {url}")]
    Timeout { url: String },

    #[error("Connection failed for {url}: {message}")]
    Connect { url: String, message: String },

    #[error("HTTP {status} from {url}")]
    Status { url: String, status: u16 },

    #[error("Unsupported content type {content_type} from {url}")]
    ContentType { url: String, content_type: String },

    #[error("Transport error for {url}: {message}")]
    Transport { url: String, message: String },
}

/// Capability to fetch the content behind a URL
///
/// Implementations must be safe to call concurrently from independent
/// workers; the engine shares one instance across the whole pool.
pub trait Fetcher: Send + Sync {
    fn fetch(&self, url: &str) -> impl Future<Output = Result<String, FetchError>> + Send;
}

/// HTTP fetcher backed by a shared reqwest client
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    /// Builds the fetcher with the crawler's identification headers
    pub fn new(user_agent: &UserAgentConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .user_agent(user_agent.header_value())
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(10))
            .gzip(true)
            .brotli(true)
            .build()?;

        Ok(Self { client })
    }
}

impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        let response = self.client.get(url).send().await.map_err(|e| {
            if e.is_timeout() {
                FetchError::Timeout {
                    url: url.to_string(),
                }
            } else if e.is_connect() {
                FetchError::Connect {
                    url: url.to_string(),
                    message: e.to_string(),
                }
            } else {
                FetchError::Transport {
                    url: url.to_string(),
                    message: e.to_string(),
                }
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let content_type = response
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();

        // Only HTML pages carry links worth following
        if !content_type.is_empty() && !content_type.contains("text/html") {
            return Err(FetchError::ContentType {
                url: url.to_string(),
                content_type,
            });
        }

        response.text().await.map_err(|e| FetchError::Transport {
            url: url.to_string(),
            message: e.to_string(),
        })
    }
}
