//! HTTP fetcher implementation
//!
//! This module wraps the shared transport session used for every request of
//! a sweep:
//! - Building the HTTP client with the configured user agent and optional timeout
//! - GET requests returning the page markup
//! - Error classification into [`FetchFailure`]
//!
//! Failed fetches are not retried; the caller decides whether a failure is
//! fatal.

use crate::config::CrawlerConfig;
use reqwest::Client;
use std::time::Duration;
use thiserror::Error;

/// A failed retrieval of one URL
#[derive(Debug, Clone, Error)]
#[error("failed to fetch {url}: {cause}")]
pub struct FetchError {
    /// The URL that could not be retrieved
    pub url: String,

    /// What went wrong
    pub cause: FetchFailure,
}

/// Classification of fetch failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchFailure {
    /// The server answered with a non-success status
    #[error("HTTP status {0}")]
    Status(u16),

    /// The request did not complete within the client timeout
    #[error("request timed out")]
    Timeout,

    /// The connection could not be established
    #[error("connection failed: {0}")]
    Connect(String),

    /// The response body could not be read
    #[error("failed to read body: {0}")]
    Body(String),

    /// Any other transport error
    #[error("{0}")]
    Transport(String),
}

impl FetchFailure {
    fn from_reqwest(error: &reqwest::Error) -> Self {
        if error.is_timeout() {
            FetchFailure::Timeout
        } else if error.is_connect() {
            FetchFailure::Connect(error.to_string())
        } else if error.is_body() || error.is_decode() {
            FetchFailure::Body(error.to_string())
        } else {
            FetchFailure::Transport(error.to_string())
        }
    }
}

/// Builds an HTTP client with proper configuration
///
/// # Example
///
/// ```no_run
/// use catalog_sweep::config::CrawlerConfig;
/// use catalog_sweep::crawler::build_http_client;
///
/// let client = build_http_client(&CrawlerConfig::default()).unwrap();
/// ```
///
/// Without `request-timeout-secs` the client keeps the transport default,
/// which never times out a request that is still making progress.
pub fn build_http_client(config: &CrawlerConfig) -> Result<Client, reqwest::Error> {
    let mut builder = Client::builder()
        .user_agent(config.user_agent.clone())
        .gzip(true)
        .brotli(true);

    if let Some(secs) = config.request_timeout_secs {
        builder = builder.timeout(Duration::from_secs(secs));
    }

    builder.build()
}

/// Document fetcher over a shared, connection-reusing session
///
/// Cloning is cheap: every clone shares the same underlying connection pool,
/// so one fetcher is built per sweep and handed to every task.
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: Client,
}

impl Fetcher {
    /// Wraps an existing client
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Builds the client from crawler configuration
    pub fn from_config(config: &CrawlerConfig) -> Result<Self, reqwest::Error> {
        build_http_client(config).map(Self::new)
    }

    /// Fetches a URL and returns its markup
    ///
    /// One network round trip. Any non-2xx status is a failure; redirects
    /// are followed by the client.
    pub async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        let fail = |cause: FetchFailure| FetchError {
            url: url.to_string(),
            cause,
        };

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| fail(FetchFailure::from_reqwest(&e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(fail(FetchFailure::Status(status.as_u16())));
        }

        response
            .text()
            .await
            .map_err(|e| fail(FetchFailure::Body(e.to_string())))
    }
}
