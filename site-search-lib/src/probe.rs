//! Host probes: fetch a page over plain HTTP and search it for a term.

use crate::error::SiteSearchError;
use regex::bytes::Regex;
use std::future::Future;
use std::time::Duration;
use tracing::debug;

/// Retrieves the body served for a host.
///
/// This is the network seam of the pipeline; [`HttpFetcher`] is the
/// production implementation.
pub trait PageFetcher: Send + Sync + 'static {
    fn fetch(&self, host: &str) -> impl Future<Output = Result<Vec<u8>, SiteSearchError>> + Send;
}

/// Build the probe URL for a host. The scheme is always plain HTTP.
pub fn probe_url(host: &str) -> String {
    format!("http://{}", host)
}

/// HTTP fetcher backed by a shared `reqwest` client.
#[derive(Clone)]
pub struct HttpFetcher {
    /// HTTP client used for every probe
    http_client: reqwest::Client,
    /// Request timeout, reported in timeout errors
    timeout: Duration,
}

impl HttpFetcher {
    /// Create a fetcher whose requests time out after `timeout`.
    pub fn new(timeout: Duration) -> Result<Self, SiteSearchError> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| {
                SiteSearchError::network_with_source("Failed to create HTTP client", e.to_string())
            })?;

        Ok(Self {
            http_client,
            timeout,
        })
    }

    /// Wrap a preconfigured client.
    pub fn with_client(http_client: reqwest::Client, timeout: Duration) -> Self {
        Self {
            http_client,
            timeout,
        }
    }

    fn request_error(&self, err: reqwest::Error) -> SiteSearchError {
        if err.is_timeout() {
            SiteSearchError::timeout("HTTP request", self.timeout)
        } else if err.is_connect() {
            SiteSearchError::network_with_source("Connection failed", err.to_string())
        } else if err.is_body() || err.is_decode() {
            SiteSearchError::network_with_source("Failed to read response body", err.to_string())
        } else {
            SiteSearchError::network_with_source("HTTP request failed", err.to_string())
        }
    }
}

impl PageFetcher for HttpFetcher {
    fn fetch(&self, host: &str) -> impl Future<Output = Result<Vec<u8>, SiteSearchError>> + Send {
        let url = probe_url(host);

        async move {
            let response = self
                .http_client
                .get(&url)
                .send()
                .await
                .map_err(|e| self.request_error(e))?;

            debug!(url = %url, status = %response.status(), "received response");

            let body = response.bytes().await.map_err(|e| self.request_error(e))?;
            Ok(body.to_vec())
        }
    }
}

/// Case-sensitive, unanchored regular expression search over raw bytes.
#[derive(Debug, Clone)]
pub struct TermMatcher {
    term: String,
    pattern: Regex,
}

impl TermMatcher {
    /// Compile `term`. An empty term matches every body.
    pub fn new(term: &str) -> Result<Self, SiteSearchError> {
        let pattern = Regex::new(term).map_err(|e| SiteSearchError::PatternError {
            pattern: term.to_string(),
            message: e.to_string(),
        })?;

        Ok(Self {
            term: term.to_string(),
            pattern,
        })
    }

    /// The search term as given.
    pub fn term(&self) -> &str {
        &self.term
    }

    pub fn is_match(&self, body: &[u8]) -> bool {
        self.pattern.is_match(body)
    }
}
