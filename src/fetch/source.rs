//! Content sources used by the fetch orchestrator
//!
//! This module handles the raw retrieval of a single attempt:
//! - Building the HTTP client
//! - Plain GET requests with a per-request timeout
//! - Error classification

use crate::fetch::FetchRequest;
use crate::FetchError;
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

/// Default user agent for plain requests
pub const DEFAULT_USER_AGENT: &str = concat!(
    "Mozilla/5.0 (compatible; page-harvest/",
    env!("CARGO_PKG_VERSION"),
    ")"
);

/// Something that can turn a request into raw content, once
#[async_trait]
pub trait ContentSource: Send + Sync {
    /// Performs one retrieval attempt
    async fn retrieve(&self, request: &FetchRequest) -> Result<String, FetchError>;
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `user_agent` - The user agent string sent with every request
/// * `timeout` - Default timeout; individual requests may override it
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
pub fn build_http_client(user_agent: &str, timeout: Duration) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(user_agent)
        .timeout(timeout)
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Plain HTTP GET source
#[derive(Debug, Clone)]
pub struct HttpSource {
    client: Client,
}

impl HttpSource {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &Client {
        &self.client
    }
}

#[async_trait]
impl ContentSource for HttpSource {
    async fn retrieve(&self, request: &FetchRequest) -> Result<String, FetchError> {
        let url = request.target.as_str();

        let response = self
            .client
            .get(url)
            .timeout(request.timeout)
            .send()
            .await
            .map_err(|e| classify(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        response.text().await.map_err(|e| classify(url, e))
    }
}

fn classify(url: &str, e: reqwest::Error) -> FetchError {
    if e.is_timeout() {
        FetchError::Timeout {
            url: url.to_string(),
        }
    } else {
        FetchError::Http {
            url: url.to_string(),
            source: e,
        }
    }
}
