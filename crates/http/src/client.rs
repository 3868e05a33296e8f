//! HTTP listing client
//!
//! Wraps reqwest and implements the PageFetcher trait from si-core.
//! Listing requests are anonymous GETs; no signing is performed.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};

use si_core::{Error, PageFetcher, Result};

/// Longest error body kept in an error message
const MAX_ERROR_BODY: usize = 200;

/// HTTP client settings
#[derive(Debug, Clone)]
pub struct HttpConfig {
    /// Overall deadline for one request, including reading the body
    pub timeout: Duration,

    /// Deadline for establishing the connection
    pub connect_timeout: Duration,

    /// Allow invalid TLS certificates
    pub insecure: bool,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(5),
            insecure: false,
        }
    }
}

/// Fetches listing documents over HTTP
pub struct HttpFetcher {
    http_client: Client,
}

impl HttpFetcher {
    /// Create a new fetcher
    pub fn new(config: &HttpConfig) -> Result<Self> {
        let http_client = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .danger_accept_invalid_certs(config.insecure)
            .user_agent(concat!("s3-index/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::Network(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self { http_client })
    }

    /// Map a non-2xx response to an error
    fn map_error(status: StatusCode, body: &str) -> Error {
        let body = body.trim();
        let body = match body.char_indices().nth(MAX_ERROR_BODY) {
            Some((pos, _)) => format!("{}...", &body[..pos]),
            None => body.to_string(),
        };
        Error::Http {
            status: status.as_u16(),
            body,
        }
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<String> {
        tracing::debug!(%url, "GET");

        let response = self.http_client.get(url).send().await.map_err(|e| {
            if e.is_timeout() {
                Error::Network(format!("Request timed out: {e}"))
            } else {
                Error::Network(format!("Request failed: {e}"))
            }
        })?;

        let status = response.status();

        if !status.is_success() {
            let error_body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            tracing::warn!(status = status.as_u16(), %url, "Listing request rejected");
            return Err(Self::map_error(status, &error_body));
        }

        response
            .text()
            .await
            .map_err(|e| Error::Network(format!("Failed to read response: {e}")))
    }
}
