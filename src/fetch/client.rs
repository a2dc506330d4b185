//! HTTP client wrapper shared by the classifier, enumerators and extractor.
//!
//! Centralises timeout, user-agent, compression and politeness policy so
//! every request of a run behaves the same way.

use std::sync::Arc;
use std::time::Duration;

use reqwest::header::{CONTENT_TYPE, HeaderMap, USER_AGENT};
use reqwest::Client;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument, warn};
use url::Url;

use super::error::FetchError;
use super::rate_limiter::RateLimiter;
use crate::user_agent::{self, BROWSER_USER_AGENT};

/// Default connect timeout in seconds.
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

/// Default whole-request timeout in seconds.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 15;

/// Default politeness delay between requests to one host, in milliseconds.
pub const DEFAULT_DELAY_MS: u64 = 300;

/// Network settings for a [`PageClient`].
#[derive(Debug, Clone, Copy)]
pub struct ClientSettings {
    /// TCP/TLS connect timeout.
    pub connect_timeout: Duration,
    /// Timeout for a whole request including the body.
    pub request_timeout: Duration,
    /// Minimum delay between two requests to the same host.
    pub delay: Duration,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            delay: Duration::from_millis(DEFAULT_DELAY_MS),
        }
    }
}

/// A successfully fetched response with its body already read.
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// Final URL after redirects.
    pub url: Url,
    /// HTTP status (always a success status).
    pub status: u16,
    /// Response headers.
    pub headers: HeaderMap,
    /// Decoded body text.
    pub body: String,
}

impl FetchedPage {
    /// Returns a header value as a string, if present and valid ASCII.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Returns the media type of the response without parameters, lowercased.
    #[must_use]
    pub fn media_type(&self) -> Option<String> {
        self.headers
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(';').next())
            .map(|v| v.trim().to_ascii_lowercase())
    }

    /// Deserializes the body as JSON.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Decode`] when the body is not valid JSON for `T`.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, FetchError> {
        serde_json::from_str(&self.body)
            .map_err(|e| FetchError::decode(self.url.as_str(), e.to_string()))
    }
}

/// HTTP client for harvesting pages.
///
/// Created once per run and cloned cheaply; clones share the connection pool
/// and the rate limiter.
#[derive(Debug, Clone)]
pub struct PageClient {
    client: Client,
    rate_limiter: Arc<RateLimiter>,
}

impl PageClient {
    /// Builds a client with the given settings.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Client`] when the underlying client cannot be built.
    pub fn new(settings: ClientSettings) -> Result<Self, FetchError> {
        let client = Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .user_agent(user_agent::default_user_agent())
            .gzip(true)
            .build()
            .map_err(|e| FetchError::Client(e.to_string()))?;

        Ok(Self {
            client,
            rate_limiter: Arc::new(RateLimiter::new(settings.delay)),
        })
    }

    /// Fetches `url` and reads its body.
    ///
    /// A 403 answer is retried once with a browser User-Agent before giving up.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError`] on network failure, timeout, non-success status
    /// or an undecodable body.
    #[instrument(skip(self), fields(url = %url))]
    pub async fn get(&self, url: &Url) -> Result<FetchedPage, FetchError> {
        match self.send(url, None).await {
            Err(FetchError::HttpStatus { status: 403, .. }) => {
                warn!("HTTP 403 with default User-Agent; retrying once with browser User-Agent");
                self.send(url, Some(BROWSER_USER_AGENT)).await
            }
            other => other,
        }
    }

    async fn send(&self, url: &Url, user_agent: Option<&str>) -> Result<FetchedPage, FetchError> {
        self.rate_limiter.acquire(url.as_str()).await;

        let mut request = self.client.get(url.clone());
        if let Some(agent) = user_agent {
            request = request.header(USER_AGENT, agent);
        }

        let response = request
            .send()
            .await
            .map_err(|e| FetchError::from_reqwest(url.as_str(), e))?;

        let status = response.status();
        if !status.is_success() {
            debug!(status = status.as_u16(), "non-success status");
            return Err(FetchError::http_status(url.as_str(), status.as_u16()));
        }

        let final_url = response.url().clone();
        let headers = response.headers().clone();
        let body = response
            .text()
            .await
            .map_err(|e| FetchError::from_reqwest(url.as_str(), e))?;

        debug!(
            status = status.as_u16(),
            bytes = body.len(),
            final_url = %final_url,
            "fetched"
        );

        Ok(FetchedPage {
            url: final_url,
            status: status.as_u16(),
            headers,
            body,
        })
    }
}
