//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the crawler, including:
//! - The pluggable `Fetcher` capability the engine calls once per task
//! - Building HTTP clients from configuration
//! - Error classification (timeout, network, HTTP status, protocol)
//! - A retry decorator for transient failures

use crate::config::HttpSettings;
use crate::crawler::request::{Request, Response};
use crate::{panic_message, ConfigError, SpiderError};
use async_trait::async_trait;
use futures::FutureExt;
use rand::seq::IndexedRandom;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, USER_AGENT};
use reqwest::Client;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;

/// Terminal failure of a single fetch
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
    #[error("Request timeout for {url}")]
    Timeout { url: String },

    #[error("Network error for {url}: {message}")]
    Network { url: String, message: String },

    #[error("HTTP {status} for {url}")]
    Status { url: String, status: u16 },

    #[error("Protocol error for {url}: {message}")]
    Protocol { url: String, message: String },

    #[error("Fetcher panicked for {url}: {message}")]
    Panicked { url: String, message: String },
}

impl FetchError {
    /// The URL the failed request targeted
    pub fn url(&self) -> &str {
        match self {
            Self::Timeout { url }
            | Self::Network { url, .. }
            | Self::Status { url, .. }
            | Self::Protocol { url, .. }
            | Self::Panicked { url, .. } => url,
        }
    }

    /// Returns true for failures worth another attempt
    ///
    /// | Condition | Retry |
    /// |-----------|-------|
    /// | Timeout | yes |
    /// | Network (connection refused, reset) | yes |
    /// | HTTP 5xx, HTTP 429 | yes |
    /// | Other HTTP >= 400 | no |
    /// | Protocol (redirect loop, decode) | no |
    /// | Fetcher panicked | no |
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Timeout { .. } | Self::Network { .. } => true,
            Self::Status { status, .. } => *status >= 500 || *status == 429,
            Self::Protocol { .. } | Self::Panicked { .. } => false,
        }
    }
}

/// Executes one request against its target URL
///
/// Implementations make a single attempt; retry policy belongs to a
/// decorator such as [`RetryFetcher`].
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, request: Arc<Request>) -> Result<Response, FetchError>;
}

#[async_trait]
impl<F: Fetcher + ?Sized> Fetcher for Arc<F> {
    async fn fetch(&self, request: Arc<Request>) -> Result<Response, FetchError> {
        (**self).fetch(request).await
    }
}

/// Runs `fetcher` for `request`, turning a panic into [`FetchError::Panicked`]
pub(crate) async fn fetch_guarded(
    fetcher: &dyn Fetcher,
    request: Arc<Request>,
) -> Result<Response, FetchError> {
    let url = request.url().to_string();
    AssertUnwindSafe(fetcher.fetch(request))
        .catch_unwind()
        .await
        .unwrap_or_else(|payload| {
            Err(FetchError::Panicked {
                url,
                message: panic_message(payload),
            })
        })
}

/// Builds an HTTP client with proper configuration
///
/// Configured headers become client defaults, so they apply to every
/// request that does not set the same header itself.
///
/// # Example
///
/// ```
/// use sumi_spider::config::HttpSettings;
/// use sumi_spider::crawler::build_http_client;
///
/// let client = build_http_client(&HttpSettings::default()).unwrap();
/// ```
pub fn build_http_client(settings: &HttpSettings) -> Result<Client, SpiderError> {
    let mut headers = HeaderMap::new();
    for (name, value) in &settings.headers {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|_| ConfigError::Validation(format!("Invalid header name: '{}'", name)))?;
        let value = HeaderValue::from_str(value)
            .map_err(|_| ConfigError::Validation(format!("Invalid header value: '{}'", value)))?;
        headers.insert(name, value);
    }

    let client = Client::builder()
        .user_agent(settings.user_agent.as_str())
        .timeout(settings.timeout())
        .connect_timeout(settings.connect_timeout())
        .default_headers(headers)
        .gzip(true)
        .brotli(true)
        .build()?;

    Ok(client)
}

/// Fetcher backed by a `reqwest` client
///
/// When `user-agents` is configured, every request that does not set its
/// own User-Agent gets one picked at random from that pool.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
    user_agents: Vec<HeaderValue>,
}

impl HttpFetcher {
    /// Creates a fetcher from HTTP settings
    pub fn new(settings: &HttpSettings) -> Result<Self, SpiderError> {
        let user_agents = settings
            .user_agents
            .iter()
            .map(|agent| {
                HeaderValue::from_str(agent).map_err(|_| {
                    ConfigError::Validation(format!("Invalid user agent: '{}'", agent))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            client: build_http_client(settings)?,
            user_agents,
        })
    }

    /// Wraps an already configured client
    pub fn with_client(client: Client) -> Self {
        Self {
            client,
            user_agents: Vec::new(),
        }
    }

    /// Request headers plus a rotated User-Agent when a pool is configured
    fn headers_for(&self, request: &Request) -> HeaderMap {
        let mut headers = request.headers().clone();
        if !headers.contains_key(USER_AGENT) {
            if let Some(agent) = self.user_agents.choose(&mut rand::rng()) {
                headers.insert(USER_AGENT, agent.clone());
            }
        }
        headers
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, request: Arc<Request>) -> Result<Response, FetchError> {
        let url = request.url().to_string();
        let started = Instant::now();

        let response = self
            .client
            .request(request.method().clone(), request.url().clone())
            .headers(self.headers_for(&request))
            .send()
            .await
            .map_err(|e| classify_error(&url, e))?;

        let status = response.status();
        if status.as_u16() >= 400 {
            return Err(FetchError::Status {
                url,
                status: status.as_u16(),
            });
        }

        let final_url = response.url().clone();
        let headers = response.headers().clone();
        let body = response
            .bytes()
            .await
            .map_err(|e| classify_error(&url, e))?;

        tracing::debug!(
            "Fetched {} ({}, {} bytes) in {:?}",
            url,
            status,
            body.len(),
            started.elapsed()
        );

        Ok(Response::new(request, status, body.to_vec())
            .with_url(final_url)
            .with_headers(headers)
            .with_elapsed(started.elapsed()))
    }
}

/// Maps a transport error onto the fetch error taxonomy
fn classify_error(url: &str, error: reqwest::Error) -> FetchError {
    if error.is_timeout() {
        FetchError::Timeout {
            url: url.to_string(),
        }
    } else if error.is_redirect() || error.is_decode() || error.is_builder() {
        FetchError::Protocol {
            url: url.to_string(),
            message: error.to_string(),
        }
    } else {
        FetchError::Network {
            url: url.to_string(),
            message: error.to_string(),
        }
    }
}

/// Decorator that retries transient failures of an inner fetcher
pub struct RetryFetcher<F> {
    inner: F,
    max_retries: u32,
    delay: Duration,
}

impl<F: Fetcher> RetryFetcher<F> {
    /// Retries up to `max_retries` extra times, sleeping `delay` between attempts
    pub fn new(inner: F, max_retries: u32, delay: Duration) -> Self {
        Self {
            inner,
            max_retries,
            delay,
        }
    }
}

#[async_trait]
impl<F: Fetcher> Fetcher for RetryFetcher<F> {
    async fn fetch(&self, request: Arc<Request>) -> Result<Response, FetchError> {
        let mut attempt = 0;

        loop {
            match self.inner.fetch(Arc::clone(&request)).await {
                Ok(response) => return Ok(response),
                Err(e) if e.is_retryable() && attempt < self.max_retries => {
                    attempt += 1;
                    tracing::warn!(
                        "{} (attempt {}/{}), retrying in {:?}",
                        e,
                        attempt,
                        self.max_retries + 1,
                        self.delay
                    );
                    tokio::time::sleep(self.delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
