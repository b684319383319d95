//! HTTP fetcher implementation
//!
//! This module performs single page requests for the scraper:
//! - Building HTTP clients with the configured user agent
//! - Refusing URLs outside the allowed domains
//! - GET requests to fetch page content
//! - Classifying the outcome for the retry loop
//!
//! Retrying lives one level up in [`crate::crawler::retry`]; a fetcher makes
//! exactly one attempt per call.

use crate::config::FetchOptions;
use crate::url::is_allowed_domain;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use std::fmt;
use std::time::Duration;

/// Result of a single fetch attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchResult {
    /// Successfully fetched the page (2xx)
    Success {
        /// Final URL after redirects
        final_url: String,
        /// HTTP status code
        status_code: u16,
        /// Page body content
        body: String,
    },

    /// The server answered with a non-success status
    HttpError {
        /// The HTTP status code
        status_code: u16,
    },

    /// The URL is outside the allowed domains; no request was sent
    Forbidden {
        /// The rejected URL
        url: String,
    },

    /// Network error (connection refused, timeout, body read failure, etc.)
    NetworkError {
        /// Error description
        error: String,
    },
}

impl FetchResult {
    /// The HTTP status observed, if a response was received
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Success { status_code, .. } | Self::HttpError { status_code } => {
                Some(*status_code)
            }
            Self::Forbidden { .. } | Self::NetworkError { .. } => None,
        }
    }

    /// True when the server signalled rate limiting (HTTP 429)
    pub fn is_rate_limited(&self) -> bool {
        self.status_code() == Some(StatusCode::TOO_MANY_REQUESTS.as_u16())
    }
}

impl fmt::Display for FetchResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success { status_code, .. } => write!(f, "HTTP {}", status_code),
            Self::HttpError { status_code } => match StatusCode::from_u16(*status_code)
                .ok()
                .and_then(|s| s.canonical_reason())
            {
                Some(reason) => write!(f, "HTTP {} {}", status_code, reason),
                None => write!(f, "HTTP {}", status_code),
            },
            Self::Forbidden { url } => write!(f, "forbidden domain for {}", url),
            Self::NetworkError { error } => f.write_str(error),
        }
    }
}

/// Performs one HTTP GET per call
///
/// Implementations must be shareable across the tasks spawned by counted
/// pagination.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn visit(&self, url: &str) -> FetchResult;
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `options` - The fetch options (the user agent is taken from here)
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
///
/// # Example
///
/// ```no_run
/// use sumi_scraper::config::FetchOptions;
/// use sumi_scraper::crawler::build_http_client;
///
/// let client = build_http_client(&FetchOptions::default()).unwrap();
/// ```
pub fn build_http_client(options: &FetchOptions) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(options.user_agent.as_str())
        .timeout(Duration::from_secs(30))
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// [`Fetcher`] backed by a reqwest client
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
    allowed_domains: Vec<String>,
}

impl HttpFetcher {
    /// Creates a fetcher using the user agent and allowed domains from `options`
    pub fn new(options: &FetchOptions) -> Result<Self, reqwest::Error> {
        Ok(Self::with_client(
            build_http_client(options)?,
            options.allowed_domains.clone(),
        ))
    }

    /// Creates a fetcher around an existing client
    pub fn with_client(client: Client, allowed_domains: Vec<String>) -> Self {
        Self {
            client,
            allowed_domains,
        }
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn visit(&self, url: &str) -> FetchResult {
        if !is_allowed_domain(url, &self.allowed_domains) {
            return FetchResult::Forbidden {
                url: url.to_string(),
            };
        }

        fetch_url(&self.client, url).await
    }
}

/// Fetches a URL once and classifies the outcome
///
/// | Condition | Result |
/// |-----------|--------|
/// | HTTP 2xx | `Success` with the body |
/// | Any other status | `HttpError` (429 included, the caller decides to retry) |
/// | Timeout / connection / body errors | `NetworkError` |
pub async fn fetch_url(client: &Client, url: &str) -> FetchResult {
    let response = match client.get(url).send().await {
        Ok(response) => response,
        Err(e) => return classify_network_error(&e),
    };

    let status = response.status();
    if !status.is_success() {
        return FetchResult::HttpError {
            status_code: status.as_u16(),
        };
    }

    let final_url = response.url().to_string();
    match response.text().await {
        Ok(body) => FetchResult::Success {
            final_url,
            status_code: status.as_u16(),
            body,
        },
        Err(e) => classify_network_error(&e),
    }
}

fn classify_network_error(e: &reqwest::Error) -> FetchResult {
    let error = if e.is_timeout() {
        format!("request timeout: {}", e)
    } else if e.is_connect() {
        format!("connection failed: {}", e)
    } else if e.is_builder() {
        format!("invalid request: {}", e)
    } else {
        e.to_string()
    };
    FetchResult::NetworkError { error }
}
