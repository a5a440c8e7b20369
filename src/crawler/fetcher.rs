//! Remote API client
//!
//! This module performs every request the crawl makes:
//! - Building the HTTP client with the configured user agent and timeouts
//! - Mapping an endpoint kind to its URL
//! - Attaching bearer authorization and query parameters
//! - Reading the quota headers from every response
//! - Classifying non-success statuses as fatal remote errors
//!
//! No request is ever retried here. Staying under quota is the job of the
//! rate limiter.

use crate::config::ApiConfig;
use crate::state::{EndpointClass, RateSignal};
use crate::{CrawlError, Result};
use reqwest::header::HeaderMap;
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::time::Duration;
use url::{ParseError, Url};

/// Header carrying the number of requests left in the window
pub const RATE_REMAINING_HEADER: &str = "x-rate-limit-remaining";

/// Header carrying the window reset time as unix seconds
pub const RATE_RESET_HEADER: &str = "x-rate-limit-reset";

/// The endpoint shapes the crawl calls
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Endpoint {
    /// Recent search over all posts
    Search,

    /// Followers of the given user id
    Followers(String),

    /// Recent posts of the given user id
    Posts(String),
}

impl Endpoint {
    /// The rate limit class this endpoint is accounted under
    pub fn class(&self) -> EndpointClass {
        match self {
            Self::Search => EndpointClass::Search,
            Self::Followers(_) => EndpointClass::Followers,
            Self::Posts(_) => EndpointClass::Posts,
        }
    }

    fn path_segments(&self) -> Vec<&str> {
        match self {
            Self::Search => vec!["2", "tweets", "search", "recent"],
            Self::Followers(id) => vec!["2", "users", id.as_str(), "followers"],
            Self::Posts(id) => vec!["2", "users", id.as_str(), "tweets"],
        }
    }
}

/// A decoded response body and the quota signal that came with it
#[derive(Debug)]
pub struct Fetched<T> {
    pub body: T,
    pub rate: Option<RateSignal>,
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `config` - The API configuration (user agent, timeout)
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
pub fn build_http_client(config: &ApiConfig) -> std::result::Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.user_agent.clone())
        .timeout(Duration::from_secs(config.request_timeout_secs))
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Reads the quota signal from response headers
///
/// Returns None if either header is absent or malformed; the limiter treats
/// that as "unknown, do not throttle".
pub fn rate_signal(headers: &HeaderMap) -> Option<RateSignal> {
    let remaining = headers
        .get(RATE_REMAINING_HEADER)
        .and_then(|v| v.to_str().ok());
    let reset = headers.get(RATE_RESET_HEADER).and_then(|v| v.to_str().ok());
    RateSignal::from_headers(remaining, reset)
}

/// Authenticated client for the three crawl endpoints
#[derive(Clone)]
pub struct RemoteClient {
    http: Client,
    base_url: Url,
    bearer_token: String,
}

impl RemoteClient {
    /// Creates a client for the API at `config.base_url`
    pub fn new(config: &ApiConfig, bearer_token: impl Into<String>) -> Result<Self> {
        let http = build_http_client(config)?;
        let base_url = Url::parse(&config.base_url)?;
        if base_url.cannot_be_a_base() {
            return Err(CrawlError::UrlParse(
                ParseError::RelativeUrlWithCannotBeABaseBase,
            ));
        }

        Ok(Self {
            http,
            base_url,
            bearer_token: bearer_token.into(),
        })
    }

    /// Full URL for an endpoint, without query parameters
    pub fn url_for(&self, endpoint: &Endpoint) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| CrawlError::UrlParse(ParseError::RelativeUrlWithCannotBeABaseBase))?
            .pop_if_empty()
            .extend(endpoint.path_segments());
        Ok(url)
    }

    /// Performs one GET against `endpoint` and decodes the JSON body
    ///
    /// # Request Flow
    ///
    /// | Outcome | Result |
    /// |---------|--------|
    /// | 2xx, JSON body | `Ok(Fetched)` with the decoded body |
    /// | 2xx, body not JSON | `Err(CrawlError::Decode)` |
    /// | non-2xx | `Err(CrawlError::Remote)` with the raw body text |
    /// | transport failure | `Err(CrawlError::Http)` |
    ///
    /// Missing quota headers never fail the call.
    pub async fn fetch<T: DeserializeOwned>(
        &self,
        endpoint: &Endpoint,
        params: &[(&str, String)],
    ) -> Result<Fetched<T>> {
        let url = self.url_for(endpoint)?;
        tracing::debug!(class = %endpoint.class(), "GET {}", url);

        let response = self
            .http
            .get(url.clone())
            .bearer_auth(&self.bearer_token)
            .query(params)
            .send()
            .await
            .map_err(|source| CrawlError::Http {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        let rate = rate_signal(response.headers());
        tracing::trace!(
            class = %endpoint.class(),
            %status,
            rate_limit.remaining = ?rate.map(|r| r.requests_remaining),
            rate_limit.reset = ?rate.map(|r| r.reset_at),
            "Response headers"
        );

        if !status.is_success() {
            let body = match response.text().await {
                Ok(text) => text,
                Err(e) => {
                    tracing::warn!("Failed to read error body from {}: {}", url, e);
                    String::new()
                }
            };
            tracing::error!("{} returned HTTP {}: {}", url, status.as_u16(), body);
            return Err(CrawlError::Remote {
                status: status.as_u16(),
                body,
            });
        }

        let bytes = response.bytes().await.map_err(|source| CrawlError::Http {
            url: url.to_string(),
            source,
        })?;

        let body = serde_json::from_slice::<T>(&bytes).map_err(|source| CrawlError::Decode {
            url: url.to_string(),
            source,
        })?;

        Ok(Fetched { body, rate })
    }
}
