//! Caching HTTP fetcher
//!
//! This module handles every HTTP request the crawler makes:
//! - Building the HTTP client with the configured user agent and timeouts
//! - Serving fresh responses from the SQLite cache
//! - Turning non-success status codes into errors
//! - Cache eviction for stale or corrupted entries

use crate::config::CrawlerConfig;
use crate::storage::{CachedResponse, ResponseCache, SqliteResponseCache, StorageResult};
use chrono::{DateTime, SubsecRound, Utc};
use reqwest::header::CONTENT_TYPE;
use reqwest::{redirect::Policy, Client};
use std::borrow::Cow;
use std::time::Duration;
use thiserror::Error;

/// Maximum redirect hops followed for one request
const MAX_REDIRECTS: usize = 10;

/// Errors a fetch can end in
#[derive(Debug, Error)]
pub enum FetchError {
    /// The server answered with a non-success status
    #[error("HTTP {status} for {url}")]
    Status { url: String, status: u16 },

    /// The request timed out
    #[error("Request timeout for {url}")]
    Timeout { url: String },

    /// The request never produced a response
    #[error("Request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

impl FetchError {
    fn from_reqwest(url: &str, source: reqwest::Error) -> Self {
        if source.is_timeout() {
            Self::Timeout {
                url: url.to_string(),
            }
        } else {
            Self::Transport {
                url: url.to_string(),
                source,
            }
        }
    }
}

/// A fetched page
#[derive(Debug, Clone)]
pub struct PageSnapshot {
    /// URL that was requested
    pub url: String,

    /// HTTP status code
    pub status: u16,

    /// Content-Type header value
    pub content_type: Option<String>,

    /// Raw response body
    pub body: Vec<u8>,

    /// When the response was fetched from the network (not the cache hit time)
    pub fetched_at: DateTime<Utc>,

    /// Whether the snapshot was served from the cache
    pub from_cache: bool,
}

impl PageSnapshot {
    fn from_cached(cached: CachedResponse, from_cache: bool) -> Self {
        Self {
            url: cached.url,
            status: cached.status,
            content_type: cached.content_type,
            body: cached.body,
            fetched_at: cached.fetched_at,
            from_cache,
        }
    }

    /// Body decoded as UTF-8, replacing invalid sequences
    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `user_agent` - Value of the User-Agent header sent with every request
/// * `config` - Crawler configuration holding the timeouts
///
/// # Example
///
/// ```no_run
/// use civicweb_harvester::config::{CrawlerConfig, DEFAULT_USER_AGENT};
/// use civicweb_harvester::crawler::build_http_client;
///
/// let client = build_http_client(DEFAULT_USER_AGENT, &CrawlerConfig::default()).unwrap();
/// ```
pub fn build_http_client(
    user_agent: &str,
    config: &CrawlerConfig,
) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(user_agent)
        .timeout(Duration::from_secs(config.request_timeout_secs))
        .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
        .redirect(Policy::limited(MAX_REDIRECTS))
        .gzip(true)
        .brotli(true)
        .build()
}

/// HTTP fetcher with a transparent response cache
///
/// A URL fetched within the cache TTL is served from the cache with its
/// original fetch time. Only successful responses are cached.
pub struct PageFetcher {
    client: Client,
    cache: SqliteResponseCache,
    ttl: chrono::Duration,
}

impl PageFetcher {
    /// Creates a fetcher
    ///
    /// # Arguments
    ///
    /// * `client` - HTTP client, see [`build_http_client`]
    /// * `cache` - Response cache
    /// * `ttl` - How long a cached response is served without re-fetching
    pub fn new(client: Client, cache: SqliteResponseCache, ttl: chrono::Duration) -> Self {
        Self { client, cache, ttl }
    }

    /// Fetches a URL, from the cache when a fresh copy exists
    pub async fn fetch(&mut self, url: &str) -> Result<PageSnapshot, FetchError> {
        match self.cache.get(url) {
            Ok(Some(cached)) if !cached.is_expired(self.ttl, Utc::now()) => {
                tracing::debug!("Cache hit for {}", url);
                return Ok(PageSnapshot::from_cached(cached, true));
            }
            Ok(Some(_)) => tracing::debug!("Cached copy of {} expired", url),
            Ok(None) => {}
            Err(e) => tracing::warn!("Cache lookup failed for {}: {}", url, e),
        }

        let started = std::time::Instant::now();
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FetchError::from_reqwest(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.to_string());

        let body = response
            .bytes()
            .await
            .map_err(|e| FetchError::from_reqwest(url, e))?
            .to_vec();

        tracing::debug!(
            "Fetched {} ({} bytes) in {:.3}s",
            url,
            body.len(),
            started.elapsed().as_secs_f64()
        );

        let fetched = CachedResponse {
            url: url.to_string(),
            status: status.as_u16(),
            content_type,
            body,
            // The cache stores millisecond precision
            fetched_at: Utc::now().trunc_subsecs(3),
        };

        if let Err(e) = self.cache.put(&fetched) {
            tracing::warn!("Could not cache response for {}: {}", url, e);
        }

        Ok(PageSnapshot::from_cached(fetched, false))
    }

    /// Drops cached responses for the given URLs
    pub fn evict(&mut self, urls: &[String]) -> StorageResult<usize> {
        self.cache.evict(urls)
    }

    /// Drops every cached response
    pub fn clear_cache(&mut self) -> StorageResult<usize> {
        self.cache.clear()
    }

    /// Drops cached responses older than the TTL
    pub fn purge_expired(&mut self) -> StorageResult<usize> {
        self.cache.purge_expired(self.ttl)
    }
}
