//! Cache-aware, rate-limited transport
//!
//! Performs one logical fetch:
//! - Serves from the cache when allowed and present
//! - Otherwise throttles, calls the network, and records the call
//! - Classifies HTTP statuses into soft outcomes and hard errors

use super::fetch::{Fetch, ReqwestFetch};
use super::rate_limit::{RateLimiter, RateLimiterConfig};
use crate::cache::{CacheStore, CachedResponse, NoCache};
use crate::error::{is_soft_status, Error, Result};
use crate::types::StringMap;
use reqwest::StatusCode;
use serde::Serialize;
use std::net::IpAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info};

/// Configuration for the HTTP client
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    /// Request timeout
    pub timeout: Duration,
    /// Rate limiter configuration
    pub rate_limit: RateLimiterConfig,
    /// Default headers for all requests
    pub default_headers: StringMap,
    /// API token, sent as `Authorization: token <value>`
    pub token: Option<String>,
    /// Local source address for outbound connections
    pub local_address: Option<IpAddr>,
    /// User agent string
    pub user_agent: String,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            rate_limit: RateLimiterConfig::default(),
            default_headers: StringMap::new(),
            token: None,
            local_address: None,
            user_agent: format!("pagefetch/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl HttpClientConfig {
    /// Create a new config builder
    pub fn builder() -> HttpClientConfigBuilder {
        HttpClientConfigBuilder::default()
    }
}

/// Builder for HTTP client config
#[derive(Default)]
pub struct HttpClientConfigBuilder {
    config: HttpClientConfig,
}

impl HttpClientConfigBuilder {
    /// Set the request timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Set rate limiter
    pub fn rate_limit(mut self, config: RateLimiterConfig) -> Self {
        self.config.rate_limit = config;
        self
    }

    /// Add a default header
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.config.default_headers.insert(key.into(), value.into());
        self
    }

    /// Set the API token
    pub fn token(mut self, token: impl Into<String>) -> Self {
        self.config.token = Some(token.into());
        self
    }

    /// Bind outbound connections to a local address
    pub fn local_address(mut self, addr: IpAddr) -> Self {
        self.config.local_address = Some(addr);
        self
    }

    /// Set user agent
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.config.user_agent = agent.into();
        self
    }

    /// Build the config
    pub fn build(self) -> HttpClientConfig {
        self.config
    }
}

// ============================================================================
// Fetch Outcome
// ============================================================================

/// Result of a successful transport call
///
/// A `ClientOutcome` is a soft failure: the server answered with one of
/// the "no data" statuses (400, 401, 403, 404, 422). Hard failures are
/// returned as `Err` instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// Response from the network or the cache
    Response(CachedResponse),
    /// Defined client-side status, treated as "no data"
    ClientOutcome {
        /// HTTP status code
        status: u16,
    },
}

impl FetchOutcome {
    /// Borrow the response, if any
    pub fn response(&self) -> Option<&CachedResponse> {
        match self {
            Self::Response(r) => Some(r),
            Self::ClientOutcome { .. } => None,
        }
    }

    /// Take the response, if any
    pub fn into_response(self) -> Option<CachedResponse> {
        match self {
            Self::Response(r) => Some(r),
            Self::ClientOutcome { .. } => None,
        }
    }

    /// Check if this is a soft failure
    pub fn is_client_outcome(&self) -> bool {
        matches!(self, Self::ClientOutcome { .. })
    }
}

// ============================================================================
// Stats
// ============================================================================

/// Call counters for one client
#[derive(Debug, Default)]
pub struct FetchStats {
    live_calls: AtomicU64,
    cache_hits: AtomicU64,
    client_outcomes: AtomicU64,
    live_time_ms: AtomicU64,
}

impl FetchStats {
    fn record_live_call(&self, elapsed: Duration) {
        self.live_calls.fetch_add(1, Ordering::Relaxed);
        self.live_time_ms
            .fetch_add(elapsed.as_millis() as u64, Ordering::Relaxed);
    }

    fn record_cache_hit(&self) {
        self.cache_hits.fetch_add(1, Ordering::Relaxed);
    }

    fn record_client_outcome(&self) {
        self.client_outcomes.fetch_add(1, Ordering::Relaxed);
    }

    /// Copy the current counters
    pub fn snapshot(&self) -> FetchStatsSnapshot {
        FetchStatsSnapshot {
            live_calls: self.live_calls.load(Ordering::Relaxed),
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
            client_outcomes: self.client_outcomes.load(Ordering::Relaxed),
            live_time_ms: self.live_time_ms.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of [`FetchStats`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FetchStatsSnapshot {
    /// Calls that reached the network
    pub live_calls: u64,
    /// Requests served from the cache
    pub cache_hits: u64,
    /// Soft failures (400/401/403/404/422)
    pub client_outcomes: u64,
    /// Total time spent in live calls, in milliseconds
    pub live_time_ms: u64,
}

// ============================================================================
// Client
// ============================================================================

/// Rate-limited, cache-aware HTTP transport
pub struct HttpClient {
    fetcher: Arc<dyn Fetch>,
    cache: Arc<dyn CacheStore>,
    rate_limiter: RateLimiter,
    stats: FetchStats,
}

impl HttpClient {
    /// Create a reqwest-backed client with no cache
    pub fn new(config: &HttpClientConfig) -> Result<Self> {
        let fetcher = ReqwestFetch::new(config)?;
        Ok(Self::with_parts(
            Arc::new(fetcher),
            Arc::new(NoCache),
            &config.rate_limit,
        ))
    }

    /// Create a client from its collaborators
    pub fn with_parts(
        fetcher: Arc<dyn Fetch>,
        cache: Arc<dyn CacheStore>,
        rate_limit: &RateLimiterConfig,
    ) -> Self {
        Self {
            fetcher,
            cache,
            rate_limiter: RateLimiter::new(rate_limit),
            stats: FetchStats::default(),
        }
    }

    /// Replace the cache store
    #[must_use]
    pub fn with_cache(mut self, cache: Arc<dyn CacheStore>) -> Self {
        self.cache = cache;
        self
    }

    /// Fetch a URL, consulting the cache first when `use_cache` is set
    ///
    /// Cache hits never touch the rate limiter. Live responses are stored
    /// under `url` when `use_cache` is set; soft failures are never stored.
    pub async fn fetch_raw(&self, url: &str, use_cache: bool) -> Result<FetchOutcome> {
        if use_cache {
            if let Some(cached) = self.cache.get(url).await? {
                self.stats.record_cache_hit();
                debug!(url, "Cache hit");
                return Ok(FetchOutcome::Response(cached));
            }
        }

        let permit = self.rate_limiter.throttle().await;
        let start = Instant::now();
        let result = self.fetcher.fetch(url).await;
        let calls = permit.record_call();

        let elapsed = start.elapsed();
        self.stats.record_live_call(elapsed);
        info!(
            url,
            elapsed_ms = elapsed.as_millis() as u64,
            calls,
            "Fetched"
        );

        let raw = result?;

        if is_soft_status(raw.status) {
            self.stats.record_client_outcome();
            error!(url, status = raw.status, "{}", status_text(raw.status));
            return Ok(FetchOutcome::ClientOutcome { status: raw.status });
        }

        if !raw.is_success() {
            let body = String::from_utf8_lossy(&raw.body).into_owned();
            return Err(Error::http_status(raw.status, body));
        }

        let response = CachedResponse::from(raw);
        if use_cache {
            self.cache.put(url, &response).await?;
        }

        Ok(FetchOutcome::Response(response))
    }

    /// Get call counters
    pub fn stats(&self) -> FetchStatsSnapshot {
        self.stats.snapshot()
    }

    /// Get the rate limiter
    pub fn rate_limiter(&self) -> &RateLimiter {
        &self.rate_limiter
    }
}

impl std::fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpClient")
            .field("rate_limiter", &self.rate_limiter)
            .field("stats", &self.stats.snapshot())
            .finish_non_exhaustive()
    }
}

/// Human-readable status line, e.g. "404 Not Found"
fn status_text(status: u16) -> String {
    StatusCode::from_u16(status)
        .ok()
        .and_then(|s| s.canonical_reason())
        .map_or_else(|| status.to_string(), |reason| format!("{status} {reason}"))
}
