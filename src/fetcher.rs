//! Request entry points
//!
//! [`Fetcher`] ties the transport, the cache policy and the decoder
//! together. It exposes single-shot requests and paginated walks.

use crate::cache::{CachePolicy, CacheStore, FileCache, MemoryCache};
use crate::config::FetcherConfig;
use crate::decode::JsonDecoder;
use crate::error::Result;
use crate::http::{FetchStatsSnapshot, HttpClient};
use crate::pagination::PageWalker;
use crate::types::{CacheMode, PageLimit, RequestKind};
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

/// Rate-limited, cache-aware, paginating fetcher
#[derive(Debug)]
pub struct Fetcher {
    client: HttpClient,
    policy: CachePolicy,
    decoder: JsonDecoder,
}

impl Fetcher {
    /// Build a fetcher from configuration
    ///
    /// Uses a file cache when `cache_dir` is set, an in-memory cache otherwise.
    pub fn new(config: &FetcherConfig) -> Result<Self> {
        config.validate()?;

        let cache: Arc<dyn CacheStore> = match &config.cache_dir {
            Some(dir) => Arc::new(FileCache::new(dir)),
            None => Arc::new(MemoryCache::new()),
        };
        let client = HttpClient::new(&config.http_client_config()?)?.with_cache(cache);

        debug!(
            cache_mode = %config.cache_mode,
            reqrate = config.reqrate,
            cache_dir = ?config.cache_dir,
            "Fetcher created"
        );

        Ok(Self::from_parts(
            client,
            CachePolicy::new(config.cache_mode.clone()),
        ))
    }

    /// Build a fetcher from an existing client and policy
    pub fn from_parts(client: HttpClient, policy: CachePolicy) -> Self {
        Self {
            client,
            policy,
            decoder: JsonDecoder::new(),
        }
    }

    /// Fetch a single, non-paginated resource
    ///
    /// A soft failure (400/401/403/404/422) yields an empty JSON array.
    pub async fn request(&self, url: &str, cache: bool) -> Result<Value> {
        let use_cache = self
            .policy
            .should_use_cache(cache, RequestKind::NonPaged)?;
        let outcome = self.client.fetch_raw(url, use_cache).await?;
        self.decoder.decode(outcome.response())
    }

    /// Fetch a paginated resource
    ///
    /// Unbounded walks return the union of all pages; a page bound of `n`
    /// returns the items of page `n`.
    pub async fn request_paged(
        &self,
        url: &str,
        pages: impl Into<PageLimit>,
        cache: bool,
    ) -> Result<Vec<Value>> {
        self.walk(url, pages, cache).collect().await
    }

    /// Start a lazy page-by-page walk
    pub fn walk(&self, url: &str, pages: impl Into<PageLimit>, cache: bool) -> PageWalker<'_> {
        PageWalker::new(&self.client, &self.policy, url, pages.into(), cache)
    }

    /// Resolved cache mode
    pub fn cache_mode(&self) -> Result<CacheMode> {
        self.policy.mode()
    }

    /// Call counters
    pub fn stats(&self) -> FetchStatsSnapshot {
        self.client.stats()
    }

    /// Underlying transport
    pub fn client(&self) -> &HttpClient {
        &self.client
    }
}
