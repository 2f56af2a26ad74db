//! HTTP transport module
//!
//! Provides a cache-aware, rate-limited transport over a pluggable fetch
//! primitive.
//!
//! # Features
//!
//! - **Rate Limiting**: Per-window call budget with a rolling guard, sleeping when exhausted
//! - **Caching**: Optional response cache, consulted before any live call
//! - **Status Classification**: 400/401/403/404/422 are soft outcomes, the
//!   rest of the non-2xx range is a hard error
//! - **Source Binding**: Outbound connections from a configured local address

mod client;
mod fetch;
mod rate_limit;

pub use client::{
    FetchOutcome, FetchStats, FetchStatsSnapshot, HttpClient, HttpClientConfig,
    HttpClientConfigBuilder,
};
pub use fetch::{Fetch, RawResponse, ReqwestFetch};
pub use rate_limit::{RateLimiter, RateLimiterConfig, WindowPermit, DEFAULT_WINDOW};
