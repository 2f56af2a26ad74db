// Allow common clippy pedantic lints that aren't critical for this codebase
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::ref_option)]
#![allow(clippy::unused_self)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::unnecessary_wraps)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::unused_async)]

//! # pagefetch
//!
//! A rate-limited, cache-aware, paginating fetcher for JSON HTTP APIs that
//! page through results with `Link` headers (GitHub-style).
//!
//! ## Features
//!
//! - **Rate Limiting**: Fixed 60-second window, sleeps out the window when the budget is spent
//! - **Caching**: In-memory or on-disk response cache with a `dev`/`prod` usage policy
//! - **Pagination**: Follows `rel="next"` links, bounded or to the end
//! - **Failure Classification**: 400/401/403/404/422 become empty data, everything else is an error
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use pagefetch::{Fetcher, FetcherConfig, Result};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let config = FetcherConfig::builder()
//!         .cache_mode("prod")
//!         .reqrate(30)
//!         .build();
//!     let fetcher = Fetcher::new(&config)?;
//!
//!     // One resource; a 404 comes back as []
//!     let user = fetcher.request("https://api.github.com/users/octocat", true).await?;
//!
//!     // Every page, merged
//!     let repos = fetcher
//!         .request_paged("https://api.github.com/users/octocat/repos", 0, false)
//!         .await?;
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                          Fetcher                            │
//! │   request(url, cache)       request_paged(url, pages, cache)│
//! └─────────────────────────────────────────────────────────────┘
//!                               │
//! ┌─────────────┬───────────────┼───────────────┬───────────────┐
//! │ CachePolicy │  PageWalker   │  HttpClient   │  JsonDecoder  │
//! ├─────────────┼───────────────┼───────────────┼───────────────┤
//! │ dev / prod  │ Link header   │ Rate window   │ JSON or []    │
//! │ paged flag  │ page bound    │ Cache store   │               │
//! │             │ merge unique  │ Soft/hard     │               │
//! └─────────────┴───────────────┴───────────────┴───────────────┘
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]

// ============================================================================
// Module declarations
// ============================================================================

/// Error types
pub mod error;

/// Common types and type aliases
pub mod types;

/// Response caches and the cache usage policy
pub mod cache;

/// HTTP transport with rate limiting
pub mod http;

/// Response body decoding
pub mod decode;

/// Link header parsing and page walking
pub mod pagination;

/// Configuration loading
pub mod config;

/// Request entry points
pub mod fetcher;

/// Command-line interface
pub mod cli;

// ============================================================================
// Re-exports
// ============================================================================

pub use error::{Error, Result};
pub use types::*;

// Re-export commonly used types
pub use config::FetcherConfig;
pub use fetcher::Fetcher;
pub use pagination::{parse_links, PageWalker};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
