//! Response cache module
//!
//! Supports: in-memory, on-disk (one JSON file per URL), and disabled caches
//!
//! # Overview
//!
//! The cache module stores opaque [`CachedResponse`] values keyed by URL and
//! decides, through [`CachePolicy`], whether a given request may consult it.
//! Responses are identical whether they came from the network or the cache.

mod policy;
mod store;
mod types;

pub use policy::{should_use_cache, CachePolicy};
pub use store::{FileCache, MemoryCache, NoCache};
pub use types::{CacheStore, CachedResponse};
