//! Cache types and traits
//!
//! Defines the cached response value and the store abstraction.

use crate::error::{Error, Result};
use crate::types::StringMap;
use async_trait::async_trait;
use bytes::Bytes;

/// A fetched response, as stored in and served from the cache
///
/// Built once per live fetch or reconstructed from a store, and never
/// mutated afterwards. Header names are kept lowercase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedResponse {
    body: Bytes,
    base_uri: String,
    headers: StringMap,
    status_code: u16,
}

impl CachedResponse {
    /// Create a new cached response
    pub fn new(
        body: impl Into<Bytes>,
        base_uri: impl Into<String>,
        headers: StringMap,
        status_code: u16,
    ) -> Self {
        let headers = headers
            .into_iter()
            .map(|(k, v)| (k.to_ascii_lowercase(), v))
            .collect();

        Self {
            body: body.into(),
            base_uri: base_uri.into(),
            headers,
            status_code,
        }
    }

    /// Raw body bytes
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Body as UTF-8 text
    pub fn text(&self) -> Result<&str> {
        std::str::from_utf8(&self.body)
            .map_err(|e| Error::decode(format!("Response body is not UTF-8: {e}")))
    }

    /// Whether the body is absent or whitespace only
    pub fn is_empty(&self) -> bool {
        self.body.iter().all(u8::is_ascii_whitespace)
    }

    /// URL the response was served for
    pub fn base_uri(&self) -> &str {
        &self.base_uri
    }

    /// All response headers (lowercase names)
    pub fn headers(&self) -> &StringMap {
        &self.headers
    }

    /// Look up a header by name, case-insensitively
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// The pagination (`Link`) header, if any
    pub fn link_header(&self) -> Option<&str> {
        self.header("link")
    }

    /// HTTP status code
    pub fn status_code(&self) -> u16 {
        self.status_code
    }
}

/// Key-value store for cached responses, keyed by URL
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Look up a response; `None` is a miss
    async fn get(&self, key: &str) -> Result<Option<CachedResponse>>;

    /// Store a response under a key, replacing any previous entry
    async fn put(&self, key: &str, value: &CachedResponse) -> Result<()>;
}
