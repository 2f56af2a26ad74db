//! Network fetch primitive
//!
//! A single GET, with no caching, rate limiting or status interpretation.
//! Any HTTP status comes back as a [`RawResponse`]; only connection-level
//! problems are errors.

use super::client::HttpClientConfig;
use crate::cache::CachedResponse;
use crate::error::{Error, Result};
use crate::types::StringMap;
use async_trait::async_trait;
use bytes::Bytes;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION};
use reqwest::Client;
use std::net::IpAddr;
use std::time::Duration;
use tracing::debug;
use url::Url;

/// Response as returned by the network, before classification
#[derive(Debug, Clone)]
pub struct RawResponse {
    /// Final URL (after redirects)
    pub url: String,
    /// HTTP status code
    pub status: u16,
    /// Response headers; repeated headers are joined with ", "
    pub headers: StringMap,
    /// Response body
    pub body: Bytes,
}

impl RawResponse {
    /// Check for a 2xx status
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

impl From<RawResponse> for CachedResponse {
    fn from(raw: RawResponse) -> Self {
        CachedResponse::new(raw.body, raw.url, raw.headers, raw.status)
    }
}

/// Byte-level HTTP GET
#[async_trait]
pub trait Fetch: Send + Sync {
    /// Fetch a URL
    async fn fetch(&self, url: &str) -> Result<RawResponse>;
}

/// [`Fetch`] backed by a reqwest client
///
/// When a local address is configured, every connection the client opens
/// originates from it. The binding is fixed when the client is built.
#[derive(Debug, Clone)]
pub struct ReqwestFetch {
    client: Client,
    timeout: Duration,
    local_address: Option<IpAddr>,
}

impl ReqwestFetch {
    /// Build a fetcher from HTTP client configuration
    pub fn new(config: &HttpClientConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        for (key, value) in &config.default_headers {
            let name = HeaderName::from_bytes(key.as_bytes())
                .map_err(|e| Error::invalid_value("http.headers", format!("{key}: {e}")))?;
            let value = HeaderValue::from_str(value)
                .map_err(|e| Error::invalid_value("http.headers", format!("{key}: {e}")))?;
            headers.insert(name, value);
        }

        if let Some(token) = &config.token {
            let mut value = HeaderValue::from_str(&format!("token {token}"))
                .map_err(|e| Error::invalid_value("http.token", e.to_string()))?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }

        let mut builder = Client::builder()
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .default_headers(headers);

        if let Some(addr) = config.local_address {
            debug!(%addr, "Binding outbound connections");
            builder = builder.local_address(addr);
        }

        Ok(Self {
            client: builder.build()?,
            timeout: config.timeout,
            local_address: config.local_address,
        })
    }

    /// Local address outbound connections are bound to, if any
    pub fn local_address(&self) -> Option<IpAddr> {
        self.local_address
    }

    fn classify(&self, err: reqwest::Error) -> Error {
        if err.is_timeout() {
            Error::Timeout {
                timeout_ms: self.timeout.as_millis() as u64,
            }
        } else {
            Error::Http(err)
        }
    }
}

#[async_trait]
impl Fetch for ReqwestFetch {
    async fn fetch(&self, url: &str) -> Result<RawResponse> {
        let url = Url::parse(url)?;

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        let status = response.status().as_u16();
        let final_url = response.url().to_string();
        let headers = header_map_to_strings(response.headers());
        let body = response.bytes().await.map_err(|e| self.classify(e))?;

        Ok(RawResponse {
            url: final_url,
            status,
            headers,
            body,
        })
    }
}

/// Flatten a header map into lowercase name → value strings
fn header_map_to_strings(headers: &HeaderMap) -> StringMap {
    let mut out = StringMap::new();
    for (name, value) in headers {
        let Ok(value) = value.to_str() else {
            continue;
        };
        out.entry(name.as_str().to_string())
            .and_modify(|existing: &mut String| {
                existing.push_str(", ");
                existing.push_str(value);
            })
            .or_insert_with(|| value.to_string());
    }
    out
}
