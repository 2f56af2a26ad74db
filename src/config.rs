//! Fetcher configuration
//!
//! Loaded from YAML, then overridden by environment variables and finally
//! by CLI flags. Missing fields take their defaults.

use crate::error::{Error, Result};
use crate::http::{HttpClientConfig, RateLimiterConfig};
use crate::types::{OptionStringExt, StringMap};
use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable overriding `cache_mode`
pub const ENV_CACHE_MODE: &str = "PAGEFETCH_CACHE_MODE";
/// Environment variable overriding `reqrate`
pub const ENV_REQRATE: &str = "PAGEFETCH_REQRATE";
/// Environment variable overriding `attach_ip`
pub const ENV_ATTACH_IP: &str = "PAGEFETCH_ATTACH_IP";
/// Environment variable overriding `cache_dir`
pub const ENV_CACHE_DIR: &str = "PAGEFETCH_CACHE_DIR";
/// Environment variable overriding `http.token`
pub const ENV_TOKEN: &str = "PAGEFETCH_TOKEN";

// ============================================================================
// Fetcher Config
// ============================================================================

/// Complete fetcher configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FetcherConfig {
    /// Cache mode string, `dev` or `prod`
    ///
    /// Kept as a string: an unknown mode is reported on first use, not here.
    #[serde(default = "default_cache_mode")]
    pub cache_mode: String,

    /// Live calls allowed per 60-second window
    #[serde(default = "default_reqrate")]
    pub reqrate: u32,

    /// Local source address; `0.0.0.0` leaves connections unbound
    #[serde(default = "default_attach_ip")]
    pub attach_ip: String,

    /// Directory for the file cache; in-memory cache when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_dir: Option<PathBuf>,

    /// HTTP client settings
    #[serde(default)]
    pub http: HttpSettings,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            cache_mode: default_cache_mode(),
            reqrate: default_reqrate(),
            attach_ip: default_attach_ip(),
            cache_dir: None,
            http: HttpSettings::default(),
        }
    }
}

fn default_cache_mode() -> String {
    "dev".to_string()
}

fn default_reqrate() -> u32 {
    60
}

fn default_attach_ip() -> String {
    "0.0.0.0".to_string()
}

/// HTTP client settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HttpSettings {
    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// User agent string
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// API token
    #[serde(default)]
    pub token: Option<String>,

    /// Headers sent with every request
    #[serde(default)]
    pub headers: StringMap,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            user_agent: default_user_agent(),
            token: None,
            headers: StringMap::new(),
        }
    }
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_user_agent() -> String {
    format!("pagefetch/{}", env!("CARGO_PKG_VERSION"))
}

impl FetcherConfig {
    /// Create a new config builder
    pub fn builder() -> FetcherConfigBuilder {
        FetcherConfigBuilder::default()
    }

    /// Parse a config from YAML
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Load a config from a YAML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::config(format!("Failed to read config {}: {e}", path.display()))
        })?;
        Self::from_yaml(&content)
    }

    /// Apply overrides from the process environment
    pub fn apply_env(&mut self) -> Result<()> {
        self.apply_env_from(|key| std::env::var(key).ok())
    }

    /// Apply overrides from a variable lookup; empty values count as unset
    pub fn apply_env_from<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |key: &str| lookup(key).none_if_empty();

        if let Some(mode) = lookup(ENV_CACHE_MODE) {
            self.cache_mode = mode;
        }
        if let Some(rate) = lookup(ENV_REQRATE) {
            self.reqrate = rate
                .trim()
                .parse()
                .map_err(|e| Error::invalid_value(ENV_REQRATE, format!("{rate:?}: {e}")))?;
        }
        if let Some(ip) = lookup(ENV_ATTACH_IP) {
            self.attach_ip = ip;
        }
        if let Some(dir) = lookup(ENV_CACHE_DIR) {
            self.cache_dir = Some(PathBuf::from(dir));
        }
        if let Some(token) = lookup(ENV_TOKEN) {
            self.http.token = Some(token);
        }
        Ok(())
    }

    /// Check values that can be checked without making a request
    pub fn validate(&self) -> Result<()> {
        if self.reqrate == 0 {
            return Err(Error::invalid_value("reqrate", "must be at least 1"));
        }
        if self.http.timeout_secs == 0 {
            return Err(Error::invalid_value("http.timeout_secs", "must be at least 1"));
        }
        self.parse_attach_ip()?;
        Ok(())
    }

    /// Parsed source address, `None` when connections stay unbound
    pub fn parse_attach_ip(&self) -> Result<Option<IpAddr>> {
        let ip: IpAddr = self
            .attach_ip
            .trim()
            .parse()
            .map_err(|e| Error::invalid_value("attach_ip", format!("{:?}: {e}", self.attach_ip)))?;
        Ok((!ip.is_unspecified()).then_some(ip))
    }

    /// Build the HTTP client configuration
    pub fn http_client_config(&self) -> Result<HttpClientConfig> {
        let mut builder = HttpClientConfig::builder()
            .timeout(Duration::from_secs(self.http.timeout_secs))
            .rate_limit(RateLimiterConfig::new(self.reqrate))
            .user_agent(self.http.user_agent.clone());

        for (key, value) in &self.http.headers {
            builder = builder.header(key.clone(), value.clone());
        }
        if let Some(token) = &self.http.token {
            builder = builder.token(token.clone());
        }
        if let Some(ip) = self.parse_attach_ip()? {
            builder = builder.local_address(ip);
        }

        Ok(builder.build())
    }

    /// Copy with the token masked, for display
    pub fn redacted(&self) -> Self {
        let mut config = self.clone();
        if config.http.token.is_some() {
            config.http.token = Some("***".to_string());
        }
        config
    }

    /// Render as YAML
    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }
}

/// Builder for fetcher config
#[derive(Default)]
pub struct FetcherConfigBuilder {
    config: FetcherConfig,
}

impl FetcherConfigBuilder {
    /// Set the cache mode
    pub fn cache_mode(mut self, mode: impl Into<String>) -> Self {
        self.config.cache_mode = mode.into();
        self
    }

    /// Set live calls per window
    pub fn reqrate(mut self, reqrate: u32) -> Self {
        self.config.reqrate = reqrate;
        self
    }

    /// Set the local source address
    pub fn attach_ip(mut self, ip: impl Into<String>) -> Self {
        self.config.attach_ip = ip.into();
        self
    }

    /// Use a file cache in `dir`
    pub fn cache_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.cache_dir = Some(dir.into());
        self
    }

    /// Set the request timeout in seconds
    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.config.http.timeout_secs = secs;
        self
    }

    /// Set the API token
    pub fn token(mut self, token: impl Into<String>) -> Self {
        self.config.http.token = Some(token.into());
        self
    }

    /// Add a default header
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.config.http.headers.insert(key.into(), value.into());
        self
    }

    /// Build the config
    pub fn build(self) -> FetcherConfig {
        self.config
    }
}
