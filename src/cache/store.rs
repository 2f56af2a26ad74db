//! Cache store implementations
//!
//! Each store keeps opaque response bytes keyed by URL.

use super::types::{CacheStore, CachedResponse};
use crate::error::{Error, Result, ResultExt};
use crate::types::StringMap;
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;
use tracing::{debug, warn};

// ============================================================================
// Memory Cache
// ============================================================================

/// In-process cache, lost when the process exits
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: RwLock<HashMap<String, CachedResponse>>,
}

impl MemoryCache {
    /// Create an empty memory cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of cached entries
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Check if the cache is empty
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    /// Drop every entry
    pub async fn clear(&self) {
        self.entries.write().await.clear();
    }
}

#[async_trait]
impl CacheStore for MemoryCache {
    async fn get(&self, key: &str) -> Result<Option<CachedResponse>> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn put(&self, key: &str, value: &CachedResponse) -> Result<()> {
        self.entries
            .write()
            .await
            .insert(key.to_string(), value.clone());
        Ok(())
    }
}

// ============================================================================
// File Cache
// ============================================================================

/// On-disk representation of a cached response
#[derive(Debug, Serialize, Deserialize)]
struct CacheEntry {
    url: String,
    base_uri: String,
    status_code: u16,
    #[serde(default)]
    headers: StringMap,
    /// Base64-encoded body
    body: String,
    fetched_at: DateTime<Utc>,
}

impl CacheEntry {
    fn from_response(url: &str, response: &CachedResponse) -> Self {
        Self {
            url: url.to_string(),
            base_uri: response.base_uri().to_string(),
            status_code: response.status_code(),
            headers: response.headers().clone(),
            body: STANDARD.encode(response.body()),
            fetched_at: Utc::now(),
        }
    }

    fn into_response(self) -> Result<CachedResponse> {
        let body = STANDARD
            .decode(self.body.as_bytes())
            .map_err(|e| Error::cache(format!("Invalid body encoding for {}: {e}", self.url)))?;
        Ok(CachedResponse::new(
            body,
            self.base_uri,
            self.headers,
            self.status_code,
        ))
    }
}

/// Directory-backed cache: one JSON file per URL
///
/// File names are the hex SHA-256 of the key, so arbitrary URLs map to
/// safe, fixed-length names. Writes go through a temp file and a rename.
#[derive(Debug, Clone)]
pub struct FileCache {
    dir: PathBuf,
}

impl FileCache {
    /// Create a file cache rooted at `dir` (created on first write)
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    /// Cache directory
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the entry file for a key
    pub fn path_for(&self, key: &str) -> PathBuf {
        let digest = Sha256::digest(key.as_bytes());
        self.dir.join(format!("{digest:x}.json"))
    }

    /// Number of entries on disk
    pub async fn len(&self) -> Result<usize> {
        Ok(self.entry_paths().await?.len())
    }

    /// Check if the cache holds no entries
    pub async fn is_empty(&self) -> Result<bool> {
        Ok(self.len().await? == 0)
    }

    /// Remove every entry, returning how many were removed
    pub async fn clear(&self) -> Result<usize> {
        let paths = self.entry_paths().await?;
        for path in &paths {
            tokio::fs::remove_file(path).await.map_err(|e| {
                Error::cache(format!("Failed to remove {}: {e}", path.display()))
            })?;
        }
        Ok(paths.len())
    }

    async fn entry_paths(&self) -> Result<Vec<PathBuf>> {
        if !self.dir.exists() {
            return Ok(Vec::new());
        }

        let mut paths = Vec::new();
        let mut entries = tokio::fs::read_dir(&self.dir)
            .await
            .with_context(|| format!("Failed to list cache dir {}", self.dir.display()))?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                paths.push(path);
            }
        }
        Ok(paths)
    }
}

#[async_trait]
impl CacheStore for FileCache {
    async fn get(&self, key: &str) -> Result<Option<CachedResponse>> {
        let path = self.path_for(key);
        if !path.exists() {
            return Ok(None);
        }

        let contents = tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| Error::cache(format!("Failed to read {}: {e}", path.display())))?;

        // A corrupt entry is a miss; the next live fetch overwrites it
        let entry: CacheEntry = match serde_json::from_str(&contents) {
            Ok(entry) => entry,
            Err(e) => {
                warn!(url = key, path = %path.display(), "Ignoring unreadable cache entry: {e}");
                return Ok(None);
            }
        };

        debug!(url = key, fetched_at = %entry.fetched_at, "Loaded cache entry");
        entry.into_response().map(Some)
    }

    async fn put(&self, key: &str, value: &CachedResponse) -> Result<()> {
        tokio::fs::create_dir_all(&self.dir).await.map_err(|e| {
            Error::cache(format!(
                "Failed to create cache dir {}: {e}",
                self.dir.display()
            ))
        })?;

        let entry = CacheEntry::from_response(key, value);
        let contents = serde_json::to_string(&entry)?;

        let path = self.path_for(key);
        let temp_path = path.with_extension("tmp");
        tokio::fs::write(&temp_path, &contents)
            .await
            .map_err(|e| Error::cache(format!("Failed to write cache entry: {e}")))?;
        tokio::fs::rename(&temp_path, &path)
            .await
            .map_err(|e| Error::cache(format!("Failed to rename cache entry: {e}")))?;

        Ok(())
    }
}

// ============================================================================
// No Cache
// ============================================================================

/// Cache that never hits and discards writes
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCache;

#[async_trait]
impl CacheStore for NoCache {
    async fn get(&self, _key: &str) -> Result<Option<CachedResponse>> {
        Ok(None)
    }

    async fn put(&self, _key: &str, _value: &CachedResponse) -> Result<()> {
        Ok(())
    }
}
