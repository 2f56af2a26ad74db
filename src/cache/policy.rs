//! Cache mode policy
//!
//! Decides whether a request consults (and populates) the cache.

use crate::error::Result;
use crate::types::{CacheMode, RequestKind};
use once_cell::sync::OnceCell;
use tracing::debug;

/// Decide whether a request should use the cache
///
/// In `Prod`, paginated sweeps always go through the cache, even when the
/// caller opts out. Everything else honors the caller's preference.
pub fn should_use_cache(mode: CacheMode, request_wants_cache: bool, kind: RequestKind) -> bool {
    match (mode, request_wants_cache, kind) {
        (_, true, _) => true,
        (CacheMode::Dev, false, _) => false,
        (CacheMode::Prod, false, RequestKind::NonPaged) => false,
        (CacheMode::Prod, false, RequestKind::Paged) => true,
    }
}

/// Cache policy bound to a configured mode string
///
/// The mode is parsed on first use and kept for the lifetime of the policy.
#[derive(Debug)]
pub struct CachePolicy {
    configured: String,
    mode: OnceCell<CacheMode>,
}

impl CachePolicy {
    /// Create a policy from the configured mode string (`"dev"` or `"prod"`)
    pub fn new(configured: impl Into<String>) -> Self {
        Self {
            configured: configured.into(),
            mode: OnceCell::new(),
        }
    }

    /// Create a policy with an already-known mode
    pub fn with_mode(mode: CacheMode) -> Self {
        Self {
            configured: mode.to_string(),
            mode: OnceCell::with_value(mode),
        }
    }

    /// Resolve the cache mode, failing with a config error if unrecognized
    pub fn mode(&self) -> Result<CacheMode> {
        self.mode
            .get_or_try_init(|| {
                let mode = self.configured.parse::<CacheMode>()?;
                debug!(%mode, "Resolved cache mode");
                Ok(mode)
            })
            .copied()
    }

    /// Decide cache usage for a request under the resolved mode
    pub fn should_use_cache(&self, request_wants_cache: bool, kind: RequestKind) -> Result<bool> {
        Ok(should_use_cache(self.mode()?, request_wants_cache, kind))
    }
}
