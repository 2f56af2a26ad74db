//! Common types used throughout pagefetch
//!
//! This module contains shared type definitions, type aliases,
//! and small enums used across multiple modules.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::num::NonZeroU32;
use std::str::FromStr;

// ============================================================================
// Type Aliases
// ============================================================================

/// Generic key-value map with string keys and values
pub type StringMap = HashMap<String, String>;

// ============================================================================
// Cache Mode
// ============================================================================

/// Operating mode controlling the default cache usage policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheMode {
    /// Honor the caller's cache preference everywhere
    Dev,
    /// Force paginated sweeps through the cache
    Prod,
}

impl FromStr for CacheMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "dev" => Ok(Self::Dev),
            "prod" => Ok(Self::Prod),
            other => Err(Error::config(format!(
                "unknown cache mode '{other}' (expected 'dev' or 'prod')"
            ))),
        }
    }
}

impl fmt::Display for CacheMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Dev => f.write_str("dev"),
            Self::Prod => f.write_str("prod"),
        }
    }
}

// ============================================================================
// Request Kind
// ============================================================================

/// Whether a call site walks pagination or fetches a single resource
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    /// Part of a multi-page walk
    Paged,
    /// Single-shot lookup
    NonPaged,
}

// ============================================================================
// Page Limit
// ============================================================================

/// Upper bound on the number of pages a walk visits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PageLimit {
    /// Follow `next` links until they run out
    #[default]
    Unbounded,
    /// Stop after this many pages
    Pages(NonZeroU32),
}

impl PageLimit {
    /// Create a bounded limit; zero means unbounded
    pub fn pages(n: u32) -> Self {
        NonZeroU32::new(n).map_or(Self::Unbounded, Self::Pages)
    }

    /// Check if the walk is bounded
    pub fn is_bounded(&self) -> bool {
        matches!(self, Self::Pages(_))
    }
}

/// Integer form: `-1` (or anything not positive) is unbounded.
impl From<i64> for PageLimit {
    fn from(n: i64) -> Self {
        u32::try_from(n).map_or(Self::Unbounded, Self::pages)
    }
}

/// Untyped integer literals (`-1`, `3`) default to `i32`.
impl From<i32> for PageLimit {
    fn from(n: i32) -> Self {
        Self::from(i64::from(n))
    }
}

impl From<Option<u32>> for PageLimit {
    fn from(n: Option<u32>) -> Self {
        n.map_or(Self::Unbounded, Self::pages)
    }
}

// ============================================================================
// Utilities
// ============================================================================

/// Extension trait for Option<String> to handle empty strings
pub trait OptionStringExt {
    /// Returns None if the string is empty
    fn none_if_empty(self) -> Option<String>;
}

impl OptionStringExt for Option<String> {
    fn none_if_empty(self) -> Option<String> {
        self.filter(|s| !s.is_empty())
    }
}

impl OptionStringExt for String {
    fn none_if_empty(self) -> Option<String> {
        if self.is_empty() {
            None
        } else {
            Some(self)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_mode_parse() {
        assert_eq!("dev".parse::<CacheMode>().unwrap(), CacheMode::Dev);
        assert_eq!("prod".parse::<CacheMode>().unwrap(), CacheMode::Prod);

        let err = "production".parse::<CacheMode>().unwrap_err();
        assert!(err.is_config());
        assert!(err.to_string().contains("production"));

        // Case-sensitive
        assert!("Dev".parse::<CacheMode>().is_err());
    }

    #[test]
    fn test_cache_mode_serde() {
        let mode: CacheMode = serde_json::from_str("\"prod\"").unwrap();
        assert_eq!(mode, CacheMode::Prod);
        assert_eq!(serde_json::to_string(&CacheMode::Dev).unwrap(), "\"dev\"");
        assert_eq!(CacheMode::Prod.to_string(), "prod");
    }

    #[test]
    fn test_page_limit_from_int() {
        assert_eq!(PageLimit::from(-1_i64), PageLimit::Unbounded);
        assert_eq!(PageLimit::from(0_i64), PageLimit::Unbounded);
        assert_eq!(PageLimit::from(-42_i64), PageLimit::Unbounded);
        assert_eq!(PageLimit::from(3_i64), PageLimit::pages(3));
        assert!(PageLimit::from(1_i64).is_bounded());
        assert!(!PageLimit::default().is_bounded());
        assert_eq!(PageLimit::from(None::<u32>), PageLimit::Unbounded);
        assert_eq!(PageLimit::from(Some(2_u32)), PageLimit::pages(2));
        assert_eq!(PageLimit::from(i64::MAX), PageLimit::Unbounded);
    }

    #[test]
    fn test_page_limit_from_untyped_literal() {
        assert_eq!(PageLimit::from(-1), PageLimit::Unbounded);
        assert_eq!(PageLimit::from(0), PageLimit::Unbounded);
        assert_eq!(PageLimit::from(4), PageLimit::pages(4));
        assert_eq!(PageLimit::from(i32::MIN), PageLimit::Unbounded);
    }

    #[test]
    fn test_option_string_none_if_empty() {
        assert_eq!(
            Some("test".to_string()).none_if_empty(),
            Some("test".to_string())
        );
        assert_eq!(Some(String::new()).none_if_empty(), None);
        assert_eq!(None::<String>.none_if_empty(), None);
        assert_eq!(String::new().none_if_empty(), None);
    }
}
