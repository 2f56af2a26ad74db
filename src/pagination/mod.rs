//! Pagination module
//!
//! Follows `Link` header pagination (RFC 8288 style, as used by GitHub).
//!
//! # Overview
//!
//! [`parse_links`] turns a `Link` header into a rel → URL map, and
//! [`PageWalker`] fetches pages one at a time by following `next` links,
//! bounded by an optional [`PageLimit`](crate::types::PageLimit).

mod link;
mod walker;

pub use link::{parse_links, LinkMap};
pub use walker::{merge_unique, Page, PageWalker};
