//! Page walker
//!
//! Fetches a paginated resource one page at a time, following `next` links
//! from the `Link` header until they run out or the page budget is spent.

use super::link::{parse_links, LinkMap};
use crate::cache::CachePolicy;
use crate::decode::{into_items, JsonDecoder};
use crate::error::Result;
use crate::http::{FetchOutcome, HttpClient};
use crate::types::{PageLimit, RequestKind};
use futures::stream::{self, Stream};
use serde_json::Value;
use std::collections::HashSet;
use tracing::debug;

/// One fetched page
#[derive(Debug, Clone)]
pub struct Page {
    /// URL the page was requested from
    pub url: String,
    /// Decoded body
    pub value: Value,
    /// Links parsed from the `Link` header (empty if there was none)
    pub links: LinkMap,
}

/// Lazy, page-at-a-time walk over a paginated resource
///
/// Iterative, so arbitrarily long resources do not grow the stack. Each
/// step decides cache usage through the [`CachePolicy`] with
/// [`RequestKind::Paged`]. When a page's `next` link equals its `last`
/// link, the final page is requested with `cache = false`.
pub struct PageWalker<'a> {
    client: &'a HttpClient,
    policy: &'a CachePolicy,
    decoder: JsonDecoder,
    limit: PageLimit,
    next_url: Option<String>,
    remaining: Option<u32>,
    cache: bool,
    pages_fetched: u32,
    client_outcome: Option<u16>,
}

impl<'a> PageWalker<'a> {
    /// Start a walk at `url`
    pub fn new(
        client: &'a HttpClient,
        policy: &'a CachePolicy,
        url: impl Into<String>,
        limit: PageLimit,
        cache: bool,
    ) -> Self {
        let remaining = match limit {
            PageLimit::Unbounded => None,
            PageLimit::Pages(n) => Some(n.get()),
        };

        Self {
            client,
            policy,
            decoder: JsonDecoder::new(),
            limit,
            next_url: Some(url.into()),
            remaining,
            cache,
            pages_fetched: 0,
            client_outcome: None,
        }
    }

    /// Fetch the next page, or `None` when the walk is over
    ///
    /// A soft failure (404 and friends) ends the walk; see
    /// [`client_outcome`](Self::client_outcome). Hard failures are errors.
    pub async fn next_page(&mut self) -> Result<Option<Page>> {
        let Some(url) = self.next_url.take() else {
            return Ok(None);
        };

        let use_cache = self.policy.should_use_cache(self.cache, RequestKind::Paged)?;
        let response = match self.client.fetch_raw(&url, use_cache).await? {
            FetchOutcome::Response(response) => response,
            FetchOutcome::ClientOutcome { status } => {
                self.client_outcome = Some(status);
                return Ok(None);
            }
        };

        let value = self.decoder.decode(Some(&response))?;
        self.pages_fetched += 1;

        let Some(header) = response.link_header() else {
            return Ok(Some(Page {
                url,
                value,
                links: LinkMap::new(),
            }));
        };
        let links = parse_links(header);

        if let Some(remaining) = self.remaining.as_mut() {
            *remaining -= 1;
            if *remaining == 0 {
                debug!(url, pages = self.pages_fetched, "Page budget spent");
                return Ok(Some(Page { url, value, links }));
            }
        }

        if let Some(next) = links.get("next") {
            if links.get("last") == Some(next) {
                self.cache = false;
            }
            self.next_url = Some(next.clone());
        }

        Ok(Some(Page { url, value, links }))
    }

    /// Pages fetched so far
    pub fn pages_fetched(&self) -> u32 {
        self.pages_fetched
    }

    /// Status of the soft failure that ended the walk, if any
    pub fn client_outcome(&self) -> Option<u16> {
        self.client_outcome
    }

    /// Check if there is nothing left to fetch
    pub fn is_done(&self) -> bool {
        self.next_url.is_none()
    }

    /// Turn the walk into a stream of pages
    pub fn into_stream(self) -> impl Stream<Item = Result<Page>> + 'a {
        stream::try_unfold(self, |mut walker| async move {
            let page = walker.next_page().await?;
            Ok(page.map(|page| (page, walker)))
        })
    }

    /// Run the walk to completion and combine the pages
    ///
    /// - A walk that stops at its first page returns that page's items.
    /// - An unbounded walk over several pages returns their union, in page
    ///   order, with exact duplicates removed.
    /// - A bounded walk returns only the items of the last page visited.
    ///
    /// A soft failure contributes an empty page.
    pub async fn collect(mut self) -> Result<Vec<Value>> {
        let mut pages: Vec<Vec<Value>> = Vec::new();
        while let Some(page) = self.next_page().await? {
            pages.push(into_items(page.value));
        }
        if self.client_outcome.is_some() {
            pages.push(Vec::new());
        }

        if pages.len() <= 1 {
            return Ok(pages.pop().unwrap_or_default());
        }

        if self.limit.is_bounded() {
            return Ok(pages.pop().unwrap_or_default());
        }

        Ok(merge_unique(pages))
    }
}

impl std::fmt::Debug for PageWalker<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PageWalker")
            .field("next_url", &self.next_url)
            .field("remaining", &self.remaining)
            .field("cache", &self.cache)
            .field("pages_fetched", &self.pages_fetched)
            .finish_non_exhaustive()
    }
}

/// Union of pages in order, dropping items structurally equal to an earlier one
pub fn merge_unique(pages: impl IntoIterator<Item = Vec<Value>>) -> Vec<Value> {
    let mut seen = HashSet::new();
    let mut merged = Vec::new();

    for item in pages.into_iter().flatten() {
        // serde_json's default map is ordered, so equal values serialize equally
        if seen.insert(item.to_string()) {
            merged.push(item);
        }
    }

    merged
}
