//! Link header parsing
//!
//! Format: `Link: <https://api.github.com/...?page=2>; rel="next", <...>; rel="last"`

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;
use tracing::warn;

/// Mapping from relation name (`next`, `last`, `prev`, `first`) to URL
pub type LinkMap = HashMap<String, String>;

/// Exact shape of one segment: `<URL>; rel="NAME"`
static LINK_SEGMENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"^\s*<([^>]*)>\s*;\s*rel="([^"]*)"\s*$"#).unwrap());

/// Parse a pagination header into a rel → URL map
///
/// Segments that do not match `<URL>; rel="NAME"` are skipped (and logged);
/// the rest of the header still parses. A repeated rel keeps the last URL.
pub fn parse_links(header: &str) -> LinkMap {
    let mut links = LinkMap::new();

    for segment in segments(header) {
        if segment.trim().is_empty() {
            continue;
        }

        match LINK_SEGMENT.captures(segment) {
            Some(caps) => {
                links.insert(caps[2].to_string(), caps[1].to_string());
            }
            None => warn!(segment = segment.trim(), "Skipping malformed link segment"),
        }
    }

    links
}

/// Split a header on the commas that separate link values
///
/// Commas inside `<...>` belong to the URL.
fn segments(header: &str) -> impl Iterator<Item = &str> {
    let mut depth = 0u32;
    header.split(move |c: char| {
        match c {
            '<' => depth += 1,
            '>' => depth = depth.saturating_sub(1),
            ',' => return depth == 0,
            _ => {}
        }
        false
    })
}
