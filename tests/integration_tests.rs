//! Integration tests using mock HTTP server
//!
//! Tests the full end-to-end flow: config → Fetcher → rate-limited HTTP → decoded JSON

use async_trait::async_trait;
use bytes::Bytes;
use pagefetch::cache::{CachePolicy, MemoryCache, NoCache};
use pagefetch::http::{Fetch, HttpClient, RateLimiterConfig, RawResponse};
use pagefetch::{parse_links, CacheMode, Error, Fetcher, FetcherConfig, Result};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn memory_fetcher(mode: CacheMode) -> Fetcher {
    let config = FetcherConfig::default();
    let client = HttpClient::new(&config.http_client_config().unwrap())
        .unwrap()
        .with_cache(Arc::new(MemoryCache::new()));
    Fetcher::from_parts(client, CachePolicy::with_mode(mode))
}

async fn mount_repos_page(server: &MockServer, page: &str, body: Value, link: Option<String>) {
    let mut template = ResponseTemplate::new(200).set_body_json(body);
    if let Some(link) = link {
        template = template.insert_header("Link", link.as_str());
    }
    Mock::given(method("GET"))
        .and(path("/orgs/acme/repos"))
        .and(query_param("page", page))
        .respond_with(template)
        .mount(server)
        .await;
}

// ============================================================================
// Single Requests
// ============================================================================

#[tokio::test]
async fn test_request_sends_configured_headers() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/users/octocat"))
        .and(header("Authorization", "token ghp_integration"))
        .and(header("Accept", "application/vnd.github+json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "login": "octocat",
            "public_repos": 8
        })))
        .expect(1)
        .mount(&server)
        .await;

    let config = FetcherConfig::from_yaml(
        r#"
cache_mode: dev
reqrate: 10
http:
  token: ghp_integration
  headers:
    Accept: application/vnd.github+json
"#,
    )
    .unwrap();
    let fetcher = Fetcher::new(&config).unwrap();

    let user = fetcher
        .request(&format!("{}/users/octocat", server.uri()), false)
        .await
        .unwrap();
    assert_eq!(user["login"], "octocat");
    assert_eq!(user["public_repos"], 8);
}

#[tokio::test]
async fn test_request_404_is_empty() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/users/nobody"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"message": "Not Found"})))
        .mount(&server)
        .await;

    let fetcher = memory_fetcher(CacheMode::Dev);
    let value = fetcher
        .request(&format!("{}/users/nobody", server.uri()), true)
        .await
        .unwrap();
    assert_eq!(value, json!([]));
}

#[tokio::test]
async fn test_request_500_propagates() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/users/octocat"))
        .respond_with(ResponseTemplate::new(500).set_body_string("Internal Server Error"))
        .mount(&server)
        .await;

    let fetcher = memory_fetcher(CacheMode::Dev);
    let err = fetcher
        .request(&format!("{}/users/octocat", server.uri()), false)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::HttpStatus { status: 500, .. }));
}

#[tokio::test]
async fn test_request_invalid_json_is_decode_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/garbled"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{not json"))
        .mount(&server)
        .await;

    let fetcher = memory_fetcher(CacheMode::Dev);
    let err = fetcher
        .request(&format!("{}/garbled", server.uri()), false)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Decode { .. }));
}

// ============================================================================
// Paginated Requests
// ============================================================================

#[tokio::test]
async fn test_two_pages_next_equals_last() {
    let server = MockServer::start().await;
    let base = format!("{}/orgs/acme/repos", server.uri());
    let page2 = format!("{base}?page=2");

    mount_repos_page(
        &server,
        "1",
        json!([{"name": "alpha"}, {"name": "beta"}]),
        Some(format!(r#"<{page2}>; rel="next", <{page2}>; rel="last""#)),
    )
    .await;
    mount_repos_page(
        &server,
        "2",
        json!([{"name": "beta"}, {"name": "gamma"}]),
        Some(format!(r#"<{base}?page=1>; rel="first", <{base}?page=1>; rel="prev""#)),
    )
    .await;

    let fetcher = memory_fetcher(CacheMode::Dev);
    let repos = fetcher
        .request_paged(&format!("{base}?page=1"), -1_i64, true)
        .await
        .unwrap();

    assert_eq!(
        repos,
        vec![json!({"name": "alpha"}), json!({"name": "beta"}), json!({"name": "gamma"})]
    );
    let stats = fetcher.stats();
    assert_eq!(stats.live_calls, 2);
    assert_eq!(stats.cache_hits, 0);

    // Page 1 comes from the cache now; page 2 is always fetched live
    let again = fetcher
        .request_paged(&format!("{base}?page=1"), -1_i64, true)
        .await
        .unwrap();
    assert_eq!(again, repos);
    let stats = fetcher.stats();
    assert_eq!(stats.live_calls, 3);
    assert_eq!(stats.cache_hits, 1);
}

#[tokio::test]
async fn test_bounded_paging_returns_nth_page() {
    let server = MockServer::start().await;
    let base = format!("{}/orgs/acme/repos", server.uri());

    for (page, body) in [("1", json!([1, 2])), ("2", json!([3, 4])), ("3", json!([5]))] {
        let n: u32 = page.parse().unwrap();
        let link = if n < 3 {
            format!(r#"<{base}?page={}>; rel="next", <{base}?page=3>; rel="last""#, n + 1)
        } else {
            format!(r#"<{base}?page=1>; rel="first""#)
        };
        mount_repos_page(&server, page, body, Some(link)).await;
    }

    let fetcher = memory_fetcher(CacheMode::Dev);
    let url = format!("{base}?page=1");

    assert_eq!(fetcher.request_paged(&url, 1_i64, false).await.unwrap(), vec![json!(1), json!(2)]);
    assert_eq!(fetcher.request_paged(&url, 2_i64, false).await.unwrap(), vec![json!(3), json!(4)]);
    assert_eq!(fetcher.request_paged(&url, 3_i64, false).await.unwrap(), vec![json!(5)]);
    assert_eq!(
        fetcher.request_paged(&url, -1_i64, false).await.unwrap(),
        vec![json!(1), json!(2), json!(3), json!(4), json!(5)]
    );
    // 1 + 2 + 3 + 3 pages
    assert_eq!(fetcher.stats().live_calls, 9);
}

#[tokio::test]
async fn test_walk_exposes_parsed_links() {
    let server = MockServer::start().await;
    let base = format!("{}/orgs/acme/repos", server.uri());
    let header = format!(r#"<{base}?page=2>; rel="next", <{base}?page=5>; rel="last""#);

    mount_repos_page(&server, "1", json!([]), Some(header.clone())).await;

    let fetcher = memory_fetcher(CacheMode::Dev);
    let mut walker = fetcher.walk(&format!("{base}?page=1"), 1_i64, false);
    let page = walker.next_page().await.unwrap().unwrap();

    assert_eq!(page.links, parse_links(&header));
    assert_eq!(page.links["last"], format!("{base}?page=5"));
    assert_eq!(walker.pages_fetched(), 1);
    assert!(walker.is_done());
}

#[tokio::test]
async fn test_prod_paged_sweep_reuses_cache_across_runs() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let base = format!("{}/orgs/acme/repos", server.uri());

    Mock::given(method("GET"))
        .and(path("/orgs/acme/repos"))
        .and(query_param("page", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": 1}])).insert_header(
            "Link",
            format!(r#"<{base}?page=2>; rel="next", <{base}?page=3>; rel="last""#).as_str(),
        ))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/orgs/acme/repos"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": 2}])))
        .expect(1)
        .mount(&server)
        .await;

    let config = FetcherConfig::builder()
        .cache_mode("prod")
        .cache_dir(dir.path())
        .build();

    for _ in 0..2 {
        let fetcher = Fetcher::new(&config).unwrap();
        let items = fetcher
            .request_paged(&format!("{base}?page=1"), -1_i64, false)
            .await
            .unwrap();
        assert_eq!(items, vec![json!({"id": 1}), json!({"id": 2})]);
    }
}

// ============================================================================
// Rate Window
// ============================================================================

/// Fetch primitive that records when each call was issued
#[derive(Default)]
struct RecordingFetch {
    calls: Mutex<Vec<Instant>>,
}

#[async_trait]
impl Fetch for RecordingFetch {
    async fn fetch(&self, url: &str) -> Result<RawResponse> {
        self.calls
            .lock()
            .map_err(|e| Error::Other(e.to_string()))?
            .push(Instant::now());
        Ok(RawResponse {
            url: url.to_string(),
            status: 200,
            headers: Default::default(),
            body: Bytes::from_static(b"[]"),
        })
    }
}

#[tokio::test(start_paused = true)]
async fn test_no_rolling_window_exceeds_budget() {
    let budget = 3;
    let recorder = Arc::new(RecordingFetch::default());
    let client = HttpClient::with_parts(
        recorder.clone(),
        Arc::new(NoCache),
        &RateLimiterConfig::new(budget),
    );

    for i in 0..10 {
        client
            .fetch_raw(&format!("https://api.test/items/{i}"), false)
            .await
            .unwrap();
        tokio::time::advance(Duration::from_secs(7)).await;
    }

    let calls = recorder.calls.lock().unwrap().clone();
    assert_eq!(calls.len(), 10);
    for pair in calls.windows(budget as usize + 1) {
        let span = pair[budget as usize] - pair[0];
        assert!(
            span >= Duration::from_secs(60),
            "{} calls within {span:?}",
            budget + 1
        );
    }
}

#[tokio::test(start_paused = true)]
async fn test_cache_hits_do_not_consume_budget() {
    let recorder = Arc::new(RecordingFetch::default());
    let client = HttpClient::with_parts(
        recorder.clone(),
        Arc::new(MemoryCache::new()),
        &RateLimiterConfig::new(1),
    );
    let start = Instant::now();

    for _ in 0..5 {
        client.fetch_raw("https://api.test/same", true).await.unwrap();
    }

    assert_eq!(recorder.calls.lock().unwrap().len(), 1);
    assert_eq!(client.stats().cache_hits, 4);
    // No sleep was needed
    assert!(start.elapsed() < Duration::from_secs(1));
}
