//! Integration tests against a mock HTTP server
//!
//! These tests use wiremock to exercise the real HTTP fetcher, retry
//! decorator, robots.txt handling and file-backed consumers.

use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use sumi_spider::config::{HttpSettings, SpiderConfig};
use sumi_spider::crawler::{html, Fetcher};
use sumi_spider::{
    FetchError, HttpFetcher, JsonLinesConsumer, Request, RetryFetcher, Spider, SqliteConsumer,
};
use tempfile::TempDir;
use url::Url;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn create_test_config() -> SpiderConfig {
    let mut config = SpiderConfig::default();
    config.spider.interval_ms = 0;
    config.http.timeout_secs = 5;
    config
}

fn get(server: &MockServer, route: &str) -> Arc<Request> {
    let url = Url::parse(&format!("{}{}", server.uri(), route)).unwrap();
    Arc::new(Request::get(url))
}

fn html_response(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .set_body_string(format!("<html><body>{}</body></html>", body))
        .insert_header("content-type", "text/html")
}

#[tokio::test]
async fn test_fetch_sends_configured_headers() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/page"))
        .and(header("user-agent", "TestBot/1.0"))
        .and(header("x-crawl", "yes"))
        .respond_with(html_response("hello"))
        .expect(1)
        .mount(&server)
        .await;

    let mut settings = HttpSettings::default();
    settings.user_agent = "TestBot/1.0".to_string();
    settings
        .headers
        .insert("X-Crawl".to_string(), "yes".to_string());
    let fetcher = HttpFetcher::new(&settings).unwrap();

    let response = fetcher.fetch(get(&server, "/page")).await.unwrap();

    assert_eq!(response.status().as_u16(), 200);
    assert!(response.text().contains("hello"));
    assert_eq!(response.request().url().path(), "/page");
}

#[tokio::test]
async fn test_fetch_uses_user_agent_pool() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/page"))
        .and(header("user-agent", "RotatedBot/3.0"))
        .respond_with(html_response("hello"))
        .expect(2)
        .mount(&server)
        .await;

    let mut settings = HttpSettings::default();
    settings.user_agents = vec!["RotatedBot/3.0".to_string()];
    let fetcher = HttpFetcher::new(&settings).unwrap();

    for _ in 0..2 {
        let response = fetcher.fetch(get(&server, "/page")).await.unwrap();
        assert_eq!(response.status().as_u16(), 200);
    }
}

#[tokio::test]
async fn test_fetch_http_error_status() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let fetcher = HttpFetcher::new(&HttpSettings::default()).unwrap();
    let error = fetcher.fetch(get(&server, "/missing")).await.unwrap_err();

    assert!(matches!(error, FetchError::Status { status: 404, .. }));
    assert!(!error.is_retryable());
}

#[tokio::test]
async fn test_fetch_timeout() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(html_response("late").set_delay(Duration::from_secs(3)))
        .mount(&server)
        .await;

    let mut settings = HttpSettings::default();
    settings.timeout_secs = 1;
    let fetcher = HttpFetcher::new(&settings).unwrap();

    let error = fetcher.fetch(get(&server, "/slow")).await.unwrap_err();
    assert!(matches!(error, FetchError::Timeout { .. }));
}

#[tokio::test]
async fn test_fetch_connection_refused() {
    let fetcher = HttpFetcher::new(&HttpSettings::default()).unwrap();
    let request = Arc::new(Request::get(Url::parse("http://127.0.0.1:1/").unwrap()));

    let error = fetcher.fetch(request).await.unwrap_err();
    assert!(matches!(error, FetchError::Network { .. }));
}

#[tokio::test]
async fn test_retry_fetcher_recovers_from_503() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/flaky"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/flaky"))
        .respond_with(html_response("recovered"))
        .mount(&server)
        .await;

    let http = HttpFetcher::new(&HttpSettings::default()).unwrap();
    let fetcher = RetryFetcher::new(http, 2, Duration::from_millis(10));

    let response = fetcher.fetch(get(&server, "/flaky")).await.unwrap();
    assert!(response.text().contains("recovered"));
}

#[tokio::test]
async fn test_crawl_sends_referer_and_writes_jsonl() {
    let server = MockServer::start().await;
    let base = server.uri();

    Mock::given(method("GET"))
        .and(path("/page1"))
        .respond_with(html_response(
            r#"<p class="r">A</p><p class="r">B</p><a href="/page2">next</a>"#,
        ))
        .expect(1)
        .mount(&server)
        .await;

    // Unmatched requests get a 404, so page2 only yields results when the
    // Referer header is present
    Mock::given(method("GET"))
        .and(path("/page2"))
        .and(header("referer", format!("{}/page1", base).as_str()))
        .respond_with(html_response(r#"<p class="r">C</p>"#))
        .expect(1)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let out = dir.path().join("results.jsonl");

    let spider = Spider::from_fn(format!("{}/page1", base), |_req, res, crawl| {
        let document = res.document();
        crawl.follow_all(res.url(), html::extract_links(&document, res.url()));
        html::select_text(&document, "p.r")
    })
    .with_config(create_test_config());
    spider
        .add_consumer(JsonLinesConsumer::new(&out).unwrap())
        .unwrap();

    let report = spider.run().await.unwrap();
    assert_eq!(report.fetched, 2);
    assert_eq!(report.errors, 0);

    let lines: Vec<Value> = std::fs::read_to_string(&out)
        .unwrap()
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    let results: Vec<&str> = lines
        .iter()
        .map(|line| line["result"].as_str().unwrap())
        .collect();

    assert_eq!(results, vec!["A", "B", "C"]);
    assert_eq!(lines[2]["url"], format!("{}/page2", base));
}

#[tokio::test]
async fn test_crawl_respects_robots_and_stores_sqlite() {
    let server = MockServer::start().await;
    let base = server.uri();

    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(ResponseTemplate::new(200).set_body_string("User-agent: *\nDisallow: /admin"))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html_response(
            r#"<a href="/admin">admin</a><a href="/about">about</a>"#,
        ))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/about"))
        .respond_with(html_response(r#"<p class="r">about us</p>"#))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/admin"))
        .respond_with(html_response(r#"<p class="r">secret</p>"#))
        .expect(0)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let db = dir.path().join("results.db");

    let mut config = create_test_config();
    config.spider.respect_robots = true;
    config.spider.concurrency = 2;

    let spider = Spider::from_fn(format!("{}/", base), |_req, res, crawl| {
        let document = res.document();
        crawl.follow_all(res.url(), html::extract_links(&document, res.url()));
        html::select_text(&document, "p.r")
    })
    .with_config(config);
    spider.add_consumer(SqliteConsumer::new(&db).unwrap()).unwrap();

    let report = spider.run().await.unwrap();
    assert_eq!(report.skipped, 1);
    assert_eq!(report.results, 1);

    let stored = SqliteConsumer::new(&db).unwrap();
    let rows = stored.rows().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].0, format!("{}/about", base));
    assert_eq!(rows[0].1, "\"about us\"");
}
