//! Shared helpers for integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use reqwest::StatusCode;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use sumi_spider::config::SpiderConfig;
use sumi_spider::crawler::{html, Fetcher};
use sumi_spider::{
    CrawlController, CrawlReport, FetchError, Listener, ListenerError, ParseError, Request,
    Response, SpiderError,
};

pub const BASE: &str = "http://site.test";

pub fn url(path: &str) -> String {
    format!("{}{}", BASE, path)
}

/// Test configuration: no pacing, given worker count
pub fn create_test_config(concurrency: u32) -> SpiderConfig {
    let mut config = SpiderConfig::default();
    config.spider.concurrency = concurrency;
    config.spider.interval_ms = 0;
    config
}

/// Canned outcome for one URL
#[derive(Clone)]
pub enum Page {
    Html(String),
    Fail(FetchError),
}

/// In-memory fetcher serving canned pages and recording every request
#[derive(Clone, Default)]
pub struct MapFetcher {
    pages: Arc<HashMap<String, Page>>,
    requests: Arc<Mutex<Vec<Arc<Request>>>>,
}

impl MapFetcher {
    pub fn new(pages: Vec<(&str, Page)>) -> Self {
        Self {
            pages: Arc::new(
                pages
                    .into_iter()
                    .map(|(path, page)| (url(path), page))
                    .collect(),
            ),
            requests: Arc::default(),
        }
    }

    /// URLs fetched so far, in fetch order
    pub fn fetched(&self) -> Vec<String> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .map(|r| r.url().to_string())
            .collect()
    }

    pub fn request_for(&self, path: &str) -> Option<Arc<Request>> {
        let target = url(path);
        self.requests
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.url().as_str() == target)
            .cloned()
    }
}

pub fn html_page(body: &str) -> Page {
    Page::Html(format!("<html><body>{}</body></html>", body))
}

#[async_trait]
impl Fetcher for MapFetcher {
    async fn fetch(&self, request: Arc<Request>) -> Result<Response, FetchError> {
        self.requests.lock().unwrap().push(Arc::clone(&request));
        tokio::task::yield_now().await;

        match self.pages.get(request.url().as_str()) {
            Some(Page::Html(body)) => Ok(Response::new(request, StatusCode::OK, body.clone())),
            Some(Page::Fail(error)) => Err(error.clone()),
            None => Err(FetchError::Status {
                url: request.url().to_string(),
                status: 404,
            }),
        }
    }
}

/// Parser used by most tests
///
/// Every `<p class="r">` becomes a result and every link is followed.
pub fn results_and_links(
    _request: &Request,
    response: &Response,
    crawl: &CrawlController,
) -> Result<Vec<String>, ParseError> {
    let document = response.document();
    let results = html::select_text(&document, "p.r")?;
    crawl.follow_all(response.url(), html::extract_links(&document, response.url()));
    Ok(results)
}

/// Listener that records every event as a string
#[derive(Clone, Default)]
pub struct EventLog {
    pub events: Arc<Mutex<Vec<String>>>,
}

impl EventLog {
    pub fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }

    pub fn count(&self, prefix: &str) -> usize {
        self.events()
            .iter()
            .filter(|e| e.starts_with(prefix))
            .count()
    }

    fn push(&self, event: String) {
        self.events.lock().unwrap().push(event);
    }
}

impl Listener for EventLog {
    fn on_start(&self, seed: &str) -> Result<(), ListenerError> {
        self.push(format!("start {}", seed));
        Ok(())
    }

    fn on_request_start(&self, request: &Request) -> Result<(), ListenerError> {
        self.push(format!("request {}", request.url()));
        Ok(())
    }

    fn on_request_complete(
        &self,
        request: &Request,
        _response: &Response,
    ) -> Result<(), ListenerError> {
        self.push(format!("complete {}", request.url()));
        Ok(())
    }

    fn on_skip(&self, request: &Request, _reason: &str) -> Result<(), ListenerError> {
        self.push(format!("skip {}", request.url()));
        Ok(())
    }

    fn on_error(&self, request: &Request, error: &SpiderError) -> Result<(), ListenerError> {
        let kind = match error {
            SpiderError::Fetch(_) => "fetch",
            SpiderError::Parse { .. } => "parse",
            _ => "other",
        };
        self.push(format!("error {} {}", kind, request.url()));
        Ok(())
    }

    fn on_finish(&self, report: &CrawlReport) -> Result<(), ListenerError> {
        self.push(format!("finish {}", report.results));
        Ok(())
    }
}
