//! Request and response types exchanged between fetcher, parser and listeners

use crate::crawler::frontier::CrawlTask;
use crate::crawler::parser::ParseError;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, REFERER};
use reqwest::{Method, StatusCode};
use scraper::Html;
use serde::de::DeserializeOwned;
use std::borrow::Cow;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// A single request the engine will send
///
/// Immutable once built; the builder methods consume and return the value.
#[derive(Debug, Clone)]
pub struct Request {
    url: Url,
    referer: Option<Url>,
    method: Method,
    headers: HeaderMap,
    depth: u32,
}

impl Request {
    /// Creates a GET request for an absolute URL
    pub fn get(url: Url) -> Self {
        Self {
            url,
            referer: None,
            method: Method::GET,
            headers: HeaderMap::new(),
            depth: 0,
        }
    }

    /// Builds the request for a dequeued task, carrying its origin as `Referer`
    pub(crate) fn from_task(task: &CrawlTask) -> Self {
        let request = Self::get(task.url.clone()).with_depth(task.depth);
        match &task.referer {
            Some(referer) => request.with_referer(referer.clone()),
            None => request,
        }
    }

    /// Records the originating page and sets the `Referer` header
    pub fn with_referer(mut self, referer: Url) -> Self {
        if let Ok(value) = HeaderValue::from_str(referer.as_str()) {
            self.headers.insert(REFERER, value);
        }
        self.referer = Some(referer);
        self
    }

    pub fn with_method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn with_depth(mut self, depth: u32) -> Self {
        self.depth = depth;
        self
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    /// The page this URL was discovered on (`None` for the seed)
    pub fn referer(&self) -> Option<&Url> {
        self.referer.as_ref()
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Number of follows between the seed and this request
    pub fn depth(&self) -> u32 {
        self.depth
    }
}

/// A fetched response, tied to the request that produced it
#[derive(Debug, Clone)]
pub struct Response {
    request: Arc<Request>,
    url: Url,
    status: StatusCode,
    headers: HeaderMap,
    body: Vec<u8>,
    elapsed: Duration,
}

impl Response {
    /// Creates a response for `request`; the final URL defaults to the request URL
    pub fn new(request: Arc<Request>, status: StatusCode, body: impl Into<Vec<u8>>) -> Self {
        let url = request.url().clone();
        Self {
            request,
            url,
            status,
            headers: HeaderMap::new(),
            body: body.into(),
            elapsed: Duration::ZERO,
        }
    }

    /// Sets the final URL after redirects
    pub fn with_url(mut self, url: Url) -> Self {
        self.url = url;
        self
    }

    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    pub fn with_elapsed(mut self, elapsed: Duration) -> Self {
        self.elapsed = elapsed;
        self
    }

    pub fn request(&self) -> &Request {
        &self.request
    }

    /// Final URL after redirects; use this as the origin when following links
    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Time spent fetching
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// Body decoded as UTF-8, replacing invalid sequences
    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }

    /// Parses the body as an HTML document
    pub fn document(&self) -> Html {
        Html::parse_document(&self.text())
    }

    /// Deserializes the body as JSON
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, ParseError> {
        Ok(serde_json::from_slice(&self.body)?)
    }
}
