//! Page parser capability
//!
//! The engine knows nothing about page content. A parser receives each
//! successful response and returns zero or more results; to discover more
//! pages it calls [`CrawlController::follow`].

use crate::crawler::controller::CrawlController;
use crate::crawler::request::{Request, Response};
use thiserror::Error;

/// Failure raised by a parser for one page
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("Invalid selector {0}")]
    Selector(String),

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Message(String),

    #[error("Parser panicked: {0}")]
    Panicked(String),
}

impl ParseError {
    /// Creates a free-form parse failure
    pub fn msg(message: impl Into<String>) -> Self {
        Self::Message(message.into())
    }
}

/// Turns one fetched page into results of type `T`
///
/// Called once per successfully fetched URL, possibly from several workers
/// at the same time. A returned error is reported through the listeners and
/// the run continues with other URLs.
pub trait Parser<T>: Send + Sync {
    fn parse(
        &self,
        request: &Request,
        response: &Response,
        crawl: &CrawlController,
    ) -> Result<Vec<T>, ParseError>;
}

/// Adapts a closure into a [`Parser`]
///
/// # Example
///
/// ```
/// use sumi_spider::crawler::FnParser;
///
/// let parser = FnParser::new(|_request, response, _crawl| {
///     Ok(vec![response.status().as_u16()])
/// });
/// ```
pub struct FnParser<F> {
    f: F,
}

impl<F> FnParser<F> {
    pub fn new<T>(f: F) -> Self
    where
        F: Fn(&Request, &Response, &CrawlController) -> Result<Vec<T>, ParseError> + Send + Sync,
    {
        Self { f }
    }
}

impl<T, F> Parser<T> for FnParser<F>
where
    F: Fn(&Request, &Response, &CrawlController) -> Result<Vec<T>, ParseError> + Send + Sync,
{
    fn parse(
        &self,
        request: &Request,
        response: &Response,
        crawl: &CrawlController,
    ) -> Result<Vec<T>, ParseError> {
        (self.f)(request, response, crawl)
    }
}

impl<T, P: Parser<T> + ?Sized> Parser<T> for std::sync::Arc<P> {
    fn parse(
        &self,
        request: &Request,
        response: &Response,
        crawl: &CrawlController,
    ) -> Result<Vec<T>, ParseError> {
        (**self).parse(request, response, crawl)
    }
}
