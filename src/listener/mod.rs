//! Lifecycle event listeners
//!
//! Listeners observe a run without taking part in it. Every method has a
//! no-op default so implementors only override the events they care about.
//! Events are delivered synchronously on the worker that produced them, in
//! registration order; a failing or panicking listener is logged and the
//! remaining listeners still receive the event.

mod log;

pub use log::LogListener;

use crate::crawler::{CrawlReport, Request, Response};
use crate::{panic_message, SpiderError};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use thiserror::Error;

/// Failure reported by a listener callback
#[derive(Debug, Error)]
pub enum ListenerError {
    #[error("{0}")]
    Message(String),

    #[error("Listener panicked: {0}")]
    Panicked(String),
}

/// Observer of crawl lifecycle events
///
/// `on_request_start` and `on_request_complete` bracket every fetch;
/// `on_error` reports fetch and parse failures. Implementations must be
/// thread-safe: several workers may emit events at the same time.
pub trait Listener: Send + Sync {
    /// Name used when logging listener failures
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    /// The seed is about to be enqueued
    fn on_start(&self, _seed: &str) -> Result<(), ListenerError> {
        Ok(())
    }

    /// A fetch is about to be attempted
    fn on_request_start(&self, _request: &Request) -> Result<(), ListenerError> {
        Ok(())
    }

    /// A fetch returned a response
    fn on_request_complete(
        &self,
        _request: &Request,
        _response: &Response,
    ) -> Result<(), ListenerError> {
        Ok(())
    }

    /// The parser finished a page and produced `results` items
    fn on_parse_complete(
        &self,
        _request: &Request,
        _response: &Response,
        _results: usize,
    ) -> Result<(), ListenerError> {
        Ok(())
    }

    /// A URL was dropped without fetching
    fn on_skip(&self, _request: &Request, _reason: &str) -> Result<(), ListenerError> {
        Ok(())
    }

    /// Fetching or parsing `request` failed
    fn on_error(&self, _request: &Request, _error: &SpiderError) -> Result<(), ListenerError> {
        Ok(())
    }

    /// The run is over; emitted exactly once per run
    fn on_finish(&self, _report: &CrawlReport) -> Result<(), ListenerError> {
        Ok(())
    }
}

impl<L: Listener + ?Sized> Listener for Arc<L> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn on_start(&self, seed: &str) -> Result<(), ListenerError> {
        (**self).on_start(seed)
    }

    fn on_request_start(&self, request: &Request) -> Result<(), ListenerError> {
        (**self).on_request_start(request)
    }

    fn on_request_complete(
        &self,
        request: &Request,
        response: &Response,
    ) -> Result<(), ListenerError> {
        (**self).on_request_complete(request, response)
    }

    fn on_parse_complete(
        &self,
        request: &Request,
        response: &Response,
        results: usize,
    ) -> Result<(), ListenerError> {
        (**self).on_parse_complete(request, response, results)
    }

    fn on_skip(&self, request: &Request, reason: &str) -> Result<(), ListenerError> {
        (**self).on_skip(request, reason)
    }

    fn on_error(&self, request: &Request, error: &SpiderError) -> Result<(), ListenerError> {
        (**self).on_error(request, error)
    }

    fn on_finish(&self, report: &CrawlReport) -> Result<(), ListenerError> {
        (**self).on_finish(report)
    }
}

/// The listeners of one run, frozen at start
#[derive(Clone)]
pub(crate) struct ListenerSet {
    listeners: Arc<[Arc<dyn Listener>]>,
}

impl ListenerSet {
    pub(crate) fn new(listeners: Arc<[Arc<dyn Listener>]>) -> Self {
        Self { listeners }
    }

    /// Delivers one event to every listener in order, isolating failures
    fn emit<F>(&self, event: &str, deliver: F)
    where
        F: Fn(&dyn Listener) -> Result<(), ListenerError>,
    {
        for listener in self.listeners.iter() {
            let outcome = catch_unwind(AssertUnwindSafe(|| deliver(&**listener)))
                .unwrap_or_else(|payload| Err(ListenerError::Panicked(panic_message(payload))));

            if let Err(e) = outcome {
                tracing::warn!("Listener {} failed on {}: {}", listener.name(), event, e);
            }
        }
    }

    pub(crate) fn start(&self, seed: &str) {
        self.emit("start", |l| l.on_start(seed));
    }

    pub(crate) fn request_start(&self, request: &Request) {
        self.emit("request_start", |l| l.on_request_start(request));
    }

    pub(crate) fn request_complete(&self, request: &Request, response: &Response) {
        self.emit("request_complete", |l| l.on_request_complete(request, response));
    }

    pub(crate) fn parse_complete(&self, request: &Request, response: &Response, results: usize) {
        self.emit("parse_complete", |l| {
            l.on_parse_complete(request, response, results)
        });
    }

    pub(crate) fn skip(&self, request: &Request, reason: &str) {
        self.emit("skip", |l| l.on_skip(request, reason));
    }

    pub(crate) fn error(&self, request: &Request, error: &SpiderError) {
        self.emit("error", |l| l.on_error(request, error));
    }

    pub(crate) fn finish(&self, report: &CrawlReport) {
        self.emit("finish", |l| l.on_finish(report));
    }
}
