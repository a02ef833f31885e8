use super::{Listener, ListenerError};
use crate::crawler::{CrawlReport, Request, Response};
use crate::SpiderError;

/// Listener that writes every lifecycle event to `tracing`
///
/// Progress goes to `info`, per-request detail to `debug`, and failures
/// to `warn`.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogListener;

impl LogListener {
    pub fn new() -> Self {
        Self
    }
}

impl Listener for LogListener {
    fn name(&self) -> &str {
        "log"
    }

    fn on_start(&self, seed: &str) -> Result<(), ListenerError> {
        tracing::info!("Starting crawl at {}", seed);
        Ok(())
    }

    fn on_request_start(&self, request: &Request) -> Result<(), ListenerError> {
        match request.referer() {
            Some(referer) => tracing::debug!("Fetching {} (from {})", request.url(), referer),
            None => tracing::debug!("Fetching {}", request.url()),
        }
        Ok(())
    }

    fn on_request_complete(
        &self,
        request: &Request,
        response: &Response,
    ) -> Result<(), ListenerError> {
        tracing::info!(
            "Fetched {} ({}, {} bytes, {:?})",
            request.url(),
            response.status(),
            response.body().len(),
            response.elapsed()
        );
        Ok(())
    }

    fn on_parse_complete(
        &self,
        request: &Request,
        _response: &Response,
        results: usize,
    ) -> Result<(), ListenerError> {
        tracing::debug!("Parsed {}: {} result(s)", request.url(), results);
        Ok(())
    }

    fn on_skip(&self, request: &Request, reason: &str) -> Result<(), ListenerError> {
        tracing::info!("Skipped {}: {}", request.url(), reason);
        Ok(())
    }

    fn on_error(&self, request: &Request, error: &SpiderError) -> Result<(), ListenerError> {
        tracing::warn!("Failed {}: {}", request.url(), error);
        Ok(())
    }

    fn on_finish(&self, report: &CrawlReport) -> Result<(), ListenerError> {
        tracing::info!(
            "Crawl finished in {:.1}s: {} fetched, {} results, {} errors, {} skipped",
            report.duration().as_secs_f64(),
            report.fetched,
            report.results,
            report.errors,
            report.skipped
        );
        Ok(())
    }
}
