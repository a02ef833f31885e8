//! Worker pool that drives one crawl run
//!
//! This module handles:
//! - Pulling tasks from the shared frontier
//! - Running robots.txt checks, fetch and parse for each task in order
//! - Emitting lifecycle events and dispatching results
//! - Pacing each worker by the configured interval

use crate::crawler::controller::CrawlController;
use crate::crawler::fetcher::{fetch_guarded, Fetcher};
use crate::crawler::frontier::{CrawlTask, Frontier, InFlightGuard};
use crate::crawler::parser::{ParseError, Parser};
use crate::crawler::report::RunCounters;
use crate::crawler::request::{Request, Response};
use crate::listener::ListenerSet;
use crate::output::ResultDispatcher;
use crate::robots::RobotsGuard;
use crate::{panic_message, SpiderError};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Duration;

/// Everything the workers of one run share
pub(crate) struct RunContext<T> {
    pub(crate) frontier: Arc<Frontier>,
    pub(crate) fetcher: Arc<dyn Fetcher>,
    pub(crate) parser: Arc<dyn Parser<T>>,
    pub(crate) listeners: ListenerSet,
    pub(crate) dispatcher: ResultDispatcher<T>,
    pub(crate) robots: Option<RobotsGuard>,
    pub(crate) counters: RunCounters,
    pub(crate) interval: Duration,
}

impl<T: Send + Sync + 'static> RunContext<T> {
    /// Processes tasks until the frontier reports the run is over
    pub(crate) async fn run_worker(self: Arc<Self>, id: usize) {
        tracing::debug!("Worker {} started", id);

        while let Some(task) = self.frontier.next_task().await {
            {
                let _in_flight = InFlightGuard::new(&self.frontier);
                self.process(task).await;
            }

            if !self.interval.is_zero() && !self.frontier.state().is_terminal() {
                tokio::time::sleep(self.interval).await;
            }
        }

        tracing::debug!("Worker {} exiting", id);
    }

    /// Robots check, fetch, parse and dispatch for a single task
    async fn process(&self, task: CrawlTask) {
        let request = Arc::new(Request::from_task(&task));
        tracing::debug!("Processing URL: {} (depth {})", request.url(), task.depth);

        if let Some(robots) = &self.robots {
            if !robots.is_allowed(request.url(), &*self.fetcher).await {
                self.counters.skipped();
                self.listeners.skip(&request, "disallowed by robots.txt");
                return;
            }
        }

        self.counters.requested();
        self.listeners.request_start(&request);

        let response = match fetch_guarded(&*self.fetcher, Arc::clone(&request)).await {
            Ok(response) => response,
            Err(e) => {
                self.counters.error();
                tracing::warn!("Fetch failed: {}", e);
                self.listeners.error(&request, &SpiderError::Fetch(e));
                return;
            }
        };

        self.counters.fetched();
        self.listeners.request_complete(&request, &response);

        let crawl = CrawlController::new(Arc::clone(&self.frontier), task.depth);
        match self.parse(&request, &response, &crawl) {
            Ok(items) => {
                self.listeners
                    .parse_complete(&request, &response, items.len());
                self.counters.results(items.len());
                self.dispatcher.dispatch(&request, &items);
            }
            Err(e) => {
                self.counters.error();
                tracing::warn!("Failed to parse {}: {}", request.url(), e);
                self.listeners.error(
                    &request,
                    &SpiderError::Parse {
                        url: request.url().to_string(),
                        source: e,
                    },
                );
            }
        }
    }

    /// Runs the parser, turning a panic into a parse error
    fn parse(
        &self,
        request: &Request,
        response: &Response,
        crawl: &CrawlController,
    ) -> Result<Vec<T>, ParseError> {
        let parser: &dyn Parser<T> = &*self.parser;
        catch_unwind(AssertUnwindSafe(|| parser.parse(request, response, crawl)))
            .unwrap_or_else(|payload| Err(ParseError::Panicked(panic_message(payload))))
    }
}
