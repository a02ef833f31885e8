//! The crawl engine entry point
//!
//! A `Spider` is configured once (seed, parser, settings, observers) and
//! can then be run. Each call to [`Spider::run`] builds a fresh frontier,
//! seen-set and worker pool, and returns once the run has finished.

use crate::config::{validate, SpiderConfig};
use crate::crawler::controller::CrawlController;
use crate::crawler::fetcher::{Fetcher, HttpFetcher, RetryFetcher};
use crate::crawler::frontier::Frontier;
use crate::crawler::parser::{FnParser, ParseError, Parser};
use crate::crawler::registry::Registry;
use crate::crawler::report::{CrawlReport, RunCounters};
use crate::crawler::request::{Request, Response};
use crate::crawler::scheduler::RunContext;
use crate::listener::{Listener, ListenerSet};
use crate::output::{ResultConsumer, ResultDispatcher};
use crate::robots::RobotsGuard;
use crate::state::CrawlState;
use crate::url::parse_absolute;
use crate::SpiderError;
use chrono::Utc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::task::JoinSet;
use url::Url;

/// A configured crawler producing results of type `T`
///
/// # Example
///
/// ```no_run
/// use sumi_spider::crawler::html;
/// use sumi_spider::{LogListener, Spider};
///
/// # async fn demo() -> sumi_spider::Result<()> {
/// let spider = Spider::from_fn("http://quotes.toscrape.com/", |_req, res, crawl| {
///     let document = res.document();
///     let quotes = html::select_text(&document, "div.quote span.text")?;
///     for next in html::select_attr(&document, "li.next a", "href")? {
///         crawl.follow(res.url(), &next);
///     }
///     Ok(quotes)
/// });
/// spider.add_listener(LogListener::new())?;
///
/// let report = spider.run().await?;
/// println!("{} quotes", report.results);
/// # Ok(())
/// # }
/// ```
pub struct Spider<T> {
    seed: String,
    parser: Arc<dyn Parser<T>>,
    config: SpiderConfig,
    fetcher: Option<Arc<dyn Fetcher>>,
    listeners: Registry<dyn Listener>,
    consumers: Registry<dyn ResultConsumer<T>>,
    current: Mutex<Option<Arc<Frontier>>>,
    running: AtomicBool,
}

impl<T: Send + Sync + 'static> Spider<T> {
    /// Creates a spider for `seed` with default configuration
    pub fn new(seed: impl Into<String>, parser: impl Parser<T> + 'static) -> Self {
        Self {
            seed: seed.into(),
            parser: Arc::new(parser),
            config: SpiderConfig::default(),
            fetcher: None,
            listeners: Registry::new(),
            consumers: Registry::new(),
            current: Mutex::new(None),
            running: AtomicBool::new(false),
        }
    }

    /// Creates a spider whose parser is a closure
    pub fn from_fn<F>(seed: impl Into<String>, f: F) -> Self
    where
        F: Fn(&Request, &Response, &CrawlController) -> Result<Vec<T>, ParseError>
            + Send
            + Sync
            + 'static,
    {
        Self::new(seed, FnParser::new(f))
    }

    /// Replaces the configuration
    pub fn with_config(mut self, config: SpiderConfig) -> Self {
        self.config = config;
        self
    }

    /// Replaces the HTTP fetcher built from the configuration
    pub fn with_fetcher(mut self, fetcher: impl Fetcher + 'static) -> Self {
        self.fetcher = Some(Arc::new(fetcher));
        self
    }

    pub fn config(&self) -> &SpiderConfig {
        &self.config
    }

    pub fn seed(&self) -> &str {
        &self.seed
    }

    /// Registers a lifecycle listener
    ///
    /// Listeners receive events in registration order.
    ///
    /// # Errors
    ///
    /// `SpiderError::Configuration` if a run is in progress.
    pub fn add_listener(&self, listener: impl Listener + 'static) -> Result<(), SpiderError> {
        self.listeners.register(Arc::new(listener))
    }

    /// Registers a result consumer
    ///
    /// # Errors
    ///
    /// `SpiderError::Configuration` if a run is in progress.
    pub fn add_consumer(
        &self,
        consumer: impl ResultConsumer<T> + 'static,
    ) -> Result<(), SpiderError> {
        self.consumers.register(Arc::new(consumer))
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    pub fn consumer_count(&self) -> usize {
        self.consumers.len()
    }

    fn current(&self) -> MutexGuard<'_, Option<Arc<Frontier>>> {
        self.current.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn frontier(&self) -> Option<Arc<Frontier>> {
        self.current().clone()
    }

    /// Enqueues `target` (resolved against `origin`) in the current run
    ///
    /// Links followed this way count as one level below the seed. Returns
    /// `false` when no run is active, and in every case where
    /// [`CrawlController::follow`] would.
    pub fn follow(&self, origin: &Url, target: &str) -> bool {
        self.frontier()
            .is_some_and(|frontier| frontier.follow(origin, target, 1))
    }

    /// Stops the current run from accepting new URLs
    ///
    /// Queued and in-flight tasks still complete. No effect when idle.
    pub fn finish(&self) {
        if let Some(frontier) = self.frontier() {
            frontier.finish();
        }
    }

    /// State of the current or most recent run
    pub fn state(&self) -> CrawlState {
        self.frontier()
            .map(|frontier| frontier.state())
            .unwrap_or_default()
    }

    /// Runs the crawl to completion
    ///
    /// Fetch and parse failures are reported to listeners and do not end
    /// the run. The returned error covers setup problems only: invalid
    /// configuration, an unusable seed, or a run already in progress.
    pub async fn run(&self) -> Result<CrawlReport, SpiderError> {
        if self
            .running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(SpiderError::Configuration(
                "crawl is already running".to_string(),
            ));
        }
        let _active = ActiveRun { spider: self };

        validate(&self.config)?;
        let seed = parse_absolute(&self.seed)?;
        let fetcher = match &self.fetcher {
            Some(fetcher) => Arc::clone(fetcher),
            None => self.default_fetcher()?,
        };

        let frontier = Arc::new(Frontier::new(self.config.spider.max_depth));
        *self.current() = Some(Arc::clone(&frontier));

        let context = Arc::new(RunContext {
            frontier: Arc::clone(&frontier),
            fetcher,
            parser: Arc::clone(&self.parser),
            listeners: ListenerSet::new(self.listeners.seal()),
            dispatcher: ResultDispatcher::new(self.consumers.seal()),
            robots: self
                .config
                .spider
                .respect_robots
                .then(|| RobotsGuard::new(&self.config.http.user_agent)),
            counters: RunCounters::default(),
            interval: self.config.spider.interval(),
        });

        let concurrency = self.config.spider.concurrency as usize;
        let started_at = Utc::now();
        tracing::info!(
            "Starting crawl at {} with {} worker(s)",
            seed,
            concurrency
        );

        context.listeners.start(seed.as_str());
        frontier.start(seed)?;

        let mut workers = JoinSet::new();
        for id in 0..concurrency {
            workers.spawn(Arc::clone(&context).run_worker(id));
        }

        while let Some(joined) = workers.join_next().await {
            if let Err(e) = joined {
                tracing::error!("Worker task failed: {}", e);
            }
        }

        let abandoned = frontier.abandon();
        if abandoned > 0 {
            tracing::warn!("{} queued task(s) abandoned after worker failure", abandoned);
        }

        context.dispatcher.close();
        let report = context
            .counters
            .report(frontier.seen_count(), started_at, Utc::now());

        tracing::info!(
            "Crawl completed: {} requested, {} fetched, {} results, {} errors",
            report.requested,
            report.fetched,
            report.results,
            report.errors
        );

        context.listeners.finish(&report);
        Ok(report)
    }

    fn default_fetcher(&self) -> Result<Arc<dyn Fetcher>, SpiderError> {
        let http = HttpFetcher::new(&self.config.http)?;
        let max_retries = self.config.http.max_retries;

        if max_retries > 0 {
            Ok(Arc::new(RetryFetcher::new(
                http,
                max_retries,
                self.config.http.retry_delay(),
            )))
        } else {
            Ok(Arc::new(http))
        }
    }
}

/// Re-opens registration and clears the running flag when a run ends
struct ActiveRun<'a, T> {
    spider: &'a Spider<T>,
}

impl<T> Drop for ActiveRun<'_, T> {
    fn drop(&mut self) {
        self.spider.listeners.unseal();
        self.spider.consumers.unseal();
        self.spider.running.store(false, Ordering::SeqCst);
    }
}
