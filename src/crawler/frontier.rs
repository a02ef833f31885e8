//! Run-scoped work queue, seen-set and lifecycle state
//!
//! The frontier owns everything one run shares between its workers:
//! - The FIFO queue of pending tasks
//! - The count of tasks currently being processed
//! - The seen-set that makes every URL enter the queue at most once
//! - The `CrawlState` of the run
//!
//! Queue, in-flight count and state sit behind a single lock so the
//! "nothing queued, nothing in flight" check that ends a run is atomic with
//! respect to enqueues and completions.

use crate::state::CrawlState;
use crate::url::{resolve, SeenSet};
use crate::SpiderError;
use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tokio::sync::Notify;
use url::Url;

/// A unit of work: one URL to fetch and parse
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlTask {
    /// Absolute, normalized URL
    pub url: Url,

    /// Page the URL was discovered on (`None` for the seed)
    pub referer: Option<Url>,

    /// Follow distance from the seed
    pub depth: u32,
}

#[derive(Debug, Default)]
struct Inner {
    queue: VecDeque<CrawlTask>,
    in_flight: usize,
    state: CrawlState,
}

/// Shared work queue for one crawl run
#[derive(Debug)]
pub struct Frontier {
    inner: Mutex<Inner>,
    seen: SeenSet,
    notify: Notify,
    max_depth: Option<u32>,
}

impl Frontier {
    /// Creates an idle frontier; links deeper than `max_depth` are refused
    pub fn new(max_depth: Option<u32>) -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
            seen: SeenSet::new(),
            notify: Notify::new(),
            max_depth,
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Enqueues the seed and moves the run from `Idle` to `Running`
    pub fn start(&self, seed: Url) -> Result<(), SpiderError> {
        let mut inner = self.lock();
        if inner.state != CrawlState::Idle {
            return Err(SpiderError::Configuration(format!(
                "Cannot start a crawl that is already {}",
                inner.state
            )));
        }

        self.seen.accept(&seed);
        inner.queue.push_back(CrawlTask {
            url: seed,
            referer: None,
            depth: 0,
        });
        inner.state = CrawlState::Running;
        drop(inner);

        self.notify.notify_waiters();
        Ok(())
    }

    /// Resolves `target` against `origin` and enqueues it if it is new
    ///
    /// # Arguments
    ///
    /// * `origin` - The page the link was found on
    /// * `target` - Absolute or relative link
    /// * `depth` - Depth the new task would have
    ///
    /// # Returns
    ///
    /// `true` if a task was enqueued. `false` if the link is blank or
    /// malformed, exceeds the depth limit, was already seen, or the run no
    /// longer accepts new URLs.
    pub fn follow(&self, origin: &Url, target: &str, depth: u32) -> bool {
        let url = match resolve(origin, target) {
            Ok(url) => url,
            Err(e) => {
                tracing::debug!("Not following '{}' from {}: {}", target, origin, e);
                return false;
            }
        };

        if self.max_depth.is_some_and(|max| depth > max) {
            tracing::debug!("Not following {}: depth {} exceeds limit", url, depth);
            return false;
        }

        let mut inner = self.lock();
        if !inner.state.accepts_new_urls() {
            return false;
        }

        if !self.seen.accept(&url) {
            return false;
        }

        tracing::debug!("Queued {} (depth {})", url, depth);
        inner.queue.push_back(CrawlTask {
            url,
            referer: Some(origin.clone()),
            depth,
        });
        drop(inner);

        self.notify.notify_waiters();
        true
    }

    /// Stops accepting new URLs; queued and in-flight tasks still complete
    pub fn finish(&self) {
        let mut inner = self.lock();
        if inner.state == CrawlState::Running {
            tracing::info!("Finish requested, draining {} queued task(s)", inner.queue.len());
            inner.state = CrawlState::Finishing;
        }
    }

    /// Waits for the next task, or returns `None` once the run is over
    ///
    /// A returned task counts as in flight until [`Frontier::complete`] is
    /// called for it.
    pub async fn next_task(&self) -> Option<CrawlTask> {
        loop {
            let notified = self.notify.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            {
                let mut inner = self.lock();
                if let Some(task) = inner.queue.pop_front() {
                    inner.in_flight += 1;
                    return Some(task);
                }

                if inner.in_flight == 0 {
                    if inner.state.is_active() {
                        inner.state = CrawlState::Finished;
                        drop(inner);
                        self.notify.notify_waiters();
                    }
                    return None;
                }
            }

            notified.await;
        }
    }

    /// Marks one in-flight task as done
    pub fn complete(&self) {
        let mut inner = self.lock();
        inner.in_flight = inner.in_flight.saturating_sub(1);
        if inner.queue.is_empty() && inner.in_flight == 0 && inner.state.is_active() {
            inner.state = CrawlState::Finished;
        }
        drop(inner);

        self.notify.notify_waiters();
    }

    /// Ends the run once no worker is left, returning how many queued tasks were dropped
    pub(crate) fn abandon(&self) -> usize {
        let mut inner = self.lock();
        let dropped = inner.queue.len();
        inner.queue.clear();
        if inner.state.is_active() {
            inner.state = CrawlState::Finished;
        }
        dropped
    }

    pub fn state(&self) -> CrawlState {
        self.lock().state
    }

    /// Number of tasks waiting in the queue
    pub fn queued(&self) -> usize {
        self.lock().queue.len()
    }

    /// Number of tasks handed out and not yet completed
    pub fn in_flight(&self) -> usize {
        self.lock().in_flight
    }

    /// Number of distinct URLs accepted during this run
    pub fn seen_count(&self) -> usize {
        self.seen.len()
    }
}

/// Completes its task when dropped, including during a panic unwind
pub(crate) struct InFlightGuard<'a> {
    frontier: &'a Frontier,
}

impl<'a> InFlightGuard<'a> {
    pub(crate) fn new(frontier: &'a Frontier) -> Self {
        Self { frontier }
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.frontier.complete();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    fn started(max_depth: Option<u32>) -> Frontier {
        let frontier = Frontier::new(max_depth);
        frontier.start(url("http://example.test/page1")).unwrap();
        frontier
    }

    #[test]
    fn test_start_enqueues_seed() {
        let frontier = started(None);
        assert_eq!(frontier.state(), CrawlState::Running);
        assert_eq!(frontier.queued(), 1);
        assert_eq!(frontier.seen_count(), 1);
    }

    #[test]
    fn test_start_twice_fails() {
        let frontier = started(None);
        assert!(matches!(
            frontier.start(url("http://example.test/other")),
            Err(SpiderError::Configuration(_))
        ));
    }

    #[test]
    fn test_follow_rejects_duplicates_and_blanks() {
        let frontier = started(None);
        let origin = url("http://example.test/page1");

        assert!(frontier.follow(&origin, "/page2", 1));
        assert!(!frontier.follow(&origin, "/page2", 1));
        assert!(!frontier.follow(&origin, "/page2#top", 1));
        assert!(!frontier.follow(&origin, "", 1));
        assert!(!frontier.follow(&origin, "#", 1));
        assert!(!frontier.follow(&origin, "/page1", 1));
        assert_eq!(frontier.queued(), 2);
    }

    #[test]
    fn test_follow_sets_referer_and_depth() {
        let frontier = Frontier::new(None);
        frontier.start(url("http://example.test/")).unwrap();
        frontier.follow(&url("http://example.test/"), "a", 1);

        let mut inner = frontier.lock();
        inner.queue.pop_front();
        let task = inner.queue.pop_front().unwrap();
        assert_eq!(task.url.as_str(), "http://example.test/a");
        assert_eq!(task.referer, Some(url("http://example.test/")));
        assert_eq!(task.depth, 1);
    }

    #[test]
    fn test_follow_respects_max_depth() {
        let frontier = started(Some(1));
        let origin = url("http://example.test/page1");

        assert!(frontier.follow(&origin, "/one", 1));
        assert!(!frontier.follow(&origin, "/two", 2));
    }

    #[test]
    fn test_follow_refused_before_start_and_after_finish() {
        let frontier = Frontier::new(None);
        let origin = url("http://example.test/");
        assert!(!frontier.follow(&origin, "/a", 1));

        frontier.start(origin.clone()).unwrap();
        frontier.finish();
        assert_eq!(frontier.state(), CrawlState::Finishing);
        assert!(!frontier.follow(&origin, "/a", 1));
    }

    #[tokio::test]
    async fn test_queue_drains_to_finished() {
        let frontier = started(None);

        let task = frontier.next_task().await.unwrap();
        assert_eq!(task.url.as_str(), "http://example.test/page1");
        assert_eq!(frontier.in_flight(), 1);

        frontier.follow(&task.url, "/page2", 1);
        frontier.complete();

        let task = frontier.next_task().await.unwrap();
        assert_eq!(task.url.as_str(), "http://example.test/page2");
        frontier.complete();

        assert_eq!(frontier.state(), CrawlState::Finished);
        assert!(frontier.next_task().await.is_none());
    }

    #[tokio::test]
    async fn test_finish_drains_queued_tasks() {
        let frontier = started(None);
        let seed = frontier.next_task().await.unwrap();
        frontier.follow(&seed.url, "/page2", 1);
        frontier.finish();
        frontier.complete();

        assert_eq!(frontier.state(), CrawlState::Finishing);
        assert!(frontier.next_task().await.is_some());
        frontier.complete();
        assert!(frontier.next_task().await.is_none());
        assert_eq!(frontier.state(), CrawlState::Finished);
    }

    #[tokio::test]
    async fn test_waiting_worker_wakes_on_follow() {
        let frontier = Arc::new(started(None));
        let seed = frontier.next_task().await.unwrap();

        let waiter = {
            let frontier = Arc::clone(&frontier);
            tokio::spawn(async move { frontier.next_task().await })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        frontier.follow(&seed.url, "/page2", 1);

        let task = tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(task.unwrap().url.as_str(), "http://example.test/page2");
    }

    #[tokio::test]
    async fn test_waiting_worker_released_when_last_task_completes() {
        let frontier = Arc::new(started(None));
        let _seed = frontier.next_task().await.unwrap();

        let waiter = {
            let frontier = Arc::clone(&frontier);
            tokio::spawn(async move { frontier.next_task().await })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        frontier.complete();

        let task = tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .unwrap()
            .unwrap();
        assert!(task.is_none());
    }

    #[test]
    fn test_guard_completes_on_drop() {
        let frontier = started(None);
        {
            let mut inner = frontier.lock();
            inner.queue.pop_front();
            inner.in_flight = 1;
        }

        drop(InFlightGuard::new(&frontier));
        assert_eq!(frontier.in_flight(), 0);
        assert_eq!(frontier.state(), CrawlState::Finished);
    }
}
