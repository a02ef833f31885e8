use crate::crawler::frontier::Frontier;
use crate::state::CrawlState;
use std::sync::Arc;
use url::Url;

/// Handle a parser uses to steer the run it is part of
///
/// Each handle is bound to the task being parsed, so links followed through
/// it are one level deeper than that task.
#[derive(Debug, Clone)]
pub struct CrawlController {
    frontier: Arc<Frontier>,
    depth: u32,
}

impl CrawlController {
    /// Binds a handle to `frontier` for a task at `depth`
    pub fn new(frontier: Arc<Frontier>, depth: u32) -> Self {
        Self { frontier, depth }
    }

    /// Enqueues `target` (resolved against `origin`) if it has not been seen
    ///
    /// Returns `true` only when a new task was created. Empty or malformed
    /// links, duplicates, links past the depth limit, and any follow after
    /// [`CrawlController::finish`] return `false`.
    pub fn follow(&self, origin: &Url, target: &str) -> bool {
        self.frontier.follow(origin, target, self.depth + 1)
    }

    /// Follows every link in `targets`, returning how many were enqueued
    pub fn follow_all<I, S>(&self, origin: &Url, targets: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        targets
            .into_iter()
            .filter(|target| self.follow(origin, target.as_ref()))
            .count()
    }

    /// Stops the run from accepting new URLs
    ///
    /// Tasks already queued or in flight still complete and deliver their
    /// results. Calling this more than once has no further effect.
    pub fn finish(&self) {
        self.frontier.finish();
    }

    /// Returns true once `finish` was called or the run ended
    pub fn has_finished(&self) -> bool {
        !self.frontier.state().accepts_new_urls()
    }

    pub fn state(&self) -> CrawlState {
        self.frontier.state()
    }

    /// Depth of the task this handle belongs to
    pub fn depth(&self) -> u32 {
        self.depth
    }
}
