//! Per-run counters and the summary handed back when a run ends

use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Live counters shared by the workers of one run
#[derive(Debug, Default)]
pub(crate) struct RunCounters {
    requested: AtomicU64,
    fetched: AtomicU64,
    results: AtomicU64,
    errors: AtomicU64,
    skipped: AtomicU64,
}

impl RunCounters {
    pub(crate) fn requested(&self) {
        self.requested.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn fetched(&self) {
        self.fetched.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn results(&self, count: usize) {
        self.results.fetch_add(count as u64, Ordering::Relaxed);
    }

    pub(crate) fn error(&self) {
        self.errors.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn skipped(&self) {
        self.skipped.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn report(
        &self,
        seen: usize,
        started_at: DateTime<Utc>,
        finished_at: DateTime<Utc>,
    ) -> CrawlReport {
        CrawlReport {
            requested: self.requested.load(Ordering::Relaxed),
            fetched: self.fetched.load(Ordering::Relaxed),
            results: self.results.load(Ordering::Relaxed),
            errors: self.errors.load(Ordering::Relaxed),
            skipped: self.skipped.load(Ordering::Relaxed),
            seen: seen as u64,
            started_at,
            finished_at,
        }
    }
}

/// Summary of a finished run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlReport {
    /// Fetches attempted
    pub requested: u64,
    /// Fetches that returned a response
    pub fetched: u64,
    /// Results produced by the parser
    pub results: u64,
    /// Fetch and parse failures
    pub errors: u64,
    /// URLs skipped before fetching (robots.txt)
    pub skipped: u64,
    /// Distinct URLs accepted into the frontier
    pub seen: u64,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl CrawlReport {
    /// Wall-clock length of the run
    pub fn duration(&self) -> Duration {
        (self.finished_at - self.started_at)
            .to_std()
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_to_report() {
        let counters = RunCounters::default();
        counters.requested();
        counters.requested();
        counters.fetched();
        counters.results(3);
        counters.error();
        counters.skipped();

        let started = Utc::now();
        let finished = started + chrono::Duration::milliseconds(1500);
        let report = counters.report(4, started, finished);

        assert_eq!(report.requested, 2);
        assert_eq!(report.fetched, 1);
        assert_eq!(report.results, 3);
        assert_eq!(report.errors, 1);
        assert_eq!(report.skipped, 1);
        assert_eq!(report.seen, 4);
        assert_eq!(report.duration(), Duration::from_millis(1500));
    }
}
