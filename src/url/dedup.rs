//! Per-run record of URLs that have been accepted into the frontier

use crate::url::normalize::dedup_key;
use dashmap::DashSet;
use url::Url;

/// Set of normalized URLs already enqueued or fetched during one run
///
/// Entries are [`dedup_key`]s, so spellings that differ only in parameter
/// order or tracking parameters count as one page.
///
/// Grows monotonically and never shrinks. `accept` is a single atomic
/// check-and-insert, so concurrent workers discovering the same link race
/// safely: exactly one of them wins.
#[derive(Debug, Default)]
pub struct SeenSet {
    urls: DashSet<String>,
}

impl SeenSet {
    /// Creates an empty seen-set
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the URL and returns true if it was not present before
    pub fn accept(&self, url: &Url) -> bool {
        let accepted = self.urls.insert(dedup_key(url));
        tracing::trace!("Dedup {}: accepted={}", url, accepted);
        accepted
    }

    /// Returns whether the URL has been accepted already
    pub fn contains(&self, url: &Url) -> bool {
        self.urls.contains(&dedup_key(url))
    }

    /// Number of URLs accepted so far
    pub fn len(&self) -> usize {
        self.urls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }
}
