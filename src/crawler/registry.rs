//! Ordered observer registration that is frozen while a run is active

use crate::SpiderError;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

struct Entries<O: ?Sized> {
    entries: Vec<Arc<O>>,
    sealed: bool,
}

/// Registration-ordered list of observers (listeners or consumers)
///
/// `seal` hands the run an immutable snapshot and rejects registrations
/// until `unseal`, so the set of observers never changes mid-run.
pub struct Registry<O: ?Sized> {
    inner: Mutex<Entries<O>>,
}

impl<O: ?Sized> Default for Registry<O> {
    fn default() -> Self {
        Self {
            inner: Mutex::new(Entries {
                entries: Vec::new(),
                sealed: false,
            }),
        }
    }
}

impl<O: ?Sized> Registry<O> {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Entries<O>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Appends an observer
    ///
    /// # Errors
    ///
    /// `SpiderError::Configuration` while a run holds the registry sealed.
    pub fn register(&self, observer: Arc<O>) -> Result<(), SpiderError> {
        let mut inner = self.lock();
        if inner.sealed {
            return Err(SpiderError::Configuration(
                "cannot register observers while a crawl is running".to_string(),
            ));
        }
        inner.entries.push(observer);
        Ok(())
    }

    /// Freezes registration and returns the current observers in order
    pub fn seal(&self) -> Arc<[Arc<O>]> {
        let mut inner = self.lock();
        inner.sealed = true;
        inner.entries.iter().cloned().collect()
    }

    /// Re-opens registration after a run
    pub fn unseal(&self) {
        self.lock().sealed = false;
    }

    pub fn is_sealed(&self) -> bool {
        self.lock().sealed
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().entries.is_empty()
    }
}
