use crate::crawler::Request;
use crate::output::traits::{ConsumerError, ResultConsumer};
use crate::panic_message;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, Mutex, PoisonError};

/// Fans parser results out to the consumers of one run
///
/// Each page's results are delivered under a single lock, so a consumer
/// never sees results of two pages interleaved.
pub(crate) struct ResultDispatcher<T> {
    consumers: Arc<[Arc<dyn ResultConsumer<T>>]>,
    batch: Mutex<()>,
}

impl<T> ResultDispatcher<T> {
    pub(crate) fn new(consumers: Arc<[Arc<dyn ResultConsumer<T>>]>) -> Self {
        Self {
            consumers,
            batch: Mutex::new(()),
        }
    }

    /// Delivers `items` in order to every consumer in registration order
    pub(crate) fn dispatch(&self, request: &Request, items: &[T]) {
        if items.is_empty() {
            return;
        }

        if self.consumers.is_empty() {
            tracing::info!("{} result(s) from {}", items.len(), request.url());
            return;
        }

        let _batch = self.batch.lock().unwrap_or_else(PoisonError::into_inner);
        for item in items {
            for consumer in self.consumers.iter() {
                let consumer: &dyn ResultConsumer<T> = &**consumer;
                let outcome = catch_unwind(AssertUnwindSafe(|| consumer.handle(request, item)))
                    .unwrap_or_else(|payload| {
                        Err(ConsumerError::Panicked(panic_message(payload)))
                    });

                if let Err(e) = outcome {
                    tracing::warn!(
                        "Consumer {} failed on result from {}: {}",
                        consumer.name(),
                        request.url(),
                        e
                    );
                }
            }
        }
    }

    /// Closes every consumer, logging failures
    pub(crate) fn close(&self) {
        for consumer in self.consumers.iter() {
            let consumer: &dyn ResultConsumer<T> = &**consumer;
            let outcome = catch_unwind(AssertUnwindSafe(|| consumer.close()))
                .unwrap_or_else(|payload| Err(ConsumerError::Panicked(panic_message(payload))));

            if let Err(e) = outcome {
                tracing::warn!("Consumer {} failed to close: {}", consumer.name(), e);
            }
        }
    }
}
