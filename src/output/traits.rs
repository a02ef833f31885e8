//! Result consumer trait and error type

use crate::crawler::Request;
use std::sync::Arc;
use thiserror::Error;

/// Errors that can occur while handling results
#[derive(Debug, Error)]
pub enum ConsumerError {
    #[error("{0}")]
    Message(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to serialize result: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Consumer panicked: {0}")]
    Panicked(String),
}

/// Result type for consumer operations
pub type ConsumerResult<T> = Result<T, ConsumerError>;

/// Receives every result a parser produces
///
/// `handle` is called once per result, with the request whose page
/// produced it. Results of one page arrive contiguously and in parser
/// order. Implementations must be thread-safe.
pub trait ResultConsumer<T>: Send + Sync {
    /// Name used when logging consumer failures
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    /// Handles one result
    fn handle(&self, request: &Request, item: &T) -> ConsumerResult<()>;

    /// Flushes buffered output once the run is over
    fn close(&self) -> ConsumerResult<()> {
        Ok(())
    }
}

impl<T, C: ResultConsumer<T> + ?Sized> ResultConsumer<T> for Arc<C> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn handle(&self, request: &Request, item: &T) -> ConsumerResult<()> {
        (**self).handle(request, item)
    }

    fn close(&self) -> ConsumerResult<()> {
        (**self).close()
    }
}
