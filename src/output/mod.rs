//! Output module for delivering parser results
//!
//! This module handles:
//! - The `ResultConsumer` trait implemented by result sinks
//! - Fan-out of each page's results to the registered consumers
//! - Built-in sinks: console, JSON Lines file, and SQLite database

mod console;
mod dispatcher;
mod jsonl;
mod sqlite;
mod traits;

pub use console::ConsoleConsumer;
pub use jsonl::JsonLinesConsumer;
pub use sqlite::SqliteConsumer;
pub use traits::{ConsumerError, ConsumerResult, ResultConsumer};

pub(crate) use dispatcher::ResultDispatcher;
