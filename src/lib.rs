//! Sumi-Spider: a reusable web crawl engine
//!
//! This crate implements the crawl core: a seed URL, a caller-supplied page
//! parser, a bounded pool of workers that fetch and parse pages, at-most-once
//! URL deduplication, and fan-out of results and lifecycle events to
//! registered observers.

pub mod config;
pub mod crawler;
pub mod listener;
pub mod output;
pub mod robots;
pub mod state;
pub mod url;

use thiserror::Error;

pub use crawler::{FetchError, ParseError};
pub use listener::ListenerError;
pub use output::ConsumerError;

/// Main error type for Sumi-Spider operations
#[derive(Debug, Error)]
pub enum SpiderError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Invalid engine setup, e.g. registering observers while a run is active
    #[error("Invalid setup: {0}")]
    Configuration(String),

    #[error("URL error: {0}")]
    Url(#[from] UrlError),

    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    #[error("Parse error for {url}: {source}")]
    Parse { url: String, source: ParseError },

    #[error("Listener error: {0}")]
    Listener(#[from] ListenerError),

    #[error("Consumer error: {0}")]
    Consumer(#[from] ConsumerError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),
}

/// URL-specific errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing domain in URL")]
    MissingDomain,

    #[error("Empty link")]
    Empty,
}

/// Result type alias for Sumi-Spider operations
pub type Result<T> = std::result::Result<T, SpiderError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use config::SpiderConfig;
pub use crawler::{
    CrawlController, CrawlReport, FnParser, HttpFetcher, Parser, Request, Response, RetryFetcher,
    Spider,
};
pub use listener::{Listener, LogListener};
pub use output::{ConsoleConsumer, JsonLinesConsumer, ResultConsumer, SqliteConsumer};
pub use state::CrawlState;
pub use self::url::{dedup_key, normalize_url, resolve, SeenSet};

/// Extracts a readable message from a caught panic payload
pub(crate) fn panic_message(payload: Box<dyn std::any::Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
