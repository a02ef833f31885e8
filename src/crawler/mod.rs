//! Crawler module: the engine and its capabilities
//!
//! This module contains the core crawling logic, including:
//! - The `Spider` engine and its worker pool
//! - The shared frontier with at-most-once URL acceptance
//! - HTTP fetching with error classification and optional retries
//! - The `Parser` capability and HTML helpers for implementing it

mod controller;
mod fetcher;
mod frontier;
pub mod html;
mod parser;
mod registry;
mod report;
mod request;
mod scheduler;
mod spider;

pub use controller::CrawlController;
pub use fetcher::{build_http_client, FetchError, Fetcher, HttpFetcher, RetryFetcher};
pub(crate) use fetcher::fetch_guarded;
pub use frontier::{CrawlTask, Frontier};
pub use parser::{FnParser, ParseError, Parser};
pub use registry::Registry;
pub use report::CrawlReport;
pub use request::{Request, Response};
pub use spider::Spider;
