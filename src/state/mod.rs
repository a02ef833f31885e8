//! State module for tracking crawl progress
//!
//! # Components
//!
//! - `CrawlState`: lifecycle status of one crawl run (idle, running, finishing, finished)

mod crawl_state;

pub use crawl_state::CrawlState;
