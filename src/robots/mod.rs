//! Robots.txt handling module
//!
//! When enabled, every URL is checked against its origin's robots.txt
//! before it is fetched. Rules are fetched through the run's `Fetcher`,
//! cached per origin, and refreshed daily. A robots.txt that is missing or
//! cannot be fetched allows everything.

mod cache;
mod parser;

pub use cache::{CachedRobots, RobotsCache};
pub use parser::{product_token, ParsedRobots};

use crate::crawler::{fetch_guarded, Fetcher, Request};
use std::sync::Arc;
use tokio::sync::Mutex;
use url::Url;

/// Robots.txt gate shared by the workers of one run
#[derive(Debug)]
pub struct RobotsGuard {
    agent: String,
    cache: Mutex<RobotsCache>,
}

impl RobotsGuard {
    /// Creates a guard that matches rules for `user_agent`'s product token
    pub fn new(user_agent: &str) -> Self {
        Self {
            agent: product_token(user_agent).to_string(),
            cache: Mutex::new(RobotsCache::new()),
        }
    }

    /// Checks whether `url` may be fetched
    ///
    /// # Arguments
    ///
    /// * `url` - The URL about to be fetched
    /// * `fetcher` - Used to download robots.txt on a cache miss
    ///
    /// # Returns
    ///
    /// * `true` - Allowed, or robots.txt is unavailable
    /// * `false` - Disallowed for this agent
    pub async fn is_allowed(&self, url: &Url, fetcher: &dyn Fetcher) -> bool {
        let origin = url.origin().ascii_serialization();

        // Held across the download so concurrent misses fetch robots.txt once
        let mut cache = self.cache.lock().await;
        if let Some(robots) = cache.get(&origin) {
            return robots.is_allowed(url, &self.agent);
        }

        let robots = fetch_robots(&origin, fetcher).await;
        let allowed = robots.is_allowed(url, &self.agent);
        cache.insert(origin, robots);
        allowed
    }
}

/// Downloads and parses `<origin>/robots.txt`, allowing all on failure
async fn fetch_robots(origin: &str, fetcher: &dyn Fetcher) -> ParsedRobots {
    let robots_url = match Url::parse(origin).and_then(|o| o.join("/robots.txt")) {
        Ok(url) => url,
        Err(_) => return ParsedRobots::allow_all(),
    };

    match fetch_guarded(fetcher, Arc::new(Request::get(robots_url))).await {
        Ok(response) => {
            tracing::debug!("Loaded robots.txt for {}", origin);
            ParsedRobots::from_content(&response.text())
        }
        Err(e) => {
            tracing::debug!("No robots.txt for {} ({}), allowing all", origin, e);
            ParsedRobots::allow_all()
        }
    }
}
