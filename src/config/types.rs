use serde::Deserialize;
use std::collections::BTreeMap;
use std::time::Duration;

/// User agent sent when the configuration does not name one
pub const DEFAULT_USER_AGENT: &str = concat!("sumi-spider/", env!("CARGO_PKG_VERSION"));

/// Main configuration structure for Sumi-Spider
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SpiderConfig {
    pub spider: CrawlerSettings,
    pub http: HttpSettings,
}

/// Crawl engine behavior
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CrawlerSettings {
    /// Number of workers pulling from the frontier
    pub concurrency: u32,

    /// Pause a worker takes after each task (milliseconds)
    #[serde(rename = "interval-ms")]
    pub interval_ms: u64,

    /// Maximum follow depth from the seed (unlimited when absent)
    #[serde(rename = "max-depth")]
    pub max_depth: Option<u32>,

    /// Consult robots.txt before fetching
    #[serde(rename = "respect-robots")]
    pub respect_robots: bool,
}

impl Default for CrawlerSettings {
    fn default() -> Self {
        Self {
            concurrency: 1,
            interval_ms: 500,
            max_depth: None,
            respect_robots: false,
        }
    }
}

impl CrawlerSettings {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

/// HTTP client configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HttpSettings {
    /// Whole-request timeout (seconds)
    #[serde(rename = "timeout-secs")]
    pub timeout_secs: u64,

    /// Connection establishment timeout (seconds)
    #[serde(rename = "connect-timeout-secs")]
    pub connect_timeout_secs: u64,

    /// User-Agent header value
    #[serde(rename = "user-agent")]
    pub user_agent: String,

    /// Pool of User-Agent values; when non-empty each request picks one at random
    #[serde(rename = "user-agents")]
    pub user_agents: Vec<String>,

    /// Headers added to every request that does not already set them
    pub headers: BTreeMap<String, String>,

    /// Extra attempts after a retryable failure (0 = single attempt)
    #[serde(rename = "max-retries")]
    pub max_retries: u32,

    /// Delay between retry attempts (milliseconds)
    #[serde(rename = "retry-delay-ms")]
    pub retry_delay_ms: u64,
}

impl Default for HttpSettings {
    fn default() -> Self {
        let mut headers = BTreeMap::new();
        headers.insert(
            "Accept".to_string(),
            "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8".to_string(),
        );
        headers.insert("Accept-Language".to_string(), "en-US,en;q=0.9".to_string());

        Self {
            timeout_secs: 30,
            connect_timeout_secs: 10,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            user_agents: Vec::new(),
            headers,
            max_retries: 0,
            retry_delay_ms: 5000,
        }
    }
}

impl HttpSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }
}
