use crate::config::types::{CrawlerSettings, HttpSettings, SpiderConfig};
use crate::ConfigError;
use reqwest::header::{HeaderName, HeaderValue};

/// Upper bound on workers in one engine
const MAX_CONCURRENCY: u32 = 100;

/// Upper bound on retry attempts
const MAX_RETRIES: u32 = 10;

/// Validates the entire configuration
pub fn validate(config: &SpiderConfig) -> Result<(), ConfigError> {
    validate_crawler_settings(&config.spider)?;
    validate_http_settings(&config.http)?;
    Ok(())
}

fn validate_crawler_settings(settings: &CrawlerSettings) -> Result<(), ConfigError> {
    if settings.concurrency < 1 || settings.concurrency > MAX_CONCURRENCY {
        return Err(ConfigError::Validation(format!(
            "concurrency must be between 1 and {}, got {}",
            MAX_CONCURRENCY, settings.concurrency
        )));
    }

    Ok(())
}

fn validate_http_settings(settings: &HttpSettings) -> Result<(), ConfigError> {
    if settings.timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "timeout-secs must be greater than 0".to_string(),
        ));
    }

    if settings.connect_timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "connect-timeout-secs must be greater than 0".to_string(),
        ));
    }

    if settings.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user-agent cannot be empty".to_string(),
        ));
    }

    if settings.user_agents.iter().any(|agent| agent.trim().is_empty()) {
        return Err(ConfigError::Validation(
            "user-agents cannot contain empty entries".to_string(),
        ));
    }

    if settings.max_retries > MAX_RETRIES {
        return Err(ConfigError::Validation(format!(
            "max-retries must be at most {}, got {}",
            MAX_RETRIES, settings.max_retries
        )));
    }

    for (name, value) in &settings.headers {
        validate_header(name, value)?;
    }

    Ok(())
}

fn validate_header(name: &str, value: &str) -> Result<(), ConfigError> {
    HeaderName::from_bytes(name.as_bytes())
        .map_err(|_| ConfigError::Validation(format!("Invalid header name: '{}'", name)))?;

    HeaderValue::from_str(value).map_err(|_| {
        ConfigError::Validation(format!("Invalid value for header '{}': '{}'", name, value))
    })?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate(&SpiderConfig::default()).is_ok());
    }

    #[test]
    fn test_concurrency_bounds() {
        let mut config = SpiderConfig::default();

        config.spider.concurrency = 0;
        assert!(validate(&config).is_err());

        config.spider.concurrency = 101;
        assert!(validate(&config).is_err());

        config.spider.concurrency = 100;
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let mut config = SpiderConfig::default();
        config.http.timeout_secs = 0;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_blank_user_agent_rejected() {
        let mut config = SpiderConfig::default();
        config.http.user_agent = "  ".to_string();
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_blank_user_agent_pool_entry_rejected() {
        let mut config = SpiderConfig::default();
        config.http.user_agents = vec!["Bot/1.0".to_string(), String::new()];
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_too_many_retries_rejected() {
        let mut config = SpiderConfig::default();
        config.http.max_retries = 11;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_validate_header() {
        assert!(validate_header("Accept", "text/html").is_ok());
        assert!(validate_header("X-Custom", "value").is_ok());

        assert!(validate_header("Bad Header", "value").is_err());
        assert!(validate_header("", "value").is_err());
        assert!(validate_header("X-Custom", "line\nbreak").is_err());
    }
}
