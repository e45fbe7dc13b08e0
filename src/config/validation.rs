//! Configuration validation
//!
//! Checks a parsed configuration for values that would make a crawl session
//! meaningless or unable to start.

use crate::config::types::Config;
use crate::ConfigError;
use url::Url;

/// Validates a parsed configuration
///
/// # Rules
///
/// - `max-items` must be at least 1 (a zero budget admits nothing)
/// - `worker-count` must be at least 1
/// - every seed must be a parseable http(s) URL
/// - user-agent fields must be non-empty and the contact email must look
///   like an email address
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    if config.crawler.max_items == 0 {
        return Err(ConfigError::Validation(
            "crawler.max-items must be at least 1".to_string(),
        ));
    }

    if config.crawler.worker_count == 0 {
        return Err(ConfigError::Validation(
            "crawler.worker-count must be at least 1".to_string(),
        ));
    }

    for seed in &config.seeds {
        let url = Url::parse(seed)
            .map_err(|e| ConfigError::InvalidUrl(format!("{}: {}", seed, e)))?;
        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(ConfigError::InvalidUrl(format!(
                "{}: scheme must be http or https",
                seed
            )));
        }
    }

    validate_user_agent(config)?;

    Ok(())
}

fn validate_user_agent(config: &Config) -> Result<(), ConfigError> {
    let ua = &config.user_agent;

    if ua.crawler_name.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user-agent.crawler-name must not be empty".to_string(),
        ));
    }

    if ua.crawler_version.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user-agent.crawler-version must not be empty".to_string(),
        ));
    }

    if !ua.contact_email.contains('@') {
        return Err(ConfigError::Validation(format!(
            "user-agent.contact-email does not look like an email address: {}",
            ua.contact_email
        )));
    }

    Url::parse(&ua.contact_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("{}: {}", ua.contact_url, e)))?;

    Ok(())
}
