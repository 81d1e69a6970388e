use crate::config::types::{CrawlJob, ExtractOptions};
use crate::ConfigError;
use regex::Regex;
use scraper::Selector;
use std::time::Duration;

/// Upper bound on the worker pool size
pub const MAX_WORKERS: usize = 64;

/// Upper bound on the crawl depth
pub const MAX_DEPTH_LIMIT: u32 = 10;

/// Validates the entire job
pub fn validate(job: &CrawlJob) -> Result<(), ConfigError> {
    validate_crawl_limits(job)?;
    validate_patterns(&job.include_patterns)?;
    validate_patterns(&job.exclude_patterns)?;
    validate_extract_options(&job.extract)?;
    validate_user_agent(&job.user_agent)?;
    Ok(())
}

/// Validates numeric crawl limits
fn validate_crawl_limits(job: &CrawlJob) -> Result<(), ConfigError> {
    if job.max_depth > MAX_DEPTH_LIMIT {
        return Err(ConfigError::Validation(format!(
            "max_depth must be between 0 and {}, got {}",
            MAX_DEPTH_LIMIT, job.max_depth
        )));
    }

    if job.workers < 1 || job.workers > MAX_WORKERS {
        return Err(ConfigError::Validation(format!(
            "workers must be between 1 and {}, got {}",
            MAX_WORKERS, job.workers
        )));
    }

    if job.delay > Duration::from_secs(60) {
        return Err(ConfigError::Validation(format!(
            "delay must be <= 60000ms, got {}ms",
            job.delay.as_millis()
        )));
    }

    if job.request_timeout < Duration::from_secs(1)
        || job.request_timeout > Duration::from_secs(600)
    {
        return Err(ConfigError::Validation(format!(
            "timeout must be between 1 and 600 seconds, got {}s",
            job.request_timeout.as_secs()
        )));
    }

    if job.deadline == Some(Duration::ZERO) {
        return Err(ConfigError::Validation(
            "deadline must be at least 1 second".to_string(),
        ));
    }

    if job.max_pages == Some(0) {
        return Err(ConfigError::Validation(
            "max_pages must be >= 1".to_string(),
        ));
    }

    if job.retries > 10 {
        return Err(ConfigError::Validation(format!(
            "retries must be <= 10, got {}",
            job.retries
        )));
    }

    if job.max_body_bytes == 0 {
        return Err(ConfigError::Validation(
            "max_body_bytes must be >= 1".to_string(),
        ));
    }

    Ok(())
}

/// Validates that every URL pattern compiles as a regex
fn validate_patterns(patterns: &[String]) -> Result<(), ConfigError> {
    for pattern in patterns {
        Regex::new(pattern).map_err(|e| ConfigError::InvalidPattern {
            pattern: pattern.clone(),
            message: e.to_string(),
        })?;
    }
    Ok(())
}

/// Validates the extractor's CSS selectors
fn validate_extract_options(options: &ExtractOptions) -> Result<(), ConfigError> {
    let selectors = options
        .content_selector
        .iter()
        .chain(std::iter::once(&options.title_selector))
        .chain(options.exclude_selectors.iter());

    for selector in selectors {
        if selector.trim().is_empty() || Selector::parse(selector).is_err() {
            return Err(ConfigError::InvalidSelector(selector.clone()));
        }
    }

    Ok(())
}

/// Validates the user agent string
fn validate_user_agent(user_agent: &str) -> Result<(), ConfigError> {
    if user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user_agent cannot be empty".to_string(),
        ));
    }

    if user_agent.chars().any(|c| c.is_control()) {
        return Err(ConfigError::Validation(
            "user_agent cannot contain control characters".to_string(),
        ));
    }

    Ok(())
}

/// Parses a `Name: value` header line
///
/// The name must be a non-empty token without whitespace; the value is trimmed.
pub fn parse_header(line: &str) -> Result<(String, String), ConfigError> {
    let (name, value) = line
        .split_once(':')
        .ok_or_else(|| ConfigError::InvalidHeader(line.to_string()))?;

    let name = name.trim();
    let value = value.trim();

    if name.is_empty()
        || name.chars().any(|c| c.is_whitespace() || c.is_control())
        || value.chars().any(|c| c.is_control())
    {
        return Err(ConfigError::InvalidHeader(line.to_string()));
    }

    Ok((name.to_string(), value.to_string()))
}
