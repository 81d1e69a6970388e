use crate::config::types::{
    ContentMode, CrawlJob, ExtractOptions, SiteConfig, DEFAULT_DELAY_MS, DEFAULT_MAX_BODY_BYTES,
    DEFAULT_MAX_DEPTH, DEFAULT_MAX_REDIRECTS, DEFAULT_RETRIES, DEFAULT_TIMEOUT_SECS,
    DEFAULT_WORKERS,
};
use crate::config::validation::{parse_header, validate};
use crate::url::normalize_url;
use crate::{ConfigError, CrawlError};
use sha2::{Digest, Sha256};
use std::path::Path;
use std::time::Duration;

/// Loads and parses a site configuration file from the given path
///
/// The file is only parsed here; validation happens once the file has been
/// merged with command-line overrides and resolved into a [`CrawlJob`].
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// use web_parser::config::load_site_config;
///
/// let site = load_site_config(Path::new("site.toml")).unwrap();
/// println!("Max depth: {:?}", site.max_depth);
/// ```
pub fn load_site_config(path: &Path) -> Result<SiteConfig, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let site: SiteConfig = toml::from_str(&content)?;
    Ok(site)
}

/// Computes a SHA-256 hash of the configuration file content
///
/// Logged at startup so a crawl can be tied to the exact settings it used.
pub fn compute_config_hash(path: &Path) -> Result<String, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    Ok(hex::encode(hasher.finalize()))
}

/// Loads a site configuration and returns both the config and its hash
pub fn load_site_config_with_hash(path: &Path) -> Result<(SiteConfig, String), ConfigError> {
    let site = load_site_config(path)?;
    let hash = compute_config_hash(path)?;
    Ok((site, hash))
}

/// Resolves merged site settings into a validated [`CrawlJob`]
///
/// Unset fields take their defaults. Without `crawl = true` the depth is
/// forced to 0 so only the seed page is fetched.
///
/// # Errors
///
/// * `CrawlError::InvalidSeedUrl` - the seed is missing, malformed or not http(s)
/// * `CrawlError::Config` - any other setting is out of range or malformed
pub fn resolve_job(site: SiteConfig) -> Result<CrawlJob, CrawlError> {
    let raw_seed = site
        .url
        .ok_or_else(|| ConfigError::Validation("a seed URL is required (-url)".to_string()))?;

    let seed = normalize_url(&raw_seed).map_err(|source| CrawlError::InvalidSeedUrl {
        url: raw_seed.clone(),
        source,
    })?;

    let crawl = site.crawl.unwrap_or(false);
    let max_depth = if crawl {
        site.max_depth.unwrap_or(DEFAULT_MAX_DEPTH)
    } else {
        0
    };

    let headers = site
        .headers
        .unwrap_or_default()
        .into_iter()
        .map(|(name, value)| parse_header(&format!("{}: {}", name, value)))
        .collect::<Result<Vec<_>, _>>()?;

    let mode = if site.markdown_content.unwrap_or(false) {
        ContentMode::Markdown
    } else {
        ContentMode::Text
    };

    let mut job = CrawlJob::new(seed);
    job.max_depth = max_depth;
    job.same_domain = site.same_domain.unwrap_or(false);
    job.include_patterns = site.include_patterns.unwrap_or_default();
    job.exclude_patterns = site.exclude_patterns.unwrap_or_default();
    job.delay = Duration::from_millis(site.delay.unwrap_or(DEFAULT_DELAY_MS));
    job.workers = site.workers.unwrap_or(DEFAULT_WORKERS);
    job.request_timeout = Duration::from_secs(site.timeout.unwrap_or(DEFAULT_TIMEOUT_SECS));
    job.deadline = site.deadline.map(Duration::from_secs);
    job.max_pages = site.max_pages;
    job.retries = site.retries.unwrap_or(DEFAULT_RETRIES);
    job.max_redirects = site.max_redirects.unwrap_or(DEFAULT_MAX_REDIRECTS);
    job.max_body_bytes = site.max_body_bytes.unwrap_or(DEFAULT_MAX_BODY_BYTES);
    if let Some(user_agent) = site.user_agent {
        job.user_agent = user_agent;
    }
    job.headers = headers;
    job.respect_robots = site.respect_robots.unwrap_or(true);
    job.extract = ExtractOptions {
        content_selector: site.content_selector,
        title_selector: site.title_selector.unwrap_or_else(|| "title".to_string()),
        exclude_selectors: site.exclude_selectors.unwrap_or_default(),
        mode,
    };

    validate(&job)?;

    Ok(job)
}
