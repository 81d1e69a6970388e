//! Configuration module for web-parser
//!
//! This module turns command-line flags and an optional TOML site
//! configuration file into a validated, immutable [`CrawlJob`].
//!
//! # Example
//!
//! ```no_run
//! use web_parser::config::{load_site_config, resolve_job, SiteConfig};
//! use std::path::Path;
//!
//! let file = load_site_config(Path::new("site.toml")).unwrap();
//! let cli = SiteConfig {
//!     url: Some("https://example.com/".to_string()),
//!     ..SiteConfig::default()
//! };
//! let job = resolve_job(file.merge(cli)).unwrap();
//! println!("Crawler will use max depth: {}", job.max_depth);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    default_user_agent, ContentMode, CrawlJob, ExtractOptions, OutputFormat, OutputOptions,
    SiteConfig, DEFAULT_DELAY_MS, DEFAULT_MAX_BODY_BYTES, DEFAULT_MAX_DEPTH,
    DEFAULT_MAX_REDIRECTS, DEFAULT_RETRIES, DEFAULT_TIMEOUT_SECS, DEFAULT_WORKERS,
};

// Re-export parser and validation functions
pub use parser::{compute_config_hash, load_site_config, load_site_config_with_hash, resolve_job};
pub use validation::{parse_header, validate, MAX_DEPTH_LIMIT, MAX_WORKERS};
