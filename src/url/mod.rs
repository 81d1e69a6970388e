//! URL handling module for web-parser
//!
//! This module provides URL canonicalization, fingerprinting, host extraction
//! and the include/exclude pattern filter used by the frontier.

mod domain;
mod matcher;
mod normalize;

use sha2::{Digest, Sha256};
use url::Url;

// Re-export main functions
pub use domain::{extract_domain, is_same_host};
pub use matcher::UrlFilter;
pub use normalize::normalize_url;

/// Computes the deduplication fingerprint of a canonical URL
///
/// The fingerprint is the hex SHA-256 of the canonical URL string, so two URLs
/// share a fingerprint exactly when they normalize to the same string.
///
/// # Examples
///
/// ```
/// use web_parser::url::{fingerprint, normalize_url};
///
/// let a = normalize_url("https://Example.com/page?b=2&a=1#top").unwrap();
/// let b = normalize_url("https://example.com/page?a=1&b=2").unwrap();
/// assert_eq!(fingerprint(&a), fingerprint(&b));
/// ```
pub fn fingerprint(url: &Url) -> String {
    let mut hasher = Sha256::new();
    hasher.update(url.as_str().as_bytes());
    hex::encode(hasher.finalize())
}
