use crate::ConfigError;
use regex::RegexSet;

/// Include/exclude regex filter applied to canonical URL strings
///
/// A URL passes when it matches at least one include pattern (or the include
/// list is empty) and matches no exclude pattern.
///
/// # Examples
///
/// ```
/// use web_parser::url::UrlFilter;
///
/// let filter = UrlFilter::new(
///     &[r"^https://example\.com/docs/".to_string()],
///     &[r"\.pdf$".to_string()],
/// ).unwrap();
///
/// assert!(filter.matches("https://example.com/docs/intro"));
/// assert!(!filter.matches("https://example.com/docs/manual.pdf"));
/// assert!(!filter.matches("https://example.com/blog/"));
/// ```
#[derive(Debug, Clone)]
pub struct UrlFilter {
    include: Option<RegexSet>,
    exclude: Option<RegexSet>,
}

impl UrlFilter {
    /// Compiles the include and exclude patterns
    pub fn new(include: &[String], exclude: &[String]) -> Result<Self, ConfigError> {
        Ok(Self {
            include: compile(include)?,
            exclude: compile(exclude)?,
        })
    }

    /// A filter that accepts every URL
    pub fn allow_all() -> Self {
        Self {
            include: None,
            exclude: None,
        }
    }

    /// Checks a canonical URL string against the filter
    pub fn matches(&self, url: &str) -> bool {
        let included = self.include.as_ref().map_or(true, |set| set.is_match(url));
        let excluded = self.exclude.as_ref().is_some_and(|set| set.is_match(url));
        included && !excluded
    }
}

fn compile(patterns: &[String]) -> Result<Option<RegexSet>, ConfigError> {
    if patterns.is_empty() {
        return Ok(None);
    }

    RegexSet::new(patterns)
        .map(Some)
        .map_err(|e| ConfigError::InvalidPattern {
            pattern: patterns.join(", "),
            message: e.to_string(),
        })
}
