use serde::Deserialize;
use std::collections::BTreeMap;
use std::time::Duration;
use url::Url;

/// Default maximum crawl depth when `-crawl` is given without `-max-depth`
pub const DEFAULT_MAX_DEPTH: u32 = 2;

/// Default politeness delay applied by each worker before a request
pub const DEFAULT_DELAY_MS: u64 = 200;

/// Default per-request timeout
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Default worker pool size
pub const DEFAULT_WORKERS: usize = 4;

/// Default retry budget for transient network failures
pub const DEFAULT_RETRIES: u32 = 2;

/// Default redirect hop limit
pub const DEFAULT_MAX_REDIRECTS: usize = 10;

/// Default response body limit (10 MiB)
pub const DEFAULT_MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

/// Returns the default `User-Agent` header value
pub fn default_user_agent() -> String {
    format!("web-parser/{}", env!("CARGO_PKG_VERSION"))
}

/// How extracted page content is rendered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ContentMode {
    /// Whitespace-collapsed plain text, one block per line
    #[default]
    Text,
    /// Markdown converted from the content root
    Markdown,
}

/// Settings consumed by the extractor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractOptions {
    /// CSS selector for the main content root (falls back to heuristics)
    pub content_selector: Option<String>,

    /// CSS selector for the page title
    pub title_selector: String,

    /// Extra CSS selectors removed before extraction
    pub exclude_selectors: Vec<String>,

    /// Rendering of the extracted content
    pub mode: ContentMode,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            content_selector: None,
            title_selector: "title".to_string(),
            exclude_selectors: Vec::new(),
            mode: ContentMode::Text,
        }
    }
}

/// One crawl invocation's configuration
///
/// Built once from the command line and an optional site configuration file,
/// validated, then shared read-only by the coordinator and every worker.
#[derive(Debug, Clone)]
pub struct CrawlJob {
    /// Seed URL (canonical form)
    pub seed: Url,

    /// Maximum link hops from the seed; 0 fetches only the seed
    pub max_depth: u32,

    /// Only follow links whose host equals the seed host
    pub same_domain: bool,

    /// URL regexes; a non-seed URL must match at least one
    pub include_patterns: Vec<String>,

    /// URL regexes; a non-seed URL must match none
    pub exclude_patterns: Vec<String>,

    /// Politeness delay applied by a worker before each fetch
    pub delay: Duration,

    /// Number of concurrent workers
    pub workers: usize,

    /// Per-request timeout
    pub request_timeout: Duration,

    /// Overall wall-clock deadline for the crawl
    pub deadline: Option<Duration>,

    /// Maximum number of URLs dispatched to workers
    pub max_pages: Option<usize>,

    /// Retries for network errors and 5xx responses
    pub retries: u32,

    /// Maximum redirect hops per request
    pub max_redirects: usize,

    /// Maximum accepted response body size
    pub max_body_bytes: usize,

    /// `User-Agent` header value
    pub user_agent: String,

    /// Extra request headers
    pub headers: Vec<(String, String)>,

    /// Honor robots.txt rules
    pub respect_robots: bool,

    /// Extractor settings
    pub extract: ExtractOptions,
}

impl CrawlJob {
    /// Creates a job for the given seed with default settings
    ///
    /// Crawling is enabled with the default depth. Callers adjust the public
    /// fields afterwards; [`crate::config::validate`] checks the result.
    pub fn new(seed: Url) -> Self {
        Self {
            seed,
            max_depth: DEFAULT_MAX_DEPTH,
            same_domain: false,
            include_patterns: Vec::new(),
            exclude_patterns: Vec::new(),
            delay: Duration::from_millis(DEFAULT_DELAY_MS),
            workers: DEFAULT_WORKERS,
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            deadline: None,
            max_pages: None,
            retries: DEFAULT_RETRIES,
            max_redirects: DEFAULT_MAX_REDIRECTS,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
            user_agent: default_user_agent(),
            headers: Vec::new(),
            respect_robots: true,
            extract: ExtractOptions::default(),
        }
    }

    /// Returns the lowercase host of the seed URL
    pub fn seed_host(&self) -> Option<String> {
        crate::url::extract_domain(&self.seed)
    }
}

/// Site-level crawl settings, as read from a TOML file or assembled from CLI flags
///
/// Every field is optional so that a file can be layered under command-line
/// overrides with [`SiteConfig::merge`].
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct SiteConfig {
    /// Seed URL
    pub url: Option<String>,

    /// Follow links beyond the seed page
    pub crawl: Option<bool>,

    pub max_depth: Option<u32>,

    pub same_domain: Option<bool>,

    /// Politeness delay in milliseconds
    pub delay: Option<u64>,

    /// Per-request timeout in seconds
    pub timeout: Option<u64>,

    pub workers: Option<usize>,

    /// Overall crawl deadline in seconds
    pub deadline: Option<u64>,

    pub max_pages: Option<usize>,

    pub retries: Option<u32>,

    pub max_redirects: Option<usize>,

    pub max_body_bytes: Option<usize>,

    pub include_patterns: Option<Vec<String>>,

    pub exclude_patterns: Option<Vec<String>>,

    pub content_selector: Option<String>,

    pub title_selector: Option<String>,

    pub exclude_selectors: Option<Vec<String>>,

    /// Extra request headers
    pub headers: Option<BTreeMap<String, String>>,

    pub user_agent: Option<String>,

    pub respect_robots: Option<bool>,

    /// Render page content as Markdown instead of plain text
    pub markdown_content: Option<bool>,
}

impl SiteConfig {
    /// Layers `overrides` on top of `self`; set fields in `overrides` win
    ///
    /// Headers are merged key by key rather than replaced.
    pub fn merge(self, overrides: SiteConfig) -> SiteConfig {
        let headers = match (self.headers, overrides.headers) {
            (Some(mut base), Some(extra)) => {
                base.extend(extra);
                Some(base)
            }
            (base, extra) => extra.or(base),
        };

        SiteConfig {
            url: overrides.url.or(self.url),
            crawl: overrides.crawl.or(self.crawl),
            max_depth: overrides.max_depth.or(self.max_depth),
            same_domain: overrides.same_domain.or(self.same_domain),
            delay: overrides.delay.or(self.delay),
            timeout: overrides.timeout.or(self.timeout),
            workers: overrides.workers.or(self.workers),
            deadline: overrides.deadline.or(self.deadline),
            max_pages: overrides.max_pages.or(self.max_pages),
            retries: overrides.retries.or(self.retries),
            max_redirects: overrides.max_redirects.or(self.max_redirects),
            max_body_bytes: overrides.max_body_bytes.or(self.max_body_bytes),
            include_patterns: overrides.include_patterns.or(self.include_patterns),
            exclude_patterns: overrides.exclude_patterns.or(self.exclude_patterns),
            content_selector: overrides.content_selector.or(self.content_selector),
            title_selector: overrides.title_selector.or(self.title_selector),
            exclude_selectors: overrides.exclude_selectors.or(self.exclude_selectors),
            headers,
            user_agent: overrides.user_agent.or(self.user_agent),
            respect_robots: overrides.respect_robots.or(self.respect_robots),
            markdown_content: overrides.markdown_content.or(self.markdown_content),
        }
    }
}

/// Output document format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Json,
    Markdown,
}

/// Output writer settings
#[derive(Debug, Clone, Default)]
pub struct OutputOptions {
    pub format: OutputFormat,

    /// Destination file; `None` writes to stdout
    pub path: Option<std::path::PathBuf>,

    /// Emit one JSON object per line as pages complete
    pub stream: bool,

    /// Sort pages by discovery order instead of completion order
    pub stable_order: bool,
}
