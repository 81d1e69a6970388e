//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the crawler, including:
//! - Building the HTTP client from the job settings
//! - The politeness delay before each request
//! - Retry with exponential backoff for transient failures
//! - Content-Type and body size checks
//! - Error classification

use crate::config::CrawlJob;
use crate::{ConfigError, CrawlError};
use encoding_rs::{Encoding, UTF_8};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_LENGTH, CONTENT_TYPE};
use reqwest::{redirect::Policy, Client};
use std::time::Duration;
use url::Url;

/// Base delay of the retry backoff; doubles on each attempt
pub const RETRY_BACKOFF_BASE: Duration = Duration::from_millis(250);

/// Result of a fetch operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchResult {
    /// Successfully fetched an HTML page
    Success {
        /// Final URL after redirects
        final_url: String,
        /// HTTP status code
        status_code: u16,
        /// Content-Type header value
        content_type: String,
        /// Page body content
        body: String,
    },

    /// Page is not HTML (Content-Type mismatch)
    ContentMismatch {
        /// The actual Content-Type received
        content_type: String,
    },

    /// Non-success HTTP status
    HttpError {
        /// The HTTP status code
        status_code: u16,
    },

    /// Network error (connection refused, reset, DNS, body read)
    NetworkError {
        /// Error description
        error: String,
    },

    /// The request exceeded its timeout
    Timeout,

    /// Redirect error (loop, too many redirects)
    RedirectError {
        /// Error description
        error: String,
    },

    /// Body exceeded the configured size limit
    BodyTooLarge {
        /// The configured limit in bytes
        limit: usize,
    },
}

impl FetchResult {
    /// Returns true for failures worth another attempt
    pub fn is_retryable(&self) -> bool {
        match self {
            FetchResult::NetworkError { .. } => true,
            FetchResult::HttpError { status_code } => *status_code >= 500,
            _ => false,
        }
    }

    /// Short description used for logging and failure reasons
    pub fn describe(&self) -> String {
        match self {
            FetchResult::Success { status_code, .. } => format!("HTTP {}", status_code),
            FetchResult::ContentMismatch { content_type } => {
                format!("non-HTML content ({})", content_type)
            }
            FetchResult::HttpError { status_code } => format!("HTTP {}", status_code),
            FetchResult::NetworkError { error } => format!("network error: {}", error),
            FetchResult::Timeout => "request timed out".to_string(),
            FetchResult::RedirectError { error } => format!("redirect error: {}", error),
            FetchResult::BodyTooLarge { limit } => {
                format!("response body larger than {} bytes", limit)
            }
        }
    }
}

/// Builds an HTTP client with the job's user agent, headers, timeout and redirect limit
///
/// # Example
///
/// ```no_run
/// use web_parser::config::CrawlJob;
/// use web_parser::crawler::build_http_client;
///
/// let job = CrawlJob::new("https://example.com/".parse().unwrap());
/// let client = build_http_client(&job).unwrap();
/// ```
pub fn build_http_client(job: &CrawlJob) -> Result<Client, CrawlError> {
    let mut headers = HeaderMap::new();
    for (name, value) in &job.headers {
        let header_name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|_| ConfigError::InvalidHeader(format!("{}: {}", name, value)))?;
        let header_value = HeaderValue::from_str(value)
            .map_err(|_| ConfigError::InvalidHeader(format!("{}: {}", name, value)))?;
        headers.insert(header_name, header_value);
    }

    let client = Client::builder()
        .user_agent(job.user_agent.clone())
        .default_headers(headers)
        .timeout(job.request_timeout)
        .connect_timeout(job.request_timeout.min(Duration::from_secs(10)))
        .redirect(Policy::limited(job.max_redirects))
        .gzip(true)
        .brotli(true)
        .build()?;

    Ok(client)
}

/// Returns true if the Content-Type denotes an HTML document
///
/// A missing or empty header counts as HTML.
pub fn is_html_content_type(content_type: &str) -> bool {
    let mime = content_type
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_ascii_lowercase();

    mime.is_empty() || mime == "text/html" || mime == "application/xhtml+xml"
}

/// Fetches a URL once, without delay or retries
///
/// # Request Flow
///
/// 1. Send the GET request (redirects are followed by the client)
/// 2. Non-success status → `HttpError`
/// 3. Non-HTML Content-Type → `ContentMismatch`
/// 4. Read the body in chunks, stopping at `max_body_bytes`
/// 5. Decode it with the declared charset
///
/// # Arguments
///
/// * `client` - The HTTP client to use
/// * `url` - The URL to fetch
/// * `max_body_bytes` - Largest accepted body
pub async fn fetch_url(client: &Client, url: &Url, max_body_bytes: usize) -> FetchResult {
    let mut response = match client.get(url.as_str()).send().await {
        Ok(response) => response,
        Err(e) => return classify_error(&e),
    };

    let status = response.status();
    let final_url = response.url().to_string();

    if !status.is_success() {
        return FetchResult::HttpError {
            status_code: status.as_u16(),
        };
    }

    let content_type = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string();

    if !is_html_content_type(&content_type) {
        return FetchResult::ContentMismatch { content_type };
    }

    let declared_length = response
        .headers()
        .get(CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<usize>().ok());
    if declared_length.is_some_and(|len| len > max_body_bytes) {
        return FetchResult::BodyTooLarge {
            limit: max_body_bytes,
        };
    }

    let mut body = Vec::new();
    loop {
        match response.chunk().await {
            Ok(Some(chunk)) => {
                if body.len() + chunk.len() > max_body_bytes {
                    return FetchResult::BodyTooLarge {
                        limit: max_body_bytes,
                    };
                }
                body.extend_from_slice(&chunk);
            }
            Ok(None) => break,
            Err(e) => return classify_error(&e),
        }
    }

    let body = decode_body(&body, &content_type);

    FetchResult::Success {
        final_url,
        status_code: status.as_u16(),
        content_type: if content_type.is_empty() {
            "text/html".to_string()
        } else {
            content_type
        },
        body,
    }
}

/// Decodes a response body using the `charset` of its Content-Type
///
/// Unknown or missing charsets fall back to UTF-8.
fn decode_body(body: &[u8], content_type: &str) -> String {
    let encoding = content_type
        .split(';')
        .skip(1)
        .filter_map(|param| param.split_once('='))
        .find(|(name, _)| name.trim().eq_ignore_ascii_case("charset"))
        .and_then(|(_, label)| Encoding::for_label(label.trim().trim_matches('"').as_bytes()))
        .unwrap_or(UTF_8);

    let (text, _, _) = encoding.decode(body);
    text.into_owned()
}

/// Maps a reqwest error onto a fetch result
fn classify_error(error: &reqwest::Error) -> FetchResult {
    if error.is_timeout() {
        FetchResult::Timeout
    } else if error.is_redirect() {
        FetchResult::RedirectError {
            error: error.to_string(),
        }
    } else {
        FetchResult::NetworkError {
            error: error.to_string(),
        }
    }
}

/// Computes the backoff before retry number `attempt` (0-based)
pub fn backoff_delay(attempt: u32) -> Duration {
    RETRY_BACKOFF_BASE * 2u32.saturating_pow(attempt.min(16))
}

/// Fetcher shared by every worker
///
/// Holds the client and the per-request policy taken from the job. Cloning is
/// cheap; the underlying client is reference counted.
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: Client,
    delay: Duration,
    retries: u32,
    max_body_bytes: usize,
}

impl Fetcher {
    /// Creates a fetcher from the job settings
    pub fn new(job: &CrawlJob) -> Result<Self, CrawlError> {
        Ok(Self {
            client: build_http_client(job)?,
            delay: job.delay,
            retries: job.retries,
            max_body_bytes: job.max_body_bytes,
        })
    }

    /// The underlying HTTP client
    pub fn client(&self) -> &Client {
        &self.client
    }

    /// Fetches a URL, applying the politeness delay and retry policy
    ///
    /// # Retry Logic
    ///
    /// | Condition | Action |
    /// |-----------|--------|
    /// | Network error | Retry with backoff |
    /// | HTTP 5xx | Retry with backoff |
    /// | Timeout | Immediate failure |
    /// | HTTP 4xx | Immediate failure |
    /// | Redirect limit | Immediate failure |
    /// | Non-HTML | Skip |
    pub async fn fetch(&self, url: &Url) -> FetchResult {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        let mut attempt = 0;
        loop {
            let result = fetch_url(&self.client, url, self.max_body_bytes).await;
            if !result.is_retryable() || attempt >= self.retries {
                return result;
            }

            let backoff = backoff_delay(attempt);
            tracing::debug!(
                "Retrying {} after {} (attempt {}/{}, backoff {:?})",
                url,
                result.describe(),
                attempt + 1,
                self.retries,
                backoff
            );
            tokio::time::sleep(backoff).await;
            attempt += 1;
        }
    }
}
