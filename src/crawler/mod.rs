//! Crawler module for web page fetching and processing
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching with retry logic
//! - HTML content and link extraction
//! - The crawl frontier
//! - Overall crawl coordination

mod coordinator;
mod extractor;
mod fetcher;
mod frontier;

pub use coordinator::{Coordinator, CrawlReport, ProgressSnapshot, Termination};
pub use extractor::{extract, extract_links, resolve_link, ExtractedPage};
pub use fetcher::{
    backoff_delay, build_http_client, fetch_url, is_html_content_type, FetchResult, Fetcher,
};
pub use frontier::{Admission, Frontier, FrontierEntry, WorkOutcome};

use crate::config::CrawlJob;
use crate::output::OutputWriter;
use crate::CrawlError;
use std::future::Future;

/// Runs a complete crawl operation
///
/// This is the main entry point for starting a crawl. It will:
/// 1. Build the HTTP client and frontier
/// 2. Seed the frontier
/// 3. Fetch pages with a pool of workers
/// 4. Extract content and follow links
/// 5. Write pages and statistics through `writer`
///
/// The crawl stops early when `shutdown` completes.
///
/// # Example
///
/// ```no_run
/// use web_parser::config::CrawlJob;
/// use web_parser::crawler::crawl;
/// use web_parser::output::MemoryOutput;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let job = CrawlJob::new("https://example.com/".parse()?);
/// let mut output = MemoryOutput::new();
/// let report = crawl(job, &mut output, std::future::pending()).await?;
/// println!("{} pages", report.pages_written);
/// # Ok(())
/// # }
/// ```
pub async fn crawl<F>(
    job: CrawlJob,
    writer: &mut dyn OutputWriter,
    shutdown: F,
) -> Result<CrawlReport, CrawlError>
where
    F: Future<Output = ()>,
{
    Coordinator::new(job)?.run(writer, shutdown).await
}
