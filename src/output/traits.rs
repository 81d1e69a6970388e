//! Output writer trait and error types

use crate::output::page::Page;
use crate::output::stats::CrawlStats;
use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Failed to serialize output: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Output already finalized")]
    Finalized,
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// Trait for output writers
///
/// The coordinator owns exactly one writer. Each successful page is handed to
/// it once, in completion order; `finalize` is called once at shutdown with
/// the final statistics, including after a deadline or cancellation.
pub trait OutputWriter: Send {
    /// Records a successfully extracted page
    fn record_page(&mut self, page: Page) -> OutputResult<()>;

    /// Writes any buffered output and the statistics, then flushes the sink
    fn finalize(&mut self, stats: &CrawlStats) -> OutputResult<()>;

    /// Number of pages recorded so far
    fn page_count(&self) -> usize;
}

/// Collects pages in memory; used by tests and library callers
#[derive(Debug, Default)]
pub struct MemoryOutput {
    pub pages: Vec<Page>,
    pub stats: Option<CrawlStats>,
}

impl MemoryOutput {
    pub fn new() -> Self {
        Self::default()
    }
}

impl OutputWriter for MemoryOutput {
    fn record_page(&mut self, page: Page) -> OutputResult<()> {
        if self.stats.is_some() {
            return Err(OutputError::Finalized);
        }
        self.pages.push(page);
        Ok(())
    }

    fn finalize(&mut self, stats: &CrawlStats) -> OutputResult<()> {
        self.stats = Some(*stats);
        Ok(())
    }

    fn page_count(&self) -> usize {
        self.pages.len()
    }
}

/// Sorts pages by the order in which their URLs were discovered
pub fn sort_by_discovery(pages: &mut [Page]) {
    pages.sort_by_key(|page| page.discovery_order);
}
