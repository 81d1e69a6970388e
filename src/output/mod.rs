//! Output module for writing crawl results
//!
//! This module handles:
//! - The page and envelope shapes read by callers
//! - Buffered and streaming JSON writers
//! - Markdown documents
//! - Crawl statistics

mod json;
mod markdown;
mod page;
pub mod stats;
mod traits;

pub use json::{JsonOutput, StreamingJsonOutput};
pub use markdown::{format_markdown_document, format_page_section, MarkdownOutput};
pub use page::{Envelope, Page, PageMetadata, StreamSummary};
pub use stats::{log_statistics, CrawlStats};
pub use traits::{MemoryOutput, OutputError, OutputResult, OutputWriter};

use crate::config::{OutputFormat, OutputOptions};
use std::fs::File;
use std::io::{self, BufWriter, Write};

/// Opens the configured sink: a file path, or stdout for `None` and `-`
pub fn open_sink(options: &OutputOptions) -> OutputResult<Box<dyn Write + Send>> {
    match &options.path {
        Some(path) if path.as_os_str() != "-" => {
            let file = File::create(path)?;
            Ok(Box::new(BufWriter::new(file)))
        }
        _ => Ok(Box::new(BufWriter::new(io::stdout()))),
    }
}

/// Creates the writer for the configured format and sink
///
/// Streaming only applies to JSON; a Markdown document is always buffered.
pub fn create_writer(options: &OutputOptions) -> OutputResult<Box<dyn OutputWriter>> {
    let sink = open_sink(options)?;
    Ok(writer_for(options, sink))
}

/// Wraps an already opened sink in the configured writer
pub fn writer_for(
    options: &OutputOptions,
    sink: Box<dyn Write + Send>,
) -> Box<dyn OutputWriter> {
    match options.format {
        OutputFormat::Json if options.stream => Box::new(StreamingJsonOutput::new(sink)),
        OutputFormat::Json => Box::new(JsonOutput::new(sink, options.stable_order)),
        OutputFormat::Markdown => Box::new(MarkdownOutput::new(sink, options.stable_order)),
    }
}
