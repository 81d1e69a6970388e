//! JSON output writers
//!
//! `JsonOutput` buffers every page and writes one envelope at the end, so the
//! sink only ever holds a complete document. `StreamingJsonOutput` writes one
//! page object per line as pages complete, followed by a summary line.

use crate::output::page::{Envelope, Page, StreamSummary};
use crate::output::stats::CrawlStats;
use crate::output::traits::{sort_by_discovery, OutputError, OutputResult, OutputWriter};
use chrono::Utc;
use std::io::Write;

/// Buffered JSON envelope writer
pub struct JsonOutput<W: Write + Send> {
    writer: W,
    pages: Vec<Page>,
    stable_order: bool,
    finalized: bool,
}

impl<W: Write + Send> JsonOutput<W> {
    /// Creates a writer; `stable_order` sorts pages by discovery order
    pub fn new(writer: W, stable_order: bool) -> Self {
        Self {
            writer,
            pages: Vec::new(),
            stable_order,
            finalized: false,
        }
    }

    /// Consumes the writer and returns the underlying sink
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write + Send> OutputWriter for JsonOutput<W> {
    fn record_page(&mut self, page: Page) -> OutputResult<()> {
        if self.finalized {
            return Err(OutputError::Finalized);
        }
        self.pages.push(page);
        Ok(())
    }

    fn finalize(&mut self, stats: &CrawlStats) -> OutputResult<()> {
        if self.finalized {
            return Err(OutputError::Finalized);
        }
        self.finalized = true;

        let mut pages = std::mem::take(&mut self.pages);
        if self.stable_order {
            sort_by_discovery(&mut pages);
        }

        let envelope = Envelope {
            total_pages: pages.len(),
            pages,
            timestamp: Utc::now(),
            stats: *stats,
        };

        serde_json::to_writer_pretty(&mut self.writer, &envelope)?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()?;

        // Keep the count available for reporting after the flush
        self.pages = envelope.pages;
        Ok(())
    }

    fn page_count(&self) -> usize {
        self.pages.len()
    }
}

/// Newline-delimited JSON writer
pub struct StreamingJsonOutput<W: Write + Send> {
    writer: W,
    written: usize,
    finalized: bool,
}

impl<W: Write + Send> StreamingJsonOutput<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            written: 0,
            finalized: false,
        }
    }

    /// Consumes the writer and returns the underlying sink
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write + Send> OutputWriter for StreamingJsonOutput<W> {
    fn record_page(&mut self, page: Page) -> OutputResult<()> {
        if self.finalized {
            return Err(OutputError::Finalized);
        }
        serde_json::to_writer(&mut self.writer, &page)?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()?;
        self.written += 1;
        Ok(())
    }

    fn finalize(&mut self, stats: &CrawlStats) -> OutputResult<()> {
        if self.finalized {
            return Err(OutputError::Finalized);
        }
        self.finalized = true;

        let summary = StreamSummary {
            total_pages: self.written,
            timestamp: Utc::now(),
            stats: *stats,
        };
        serde_json::to_writer(&mut self.writer, &summary)?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()?;
        Ok(())
    }

    fn page_count(&self) -> usize {
        self.written
    }
}
