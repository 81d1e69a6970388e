//! Markdown document output
//!
//! Pages are rendered as one section each (`# title`, source URL, content),
//! followed by a statistics footer.

use crate::output::page::Page;
use crate::output::stats::CrawlStats;
use crate::output::traits::{sort_by_discovery, OutputError, OutputResult, OutputWriter};
use std::io::Write;

/// Buffered Markdown writer
pub struct MarkdownOutput<W: Write + Send> {
    writer: W,
    pages: Vec<Page>,
    stable_order: bool,
    finalized: bool,
}

impl<W: Write + Send> MarkdownOutput<W> {
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

impl<W: Write + Send> OutputWriter for MarkdownOutput<W> {
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

        if self.stable_order {
            sort_by_discovery(&mut self.pages);
        }

        let document = format_markdown_document(&self.pages, stats);
        self.writer.write_all(document.as_bytes())?;
        self.writer.flush()?;
        Ok(())
    }

    fn page_count(&self) -> usize {
        self.pages.len()
    }
}

/// Renders a single page as a Markdown section
pub fn format_page_section(page: &Page) -> String {
    let mut md = String::new();

    let title = page.title.trim();
    if title.is_empty() {
        md.push_str(&format!("# {}\n\n", page.url));
    } else {
        md.push_str(&format!("# {}\n\n", title));
    }

    md.push_str(&format!("- **Source**: <{}>\n", page.url));
    md.push_str(&format!("- **Depth**: {}\n", page.metadata.depth));
    md.push_str(&format!("- **Status**: {}\n", page.metadata.status));
    md.push_str(&format!(
        "- **Fetched**: {}\n\n",
        page.metadata.timestamp.to_rfc3339()
    ));

    let content = page.content.trim();
    if !content.is_empty() {
        md.push_str(content);
        md.push_str("\n\n");
    }

    md
}

/// Renders all pages followed by the statistics footer
pub fn format_markdown_document(pages: &[Page], stats: &CrawlStats) -> String {
    let mut md = String::new();

    for page in pages {
        md.push_str(&format_page_section(page));
        md.push_str("---\n\n");
    }

    md.push_str("## Crawl Statistics\n\n");
    md.push_str("| Metric | Count |\n");
    md.push_str("|--------|-------|\n");
    md.push_str(&format!("| Pages | {} |\n", pages.len()));
    md.push_str(&format!("| Successful | {} |\n", stats.successful));
    md.push_str(&format!("| Failed | {} |\n", stats.failed));
    md.push_str(&format!("| Skipped | {} |\n", stats.skipped));
    md.push_str(&format!("| Total | {} |\n", stats.total));

    md
}
