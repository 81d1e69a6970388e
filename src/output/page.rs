//! Page and envelope types
//!
//! These are the only shapes that cross the process boundary. The caller reads
//! `pages[].url`, `pages[].title` and `pages[].content`; everything else lives
//! under `metadata`, which carries an open-ended `extra` map flattened into it.

use crate::output::stats::CrawlStats;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A successfully fetched and extracted page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page {
    /// The canonical URL that was dispatched (not the post-redirect URL)
    pub url: String,

    /// Resolved page title; empty when none was found
    pub title: String,

    /// Extracted main content (plain text or Markdown)
    pub content: String,

    /// Fetch metadata
    pub metadata: PageMetadata,

    /// Outbound absolute links, before frontier filtering
    #[serde(skip)]
    pub links: Vec<String>,

    /// Order in which the URL was admitted to the frontier
    #[serde(skip)]
    pub discovery_order: u64,
}

/// Metadata attached to each page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageMetadata {
    /// Link hops from the seed
    pub depth: u32,

    /// HTTP status of the final response
    pub status: u16,

    /// When the response was received
    pub timestamp: DateTime<Utc>,

    /// Content-Type header value
    pub content_type: String,

    /// Additional fields, e.g. `final_url` after a redirect
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl Page {
    /// Adds an extra metadata field
    pub fn with_extra(mut self, key: &str, value: impl Into<serde_json::Value>) -> Self {
        self.metadata.extra.insert(key.to_string(), value.into());
        self
    }
}

/// The buffered JSON document written at the end of a crawl
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope {
    pub pages: Vec<Page>,
    pub total_pages: usize,
    pub timestamp: DateTime<Utc>,
    pub stats: CrawlStats,
}

/// The final line of a streamed crawl
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamSummary {
    pub total_pages: usize,
    pub timestamp: DateTime<Utc>,
    pub stats: CrawlStats,
}
