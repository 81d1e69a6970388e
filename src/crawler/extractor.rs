//! HTML content extraction
//!
//! This module turns a fetched HTML document into:
//! - The page title
//! - The main content, as plain text or Markdown
//! - Outbound links to follow (from `<a>` tags and canonical links)
//!
//! Extraction never fails. Malformed markup is parsed best-effort and any
//! missing part comes back as an empty string or an empty list.

use crate::config::{ContentMode, ExtractOptions};
use htmd::HtmlToMarkdown;
use scraper::{ElementRef, Html, Node, Selector};
use std::collections::HashSet;
use url::Url;

/// Tags that never carry readable content
const NON_VISUAL_TAGS: &[&str] = &["script", "style", "noscript", "template", "iframe", "svg"];

/// Page chrome removed when the content root is found heuristically
const CHROME_TAGS: &[&str] = &["nav", "header", "footer", "aside", "form"];

/// Candidate content roots, in order of preference
const CONTENT_ROOTS: &[&str] = &["main", "article", "[role=\"main\"]"];

/// Elements that start a new line in text mode
const BLOCK_TAGS: &[&str] = &[
    "address", "article", "aside", "blockquote", "body", "br", "dd", "details", "div", "dl",
    "dt", "fieldset", "figcaption", "figure", "footer", "form", "h1", "h2", "h3", "h4", "h5",
    "h6", "header", "hr", "li", "main", "nav", "ol", "p", "pre", "section", "summary", "table",
    "td", "th", "tr", "ul",
];

/// Extracted information from an HTML page
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedPage {
    /// Resolved page title; empty when none was found
    pub title: String,

    /// Main content in the configured mode
    pub content: String,

    /// Absolute http(s) links in document order, without duplicates
    pub links: Vec<String>,
}

/// Extracts title, content and links from an HTML document
///
/// # Link Extraction Rules
///
/// **Include:**
/// - `<a href="...">` tags anywhere in the document, including navigation
/// - `<link rel="canonical" href="...">`
///
/// **Exclude:**
/// - `<a href="..." download>`
/// - Empty and fragment-only hrefs
/// - `javascript:`, `mailto:`, `tel:` and `data:` links
/// - Anything that does not resolve to http or https
///
/// Relative links resolve against `<base href>` when present, otherwise
/// against `page_url`.
///
/// # Example
///
/// ```
/// use web_parser::config::ExtractOptions;
/// use web_parser::crawler::extract;
/// use url::Url;
///
/// let html = r#"<html><head><title>Test</title></head><body><a href="/page">Link</a></body></html>"#;
/// let page_url = Url::parse("https://example.com/").unwrap();
/// let page = extract(html, &page_url, &ExtractOptions::default());
/// assert_eq!(page.title, "Test");
/// assert_eq!(page.links, vec!["https://example.com/page".to_string()]);
/// ```
pub fn extract(html: &str, page_url: &Url, options: &ExtractOptions) -> ExtractedPage {
    let mut document = Html::parse_document(html);

    // Links and title come from the full document, before any pruning
    let base_url = document_base_url(&document, page_url);
    let links = extract_links(&document, &base_url);
    let title = extract_title(&document, &options.title_selector);

    let content_selector = options
        .content_selector
        .as_deref()
        .and_then(|css| Selector::parse(css).ok());
    let targeted = content_selector
        .as_ref()
        .is_some_and(|selector| document.root_element().select(selector).next().is_some());

    prune(&mut document, targeted, &options.exclude_selectors);

    let root = content_root(&document, content_selector.as_ref());
    let content = match options.mode {
        ContentMode::Text => element_text(root),
        ContentMode::Markdown => element_markdown(root),
    };

    ExtractedPage {
        title,
        content,
        links,
    }
}

/// Returns the `<base href>` URL if present and valid, otherwise the page URL
fn document_base_url(document: &Html, page_url: &Url) -> Url {
    let Ok(selector) = Selector::parse("base[href]") else {
        return page_url.clone();
    };

    document
        .root_element()
        .select(&selector)
        .next()
        .and_then(|element| element.value().attr("href"))
        .and_then(|href| page_url.join(href.trim()).ok())
        .filter(|url| url.scheme() == "http" || url.scheme() == "https")
        .unwrap_or_else(|| page_url.clone())
}

/// Resolves the title: the title selector, else the first `h1`, else the first `h2`
fn extract_title(document: &Html, title_selector: &str) -> String {
    [title_selector, "h1", "h2"]
        .into_iter()
        .filter_map(|css| Selector::parse(css).ok())
        .find_map(|selector| {
            document
                .root_element()
                .select(&selector)
                .map(|element| collapse_whitespace(&element.text().collect::<String>()))
                .find(|text| !text.is_empty())
        })
        .unwrap_or_default()
}

/// Extracts all valid links from the HTML document
pub fn extract_links(document: &Html, base_url: &Url) -> Vec<String> {
    let mut links = Vec::new();
    let mut seen = HashSet::new();

    let Ok(selector) = Selector::parse("a[href], link[rel=\"canonical\"][href]") else {
        return links;
    };

    for element in document.root_element().select(&selector) {
        // Skip if it has the download attribute
        if element.value().name() == "a" && element.value().attr("download").is_some() {
            continue;
        }

        if let Some(href) = element.value().attr("href") {
            if let Some(absolute_url) = resolve_link(href, base_url) {
                if seen.insert(absolute_url.clone()) {
                    links.push(absolute_url);
                }
            }
        }
    }

    links
}

/// Resolves a link href to an absolute URL and validates it
///
/// Returns None if the link should be excluded:
/// - javascript:, mailto:, tel: schemes
/// - data: URIs
/// - Empty or fragment-only hrefs
/// - Invalid URLs
/// - Non-HTTP(S) URLs after resolution
pub fn resolve_link(href: &str, base_url: &Url) -> Option<String> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    let lower = href.to_ascii_lowercase();
    if ["javascript:", "mailto:", "tel:", "data:"]
        .iter()
        .any(|scheme| lower.starts_with(scheme))
    {
        return None;
    }

    let mut absolute_url = base_url.join(href).ok()?;
    if absolute_url.scheme() != "http" && absolute_url.scheme() != "https" {
        return None;
    }

    absolute_url.set_fragment(None);
    Some(absolute_url.to_string())
}

/// Detaches boilerplate elements from the document tree
///
/// When the content selector targets an element, page chrome is kept since
/// the caller asked for that element explicitly.
fn prune(document: &mut Html, targeted: bool, exclude_selectors: &[String]) {
    let mut selectors: Vec<Selector> = Vec::new();

    let mut tags: Vec<&str> = NON_VISUAL_TAGS.to_vec();
    if !targeted {
        tags.extend_from_slice(CHROME_TAGS);
    }
    if let Ok(selector) = Selector::parse(&tags.join(", ")) {
        selectors.push(selector);
    }

    selectors.extend(
        exclude_selectors
            .iter()
            .filter_map(|css| Selector::parse(css).ok()),
    );

    let ids: Vec<_> = selectors
        .iter()
        .flat_map(|selector| {
            document
                .root_element()
                .select(selector)
                .map(|element| element.id())
                .collect::<Vec<_>>()
        })
        .collect();

    for id in ids {
        if let Some(mut node) = document.tree.get_mut(id) {
            node.detach();
        }
    }
}

/// Picks the content root of the pruned document
fn content_root<'a>(document: &'a Html, content_selector: Option<&Selector>) -> ElementRef<'a> {
    let root = document.root_element();

    if let Some(element) = content_selector.and_then(|selector| root.select(selector).next()) {
        return element;
    }

    CONTENT_ROOTS
        .iter()
        .chain(std::iter::once(&"body"))
        .filter_map(|css| Selector::parse(css).ok())
        .find_map(|selector| root.select(&selector).next())
        .unwrap_or(root)
}

/// Renders an element as whitespace-collapsed text, one block per line
pub fn element_text(element: ElementRef) -> String {
    let mut buffer = TextBuffer::default();
    collect_text(element, &mut buffer);
    buffer.finish()
}

fn collect_text(element: ElementRef, buffer: &mut TextBuffer) {
    for child in element.children() {
        match child.value() {
            Node::Text(text) => buffer.push(text),
            Node::Element(el) => {
                if let Some(child_element) = ElementRef::wrap(child) {
                    let block = BLOCK_TAGS.contains(&el.name());
                    if block {
                        buffer.break_line();
                    }
                    collect_text(child_element, buffer);
                    if block {
                        buffer.break_line();
                    }
                }
            }
            _ => {}
        }
    }
}

/// Accumulates inline text and emits a line at each block boundary
#[derive(Default)]
struct TextBuffer {
    lines: Vec<String>,
    current: String,
}

impl TextBuffer {
    fn push(&mut self, text: &str) {
        self.current.push_str(text);
    }

    fn break_line(&mut self) {
        let line = collapse_whitespace(&self.current);
        if !line.is_empty() {
            self.lines.push(line);
        }
        self.current.clear();
    }

    fn finish(mut self) -> String {
        self.break_line();
        self.lines.join("\n")
    }
}

/// Renders an element as Markdown, falling back to text if conversion fails
fn element_markdown(element: ElementRef) -> String {
    let converter = HtmlToMarkdown::builder()
        .skip_tags(NON_VISUAL_TAGS.to_vec())
        .build();

    match converter.convert(&element.html()) {
        Ok(markdown) => markdown.trim().to_string(),
        Err(e) => {
            tracing::debug!("Markdown conversion failed, using text: {}", e);
            element_text(element)
        }
    }
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
