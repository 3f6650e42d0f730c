//! Content parsers for extracting text and links
//!
//! This module handles:
//! - The parser capability consumed by the crawl pipeline
//! - Selecting a parser for a downloaded resource (by MIME type, then extension)
//! - HTML parsing: title and body text, `<a href>` links
//! - Plain text pass-through
//!
//! Parsers for other document families plug in by implementing
//! [`ParserRegistry`].

use scraper::{ElementRef, Html, Selector};
use std::collections::BTreeSet;
use thiserror::Error;
use url::Url;

/// Elements whose text is never part of the extracted content
const SKIPPED_ELEMENTS: &[&str] = &["script", "style", "noscript", "template"];

/// How many leading bytes are inspected when sniffing for binary content
const SNIFF_LEN: usize = 1024;

const HTML_MIME_TYPES: &[&str] = &["text/html", "application/xhtml+xml"];
const HTML_EXTENSIONS: &[&str] = &["html", "htm", "xhtml", "php", "asp", "aspx", "jsp", "shtml"];
const TEXT_MIME_TYPES: &[&str] = &["text/plain"];
const TEXT_EXTENSIONS: &[&str] = &["txt"];

/// Errors raised while extracting text
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("No text content found")]
    Empty,

    #[error("Malformed content: {0}")]
    Malformed(String),
}

/// A downloaded resource offered to the parser registry
#[derive(Debug, Clone, Copy)]
pub struct Resource<'a> {
    /// URL the bytes were read from; relative links resolve against it
    pub url: &'a Url,

    /// Extension chosen for the original file (no dot)
    pub extension: &'a str,

    /// MIME type reported by the server, without parameters
    pub content_type: Option<&'a str>,

    pub bytes: &'a [u8],
}

/// Text and link extraction for one resource
pub trait ContentParser: Send {
    /// Returns true if the resource holds something this parser can read
    fn can_be_parsed(&self) -> bool;

    /// Extracts the text content
    fn content(&self) -> Result<String, ParseError>;

    /// Absolute http(s) URLs linked from the resource
    fn links(&self) -> BTreeSet<Url>;
}

/// Chooses a parser for a downloaded resource
pub trait ParserRegistry: Send + Sync {
    /// Returns a parser for the resource, or `None` if no parser handles it
    fn parser_for(&self, resource: &Resource<'_>) -> Option<Box<dyn ContentParser>>;
}

/// Registry with the built-in HTML and plain text parsers
///
/// The MIME type decides when the server sent one; the file extension is
/// used otherwise.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultParserRegistry;

impl ParserRegistry for DefaultParserRegistry {
    fn parser_for(&self, resource: &Resource<'_>) -> Option<Box<dyn ContentParser>> {
        let is_html = match resource.content_type {
            Some(mime) => HTML_MIME_TYPES.contains(&mime),
            None => HTML_EXTENSIONS.contains(&resource.extension),
        };
        if is_html {
            return Some(Box::new(HtmlParser::new(resource.bytes, resource.url)));
        }

        let is_text = match resource.content_type {
            Some(mime) => TEXT_MIME_TYPES.contains(&mime),
            None => TEXT_EXTENSIONS.contains(&resource.extension),
        };
        if is_text {
            return Some(Box::new(PlainTextParser::new(resource.bytes)));
        }

        None
    }
}

/// Parser for HTML pages
///
/// The document is parsed once on construction; `scraper::Html` itself is
/// not `Send`, so only the extracted pieces are kept.
#[derive(Debug, Clone)]
pub struct HtmlParser {
    readable: bool,
    title: Option<String>,
    text: String,
    links: BTreeSet<Url>,
}

impl HtmlParser {
    /// Parses HTML bytes, resolving relative links against `base_url`
    ///
    /// Invalid UTF-8 sequences are replaced rather than rejected.
    ///
    /// # Example
    ///
    /// ```
    /// use kgs_crawl::crawler::parser::{ContentParser, HtmlParser};
    /// use url::Url;
    ///
    /// let html = br#"<html><head><title>Test</title></head><body><a href="/page">Link</a></body></html>"#;
    /// let base_url = Url::parse("https://example.com/").unwrap();
    /// let parser = HtmlParser::new(html, &base_url);
    ///
    /// assert_eq!(parser.content().unwrap(), "Test\n\nLink");
    /// assert_eq!(parser.links().len(), 1);
    /// ```
    pub fn new(bytes: &[u8], base_url: &Url) -> Self {
        let readable = looks_textual(bytes);
        if !readable {
            return Self {
                readable,
                title: None,
                text: String::new(),
                links: BTreeSet::new(),
            };
        }

        let html = String::from_utf8_lossy(bytes);
        let document = Html::parse_document(&html);

        Self {
            readable,
            title: extract_title(&document),
            text: extract_body_text(&document),
            links: extract_links(&document, base_url),
        }
    }

    /// The page title, if the page has a non-empty one
    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }
}

impl ContentParser for HtmlParser {
    fn can_be_parsed(&self) -> bool {
        self.readable
    }

    /// Returns `title\n\nbody text`, or just the body text without a title
    fn content(&self) -> Result<String, ParseError> {
        if !self.readable {
            return Err(ParseError::Malformed("binary content".to_string()));
        }

        let content = match &self.title {
            Some(title) if self.text.is_empty() => title.clone(),
            Some(title) => format!("{}\n\n{}", title, self.text),
            None => self.text.clone(),
        };

        if content.trim().is_empty() {
            return Err(ParseError::Empty);
        }
        Ok(content)
    }

    fn links(&self) -> BTreeSet<Url> {
        self.links.clone()
    }
}

/// Parser for plain UTF-8 text; text files have no links
#[derive(Debug, Clone)]
pub struct PlainTextParser {
    text: Result<String, std::str::Utf8Error>,
}

impl PlainTextParser {
    pub fn new(bytes: &[u8]) -> Self {
        Self {
            text: std::str::from_utf8(bytes).map(str::to_string),
        }
    }
}

impl ContentParser for PlainTextParser {
    fn can_be_parsed(&self) -> bool {
        matches!(&self.text, Ok(text) if looks_textual(text.as_bytes()))
    }

    fn content(&self) -> Result<String, ParseError> {
        match &self.text {
            Ok(text) if text.trim().is_empty() => Err(ParseError::Empty),
            Ok(text) => Ok(text.trim().to_string()),
            Err(e) => Err(ParseError::Malformed(e.to_string())),
        }
    }

    fn links(&self) -> BTreeSet<Url> {
        BTreeSet::new()
    }
}

/// Non-empty and free of NUL bytes near the start
fn looks_textual(bytes: &[u8]) -> bool {
    !bytes.is_empty() && !bytes[..bytes.len().min(SNIFF_LEN)].contains(&0)
}

/// Extracts the page title from the HTML document
fn extract_title(document: &Html) -> Option<String> {
    let title_selector = Selector::parse("title").ok()?;

    document
        .select(&title_selector)
        .next()
        .map(|element| collapse_whitespace(&element.text().collect::<String>()))
        .filter(|s| !s.is_empty())
}

/// Extracts visible body text with whitespace collapsed
///
/// Documents without a `<body>` fall back to the whole tree.
fn extract_body_text(document: &Html) -> String {
    let body_selector = Selector::parse("body").ok();
    let body = body_selector
        .as_ref()
        .and_then(|selector| document.select(selector).next())
        .unwrap_or_else(|| document.root_element());

    let mut text = String::new();
    for node in body.descendants() {
        let Some(chunk) = node.value().as_text() else {
            continue;
        };

        let hidden = node.ancestors().any(|ancestor| {
            ancestor
                .value()
                .as_element()
                .map_or(false, |element| SKIPPED_ELEMENTS.contains(&element.name()))
        });
        if hidden {
            continue;
        }

        for word in chunk.split_whitespace() {
            if !text.is_empty() {
                text.push(' ');
            }
            text.push_str(word);
        }
    }

    text
}

/// Extracts all valid links from the HTML document
fn extract_links(document: &Html, base_url: &Url) -> BTreeSet<Url> {
    let mut links = BTreeSet::new();

    if let Ok(a_selector) = Selector::parse("a[href]") {
        for element in document.select(&a_selector) {
            // Skip if it has the download attribute
            if element.value().attr("download").is_some() {
                continue;
            }

            if let Some(link) = link_target(element, base_url) {
                links.insert(link);
            }
        }
    }

    links
}

fn link_target(element: ElementRef<'_>, base_url: &Url) -> Option<Url> {
    element
        .value()
        .attr("href")
        .and_then(|href| resolve_link(href, base_url))
}

/// Resolves a link href to an absolute URL and validates it
///
/// Returns None if the link should be excluded:
/// - javascript:, mailto:, tel: schemes
/// - data: URIs
/// - fragment-only links
/// - Invalid URLs
/// - Non-HTTP(S) URLs after resolution
fn resolve_link(href: &str, base_url: &Url) -> Option<Url> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    let lowered = href.to_ascii_lowercase();
    if ["javascript:", "mailto:", "tel:", "data:"]
        .iter()
        .any(|scheme| lowered.starts_with(scheme))
    {
        return None;
    }

    let mut absolute_url = base_url.join(href).ok()?;
    if absolute_url.scheme() != "http" && absolute_url.scheme() != "https" {
        return None;
    }

    absolute_url.set_fragment(None);
    Some(absolute_url)
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}
