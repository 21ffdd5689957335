//! HTML parser for index listings and document pages
//!
//! This module turns raw archive HTML into owned values:
//! - Document links from the `showpage(...)` handlers of an index page
//! - Title and date metadata from a document's `<title>`
//! - The text blocks of one document page's content container
//!
//! Parsed trees are dropped before returning so callers can hold the results
//! across await points.

use crate::url::ArchiveUrls;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use sha2::{Digest, Sha256};
use std::sync::OnceLock;

/// Marker the archive prints past the last index page of a month
pub const END_OF_LISTING: &str = "nothing more to show";

/// Value used for metadata that could not be recovered
pub const UNKNOWN: &str = "Unknown";

fn showpage_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"showpage\('(\d+)','(\w+)','(\d+\.php)'").expect("showpage pattern is valid")
    })
}

fn trailing_date_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\[([^\[\]]*)\]$").expect("date pattern is valid"))
}

/// Links found on one index page
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndexPage {
    /// Document URLs in page order, possibly with repeats
    pub links: Vec<String>,

    /// The page carried the end-of-listing marker
    pub exhausted: bool,
}

/// Title and date of a document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentMetadata {
    pub title: String,
    pub date: String,
}

impl Default for DocumentMetadata {
    fn default() -> Self {
        Self {
            title: UNKNOWN.to_string(),
            date: UNKNOWN.to_string(),
        }
    }
}

/// Text recovered from one page's content container
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageContent {
    /// SHA-256 of the container's serialized HTML
    pub digest: String,

    /// Paragraph and table blocks in document order
    pub blocks: Vec<String>,

    /// The end-of-document marker was reached on this page
    pub ended: bool,
}

/// One parsed document page
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentPage {
    pub title: Option<String>,

    /// None when the page has no content container
    pub content: Option<PageContent>,
}

/// Extracts document links from an index page
///
/// Links are read from `<a onclick="showpage('<year>','<month>','<n>.php')">`
/// handlers and rebuilt as canonical document URLs. A page carrying the
/// end-of-listing marker yields no links.
///
/// # Example
///
/// ```
/// use archive_mirror::crawler::parse_index_page;
/// use archive_mirror::url::ArchiveUrls;
///
/// let urls = ArchiveUrls::new("https://example.com/index.php");
/// let html = r#"<a onclick="showpage('2020','may','17.php')">A v. B</a>"#;
/// let page = parse_index_page(html, &urls);
/// assert_eq!(page.links, vec!["https://example.com/index.php?go=2020/may/17.php"]);
/// ```
pub fn parse_index_page(html: &str, urls: &ArchiveUrls) -> IndexPage {
    if html.contains(END_OF_LISTING) {
        return IndexPage {
            links: Vec::new(),
            exhausted: true,
        };
    }

    let document = Html::parse_document(html);
    let mut links = Vec::new();

    if let Ok(anchor_selector) = Selector::parse("a[onclick]") {
        for element in document.select(&anchor_selector) {
            let Some(onclick) = element.value().attr("onclick") else {
                continue;
            };
            if let Some(caps) = showpage_pattern().captures(onclick) {
                links.push(urls.document_url(&caps[1], &caps[2], &caps[3]));
            }
        }
    }

    IndexPage {
        links,
        exhausted: false,
    }
}

/// Splits a page title of the form `"<title> [<date>] | <site>"`
///
/// Only the part before the first `|` is considered. A trailing bracketed
/// token becomes the date; without one the date stays [`UNKNOWN`].
pub fn parse_title_metadata(page_title: &str) -> DocumentMetadata {
    let main = page_title.split('|').next().unwrap_or_default().trim();
    if main.is_empty() {
        return DocumentMetadata::default();
    }

    match trailing_date_pattern().captures(main) {
        Some(caps) => {
            let (Some(whole), Some(date)) = (caps.get(0), caps.get(1)) else {
                return DocumentMetadata::default();
            };
            let date = date.as_str().trim();
            DocumentMetadata {
                title: main[..whole.start()].trim().to_string(),
                date: if date.is_empty() { UNKNOWN } else { date }.to_string(),
            }
        }
        None => DocumentMetadata {
            title: main.to_string(),
            date: UNKNOWN.to_string(),
        },
    }
}

/// Parses a document page into its title and content blocks
///
/// Direct children of `div#contentarea` are read in order:
/// - `<p>` contributes its whitespace-normalized text
/// - `<table>` contributes one line per row, cells joined by `" | "`
/// - `<br clear="all">` marks the end of the document; nothing after it is read
pub fn parse_document_page(html: &str) -> DocumentPage {
    let document = Html::parse_document(html);

    DocumentPage {
        title: extract_title(&document),
        content: extract_content(&document),
    }
}

/// Extracts the page title from the HTML document
fn extract_title(document: &Html) -> Option<String> {
    let title_selector = Selector::parse("title").ok()?;

    document
        .select(&title_selector)
        .next()
        .map(|element| element.text().collect::<String>().trim().to_string())
        .filter(|s| !s.is_empty())
}

fn extract_content(document: &Html) -> Option<PageContent> {
    let container_selector = Selector::parse("div#contentarea").ok()?;
    let container = document.select(&container_selector).next()?;

    let digest = hex::encode(Sha256::digest(container.html().as_bytes()));
    let mut blocks = Vec::new();
    let mut ended = false;

    for child in container.children().filter_map(ElementRef::wrap) {
        match child.value().name() {
            "p" => {
                let text = element_text(child);
                if !text.is_empty() {
                    blocks.push(text);
                }
            }
            "table" => {
                let text = table_text(child);
                if !text.trim().is_empty() {
                    blocks.push(text);
                }
            }
            "br" if is_end_marker(child) => {
                ended = true;
                break;
            }
            _ => {}
        }
    }

    Some(PageContent {
        digest,
        blocks,
        ended,
    })
}

fn is_end_marker(element: ElementRef) -> bool {
    element
        .value()
        .attr("clear")
        .is_some_and(|v| v.trim().eq_ignore_ascii_case("all"))
}

/// Text nodes of an element, trimmed and joined with single spaces
fn element_text(element: ElementRef) -> String {
    element
        .text()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Renders a table as pipe-delimited rows framed by blank lines
fn table_text(table: ElementRef) -> String {
    let (Ok(row_selector), Ok(cell_selector)) = (Selector::parse("tr"), Selector::parse("td, th"))
    else {
        return String::new();
    };

    let rows: Vec<String> = table
        .select(&row_selector)
        .map(|row| {
            row.select(&cell_selector)
                .map(element_text)
                .collect::<Vec<_>>()
                .join(" | ")
        })
        .collect();

    format!("\n{}\n", rows.join("\n"))
}
