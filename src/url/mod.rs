//! URL scheme of the judgment archive
//!
//! Every address the mirror touches hangs off a single `index.php` entry
//! point and is selected with a `go=` query value:
//!
//! - index pages: `?go=<year>/<month name>/indexfiles/index<n>.php`
//! - documents: `?go=<year>/<month name>/<serial>.php`
//! - continuation pages: the document URL plus `page=<n>`

mod serial;

pub use serial::{DocumentRef, SerialNo};

/// Lower-case month names as they appear in archive paths
pub const MONTH_NAMES: [&str; 12] = [
    "january",
    "february",
    "march",
    "april",
    "may",
    "june",
    "july",
    "august",
    "september",
    "october",
    "november",
    "december",
];

/// Returns the archive's name for a 1-based month number
pub fn month_name(month: u32) -> Option<&'static str> {
    let index = usize::try_from(month).ok()?.checked_sub(1)?;
    MONTH_NAMES.get(index).copied()
}

/// Builds archive URLs relative to a configured base
#[derive(Debug, Clone)]
pub struct ArchiveUrls {
    base: String,
}

impl ArchiveUrls {
    pub fn new(base: impl Into<String>) -> Self {
        Self { base: base.into() }
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    /// URL of the `page`-th index listing for a month
    ///
    /// Returns None when `month` is not in 1..=12.
    pub fn index_url(&self, year: i32, month: u32, page: u32) -> Option<String> {
        let name = month_name(month)?;
        Some(format!(
            "{}?go={}/{}/indexfiles/index{}.php",
            self.base, year, name, page
        ))
    }

    /// Canonical URL of a document given the fields of its listing payload
    pub fn document_url(&self, year: &str, month: &str, filename: &str) -> String {
        format!("{}?go={}/{}/{}", self.base, year, month, filename)
    }
}

/// URL of continuation page `page` of a document
///
/// Page 1 is the document URL itself; later pages add a `page` parameter.
pub fn continuation_url(document_url: &str, page: u32) -> String {
    if page <= 1 {
        return document_url.to_string();
    }
    let separator = if document_url.contains('?') { '&' } else { '?' };
    format!("{}{}page={}", document_url, separator, page)
}
