use regex::Regex;
use std::fmt;
use std::sync::OnceLock;

fn serial_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"/(\d+)\.php").expect("serial pattern is valid"))
}

/// Identifier a document's output filename is derived from
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SerialNo {
    /// Digits taken from the document's `<digits>.php` filename
    Number(String),

    /// 1-based position in the month's discovery order, used when the URL
    /// carries no numeric filename
    Ordinal(usize),
}

impl SerialNo {
    /// Extracts the serial from a document URL, falling back to `ordinal`
    pub fn from_url(url: &str, ordinal: usize) -> Self {
        serial_pattern()
            .captures(url)
            .and_then(|caps| caps.get(1))
            .map(|m| Self::Number(m.as_str().to_string()))
            .unwrap_or(Self::Ordinal(ordinal))
    }
}

impl fmt::Display for SerialNo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(digits) => f.write_str(digits),
            Self::Ordinal(n) => write!(f, "unknown_{}", n),
        }
    }
}

/// One remote document discovered on an index page
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DocumentRef {
    pub url: String,
    pub serial: SerialNo,
}

impl DocumentRef {
    pub fn new(url: impl Into<String>, ordinal: usize) -> Self {
        let url = url.into();
        let serial = SerialNo::from_url(&url, ordinal);
        Self { url, serial }
    }
}
