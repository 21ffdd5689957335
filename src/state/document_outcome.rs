use std::fmt;

/// Result of handing one document to a worker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocumentOutcome {
    /// Text extracted and written; ledger row appended
    Saved,

    /// Output file already existed, nothing fetched
    Skipped,

    /// Extraction produced no text; retried on the next run
    Empty,

    /// Run was cancelled before this document was started
    Cancelled,
}

impl DocumentOutcome {
    /// Returns true if the document was downloaded during this run
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Saved)
    }

    /// Returns true if a later run should try this document again
    pub fn needs_retry(&self) -> bool {
        matches!(self, Self::Empty | Self::Cancelled)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Saved => "saved",
            Self::Skipped => "skipped",
            Self::Empty => "empty",
            Self::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for DocumentOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
