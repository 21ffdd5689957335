//! Storage module for the on-disk mirror
//!
//! This module owns everything the mirror writes:
//! - The per-year directory layout and document filenames
//! - Document text files, written so a half-finished file never appears
//!   under its final name
//! - The per-year metadata ledger (`metadata.csv`)
//!
//! The presence of a document's text file is the sole record that it has
//! been captured; the ledger is descriptive only.

mod artifact;
mod layout;
mod ledger;

pub use artifact::{write_document, PARTIAL_SUFFIX};
pub use layout::OutputLayout;
pub use ledger::{read_rows, Ledger, LedgerError, LedgerResult, LedgerRow, LEDGER_FILE, LEDGER_HEADER};
