//! Append-only metadata ledger
//!
//! One `metadata.csv` per year, shared by every month of that year. Rows are
//! appended by many workers at once, so each append takes the writer lock,
//! writes a single record and flushes it to stable storage before releasing.

use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use thiserror::Error;

/// Ledger filename inside each year directory
pub const LEDGER_FILE: &str = "metadata.csv";

/// Header row written when a ledger is first created
pub const LEDGER_HEADER: [&str; 5] = ["SerialNo", "Title", "Date", "Filename", "URL"];

/// Errors that can occur while writing or reading a ledger
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Ledger already closed: {0}")]
    Closed(PathBuf),
}

/// Result type for ledger operations
pub type LedgerResult<T> = Result<T, LedgerError>;

/// One captured document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerRow {
    #[serde(rename = "SerialNo")]
    pub serial_no: String,

    #[serde(rename = "Title")]
    pub title: String,

    #[serde(rename = "Date")]
    pub date: String,

    #[serde(rename = "Filename")]
    pub filename: String,

    #[serde(rename = "URL")]
    pub url: String,
}

/// Handle on a year's ledger file, open in append mode
#[derive(Debug)]
pub struct Ledger {
    path: PathBuf,
    writer: Mutex<Option<csv::Writer<File>>>,
}

impl Ledger {
    /// Opens (or creates) the ledger inside `year_dir`
    ///
    /// The header is written only when the file is new or empty, so
    /// reopening across months and runs never duplicates it.
    pub fn open(year_dir: &Path) -> LedgerResult<Self> {
        let path = year_dir.join(LEDGER_FILE);
        let is_new = std::fs::metadata(&path)
            .map(|meta| meta.len() == 0)
            .unwrap_or(true);

        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);

        if is_new {
            writer.write_record(LEDGER_HEADER)?;
            writer.flush()?;
        }

        tracing::debug!("Opened ledger {}", path.display());

        Ok(Self {
            path,
            writer: Mutex::new(Some(writer)),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Appends one row and forces it to disk
    pub fn append(&self, row: &LedgerRow) -> LedgerResult<()> {
        let mut guard = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        let writer = guard
            .as_mut()
            .ok_or_else(|| LedgerError::Closed(self.path.clone()))?;

        writer.serialize(row)?;
        writer.flush()?;
        writer.get_ref().sync_data()?;
        Ok(())
    }

    /// Flushes and releases the file handle
    ///
    /// Further appends fail with [`LedgerError::Closed`]. Closing twice is a
    /// no-op.
    pub fn close(&self) -> LedgerResult<()> {
        let mut guard = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(mut writer) = guard.take() {
            writer.flush()?;
            writer.get_ref().sync_all()?;
            tracing::debug!("Closed ledger {}", self.path.display());
        }
        Ok(())
    }
}

impl Drop for Ledger {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            tracing::error!("Failed to close ledger {}: {}", self.path.display(), e);
        }
    }
}

/// Reads every row of a ledger file
pub fn read_rows(path: &Path) -> LedgerResult<Vec<LedgerRow>> {
    let mut reader = csv::Reader::from_path(path)?;
    let rows = reader
        .deserialize()
        .collect::<Result<Vec<LedgerRow>, csv::Error>>()?;
    Ok(rows)
}
