use crate::url::{DocumentRef, SerialNo};
use std::path::{Path, PathBuf};

/// Directory layout of the mirror
///
/// ```text
/// <root>/<year>/metadata.csv
/// <root>/<year>/<year>_<MM>_<serial>.txt
/// ```
#[derive(Debug, Clone)]
pub struct OutputLayout {
    root: PathBuf,
}

impl OutputLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn year_dir(&self, year: i32) -> PathBuf {
        self.root.join(year.to_string())
    }

    /// Creates the year directory if needed and returns its path
    pub async fn ensure_year_dir(&self, year: i32) -> std::io::Result<PathBuf> {
        let dir = self.year_dir(year);
        tokio::fs::create_dir_all(&dir).await?;
        Ok(dir)
    }

    pub fn document_filename(year: i32, month: u32, serial: &SerialNo) -> String {
        format!("{}_{:02}_{}.txt", year, month, serial)
    }

    pub fn document_path(&self, year: i32, month: u32, serial: &SerialNo) -> PathBuf {
        self.year_dir(year)
            .join(Self::document_filename(year, month, serial))
    }

    /// Documents of a month whose text file is not on disk
    pub fn missing<'a>(
        &self,
        year: i32,
        month: u32,
        documents: &'a [DocumentRef],
    ) -> Vec<&'a DocumentRef> {
        documents
            .iter()
            .filter(|doc| !self.document_path(year, month, &doc.serial).exists())
            .collect()
    }
}
