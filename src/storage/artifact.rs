use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Suffix of the temporary file a document is written to before renaming
pub const PARTIAL_SUFFIX: &str = ".part";

fn partial_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(OsString::from)
        .unwrap_or_default();
    name.push(PARTIAL_SUFFIX);
    path.with_file_name(name)
}

/// Writes document text so that `path` only ever holds complete content
///
/// The text goes to `<path>.part` first and is renamed into place once
/// fully written. A crash leaves at most a stale `.part` file, which the
/// next run overwrites.
pub async fn write_document(path: &Path, text: &str) -> std::io::Result<()> {
    let partial = partial_path(path);
    tokio::fs::write(&partial, text.as_bytes()).await?;
    tokio::fs::rename(&partial, path).await
}
