use std::fs;
use std::io::{self, Write};
use std::path::Path;

use formats::FormatError;
use layers::StoreError;
use tempfile::NamedTempFile;
use tracing::error;

/// Reads a store file; a missing, unreadable or blank file is a storage error.
pub fn read_source(path: &Path) -> Result<String, StoreError> {
    let text = fs::read_to_string(path).inspect_err(|err| {
        error!("store read failed: {path:?} -> {err}");
    })?;
    if text.trim().is_empty() {
        error!("store is empty: {path:?}");
        return Err(StoreError::Storage(FormatError::Empty));
    }
    Ok(text)
}

/// Like [`read_source`], but a missing or blank file reads as `None`.
pub fn read_existing(path: &Path) -> Result<Option<String>, StoreError> {
    match fs::read_to_string(path) {
        Ok(text) if text.trim().is_empty() => Ok(None),
        Ok(text) => Ok(Some(text)),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(err) => {
            error!("store read failed: {path:?} -> {err}");
            Err(err.into())
        }
    }
}

/// Replaces `path` with `contents` via a temp file in the same directory.
pub fn write_atomic(path: &Path, contents: &str) -> io::Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir)?;

    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(contents.as_bytes())?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|err| err.error)?;
    Ok(())
}
