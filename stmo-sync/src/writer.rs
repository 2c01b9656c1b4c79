//! Tracked-file I/O.
//!
//! SQL text is opaque: it is read and written whole, byte for byte. Writes go
//! through a sibling `<file>.stmo.tmp` and a rename, so an interrupted write
//! never leaves a half-written query behind.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::error::{io_err, SyncError};

/// Replace the content of `path` with `content`.
pub(crate) fn write_sql(path: &Path, content: &str) -> Result<(), SyncError> {
    let tmp = PathBuf::from(format!("{}.stmo.tmp", path.display()));
    write_sql_with_tmp(path, content, &tmp)
}

fn write_sql_with_tmp(path: &Path, content: &str, tmp: &Path) -> Result<(), SyncError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| io_err(parent, e))?;
    }

    let result = std::fs::write(tmp, content)
        .map_err(|e| io_err(tmp, e))
        .and_then(|()| std::fs::rename(tmp, path).map_err(|e| io_err(path, e)));
    if let Err(err) = result {
        let _ = std::fs::remove_file(tmp);
        return Err(err);
    }

    tracing::info!("wrote: {}", path.display());
    Ok(())
}

pub(crate) fn read_sql(path: &Path) -> Result<String, SyncError> {
    std::fs::read_to_string(path).map_err(|e| io_err(path, e))
}

/// Like [`read_sql`] but a missing file is `None`.
pub(crate) fn read_existing(path: &Path) -> Result<Option<String>, SyncError> {
    match std::fs::read_to_string(path) {
        Ok(content) => Ok(Some(content)),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
        Err(err) => Err(io_err(path, err)),
    }
}
