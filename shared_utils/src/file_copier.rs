//! File Copier Module
//!
//! Copies non-converted files into the mirrored tree, keeping timestamps so
//! the output looks like the source to sync tools.

use crate::errors::{BatchError, Result};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CopyTask {
    pub input: PathBuf,
    pub output: PathBuf,
}

impl CopyTask {
    pub fn new(input: impl Into<PathBuf>, output: impl Into<PathBuf>) -> Self {
        Self {
            input: input.into(),
            output: output.into(),
        }
    }
}

/// Copy content and permissions, then carry over access/modification times.
/// Returns the number of bytes copied.
pub fn copy_file(task: &CopyTask) -> Result<u64> {
    ensure_parent_dir_exists(&task.output)?;
    let bytes = fs::copy(&task.input, &task.output).map_err(|e| BatchError::io(&task.input, e))?;
    preserve_timestamps(&task.input, &task.output);
    Ok(bytes)
}

/// Best effort: a filesystem that refuses timestamps (FAT32 sticks, some
/// network shares) still gets the file.
pub fn preserve_timestamps(src: &Path, dst: &Path) {
    let Ok(meta) = fs::metadata(src) else {
        return;
    };
    let atime = filetime::FileTime::from_last_access_time(&meta);
    let mtime = filetime::FileTime::from_last_modification_time(&meta);
    if let Err(e) = filetime::set_file_times(dst, atime, mtime) {
        tracing::debug!(path = %dst.display(), error = %e, "Could not preserve timestamps");
    }
}

pub fn ensure_parent_dir_exists(file_path: &Path) -> Result<()> {
    match file_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => {
            fs::create_dir_all(parent).map_err(|e| BatchError::io(parent, e))
        }
        _ => Ok(()),
    }
}

/// Delete a leftover file if there is one. A failure is logged, not returned.
pub fn remove_if_present(path: &Path) {
    match fs::remove_file(path) {
        Ok(()) => tracing::debug!(path = %path.display(), "Removed leftover file"),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => tracing::warn!(path = %path.display(), error = %e, "Could not remove leftover file"),
    }
}
