//! Tree Walker
//!
//! Lazily walks an input tree in natural order so the batch can start
//! converting before the walk is over. Siblings are sorted with
//! [`compare_file_names`], directories come out before their contents.

use crate::errors::{BatchError, Result};
use crate::natural_sort::compare_file_names;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredFile {
    pub path: PathBuf,
    /// Directory of the file relative to the walk root ("" at the root).
    pub relative_dir: PathBuf,
    pub size: u64,
}

impl DiscoveredFile {
    pub fn relative_path(&self) -> PathBuf {
        match self.path.file_name() {
            Some(name) => self.relative_dir.join(name),
            None => self.relative_dir.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WalkEvent {
    Directory { path: PathBuf, relative: PathBuf },
    File(DiscoveredFile),
}

#[derive(Debug, Clone)]
pub struct TreeWalker {
    root: PathBuf,
    ignore_dir: Option<OsString>,
    excluded: Vec<PathBuf>,
}

impl TreeWalker {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            ignore_dir: None,
            excluded: Vec::new(),
        }
    }

    /// Skip every directory with exactly this name, including its subtree.
    pub fn ignore_dir(mut self, name: Option<&str>) -> Self {
        self.ignore_dir = name.filter(|n| !n.is_empty()).map(OsString::from);
        self
    }

    /// Skip a specific directory, e.g. an output tree nested in the input.
    pub fn exclude(mut self, path: impl Into<PathBuf>) -> Self {
        self.excluded.push(path.into());
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn walk(&self) -> impl Iterator<Item = Result<WalkEvent>> + '_ {
        WalkDir::new(&self.root)
            .sort_by(|a, b| compare_file_names(a.file_name(), b.file_name()))
            .into_iter()
            .filter_entry(move |entry| {
                if entry.depth() == 0 || !entry.file_type().is_dir() {
                    return true;
                }
                let ignored = self
                    .ignore_dir
                    .as_deref()
                    .is_some_and(|name| entry.file_name() == name);
                if ignored {
                    tracing::debug!(dir = %entry.path().display(), "Ignoring directory");
                }
                !ignored && !self.excluded.iter().any(|p| p == entry.path())
            })
            .filter_map(move |entry| match entry {
                Err(e) => Some(Err(BatchError::Walk(e))),
                Ok(entry) => self.event_for(entry.path(), entry.file_type().is_dir()),
            })
    }

    fn event_for(&self, path: &Path, is_dir: bool) -> Option<Result<WalkEvent>> {
        let relative = path
            .strip_prefix(&self.root)
            .map(Path::to_path_buf)
            .unwrap_or_default();

        if is_dir {
            return Some(Ok(WalkEvent::Directory {
                path: path.to_path_buf(),
                relative,
            }));
        }

        // follows symlinks to files; sockets, fifos and dangling links are left out
        match std::fs::metadata(path) {
            Ok(meta) if meta.is_file() => Some(Ok(WalkEvent::File(DiscoveredFile {
                path: path.to_path_buf(),
                relative_dir: relative.parent().map(Path::to_path_buf).unwrap_or_default(),
                size: meta.len(),
            }))),
            Ok(_) => None,
            Err(e) => Some(Err(BatchError::io(path, e))),
        }
    }
}
