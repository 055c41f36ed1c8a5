//! Extension masks for input selection and copy exclusion

use crate::errors::{BatchError, Result};
use serde::Serialize;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Normalized set of file extensions: lowercase, no leading dot.
///
/// `"png, .JPG,,jpeg"` parses to `png, jpg, jpeg`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExtensionMask(Vec<String>);

impl ExtensionMask {
    pub fn parse(input: &str) -> Result<Self> {
        let mut exts: Vec<String> = Vec::new();
        for raw in input.split(',') {
            let ext = raw.trim().trim_start_matches('.').to_lowercase();
            if ext.is_empty() {
                continue;
            }
            if !ext.chars().all(char::is_alphanumeric) {
                return Err(BatchError::invalid(
                    "extension mask",
                    format!("'{}' is not a plain extension", raw.trim()),
                ));
            }
            if !exts.contains(&ext) {
                exts.push(ext);
            }
        }
        Ok(ExtensionMask(exts))
    }

    pub fn from_list(exts: &[&str]) -> Self {
        ExtensionMask(exts.iter().map(|e| e.to_lowercase()).collect())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, ext: &str) -> bool {
        let ext = ext.trim_start_matches('.').to_lowercase();
        self.0.iter().any(|e| *e == ext)
    }

    /// Whether the path's final extension is in the mask.
    pub fn matches(&self, path: &Path) -> bool {
        path.extension()
            .map(|ext| self.contains(&ext.to_string_lossy()))
            .unwrap_or(false)
    }

    pub fn remove(&mut self, ext: &str) {
        let ext = ext.trim_start_matches('.').to_lowercase();
        self.0.retain(|e| *e != ext);
    }

    pub fn extend(&mut self, other: &ExtensionMask) {
        for ext in &other.0 {
            if !self.0.contains(ext) {
                self.0.push(ext.clone());
            }
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl FromStr for ExtensionMask {
    type Err = BatchError;

    fn from_str(s: &str) -> Result<Self> {
        ExtensionMask::parse(s)
    }
}

impl fmt::Display for ExtensionMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.join(","))
    }
}

/// Which non-converted files get copied to the output tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum CopyMask {
    /// `*` or `all`: copy nothing besides converted files.
    ExcludeAll,
    /// Copy everything except these extensions.
    Exclude(ExtensionMask),
}

impl CopyMask {
    pub fn parse(input: &str) -> Result<Self> {
        let trimmed = input.trim();
        if trimmed == "*" || trimmed.eq_ignore_ascii_case("all") {
            return Ok(CopyMask::ExcludeAll);
        }
        Ok(CopyMask::Exclude(ExtensionMask::parse(trimmed)?))
    }

    pub fn copy_everything() -> Self {
        CopyMask::Exclude(ExtensionMask::default())
    }

    pub fn allows(&self, path: &Path) -> bool {
        match self {
            CopyMask::ExcludeAll => false,
            CopyMask::Exclude(mask) => !mask.matches(path),
        }
    }
}

impl FromStr for CopyMask {
    type Err = BatchError;

    fn from_str(s: &str) -> Result<Self> {
        CopyMask::parse(s)
    }
}
