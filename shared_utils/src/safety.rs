//! Safety Module
//!
//! Startup checks on the input and output locations: the input has to exist,
//! the output must not be a system directory, and a non-empty output
//! directory needs explicit consent.

use crate::errors::{BatchError, Result};
use serde::Serialize;
use std::path::{Path, PathBuf};

const PROTECTED_DIRS: &[&str] = &[
    "/",
    "/System",
    "/usr",
    "/bin",
    "/sbin",
    "/etc",
    "/var",
    "/private",
    "/Library",
    "/Applications",
    "/boot",
    "/dev",
    "/proc",
    "/sys",
];

/// What to do when the output directory already has content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OverwriteMode {
    /// Stop before doing anything.
    #[default]
    Refuse,
    /// Write over whatever is there.
    Overwrite,
    /// Keep existing outputs, only produce missing ones.
    Preserve,
}

impl OverwriteMode {
    pub fn from_flags(ignore_not_empty: bool, preserve: bool) -> Self {
        if preserve {
            OverwriteMode::Preserve
        } else if ignore_not_empty {
            OverwriteMode::Overwrite
        } else {
            OverwriteMode::Refuse
        }
    }
}

/// Resolved input/output locations of a mirror run.
#[derive(Debug, Clone)]
pub struct DirectoryPlan {
    pub input: PathBuf,
    pub output: PathBuf,
    /// Output resolves to the input directory itself.
    pub same_dir: bool,
    /// Output lives somewhere below the input and must not be walked.
    pub nested_output: Option<PathBuf>,
}

pub fn check_protected_directory(path: &Path) -> Result<()> {
    let canonical = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
    if PROTECTED_DIRS
        .iter()
        .any(|p| canonical.as_os_str() == *p || path.as_os_str() == *p)
    {
        return Err(BatchError::invalid(
            "output directory",
            format!("🚨 '{}' is a protected system directory", path.display()),
        ));
    }
    Ok(())
}

/// Fails with `OutputNotEmpty` if `dir` has entries and the mode is `Refuse`.
pub fn check_output_dir(dir: &Path, mode: OverwriteMode) -> Result<()> {
    if mode != OverwriteMode::Refuse || !dir.exists() {
        return Ok(());
    }
    let mut entries = std::fs::read_dir(dir).map_err(|e| BatchError::io(dir, e))?;
    if entries.next().is_some() {
        return Err(BatchError::OutputNotEmpty(dir.to_path_buf()));
    }
    Ok(())
}

/// Validate and resolve the input and output directories of a mirror run.
pub fn plan_directories(input: &Path, output: &Path, mode: OverwriteMode) -> Result<DirectoryPlan> {
    if !input.is_dir() {
        return Err(BatchError::InputNotFound(input.to_path_buf()));
    }
    check_protected_directory(output)?;

    let input_canon = input.canonicalize().map_err(|e| BatchError::io(input, e))?;
    let output_canon = output.canonicalize().ok();
    let same_dir = output_canon.as_deref() == Some(input_canon.as_path());

    // a same-dir run writes next to its sources and needs the same consent
    check_output_dir(output, mode)?;

    let nested_output = output_canon
        .as_deref()
        .filter(|o| !same_dir && o.starts_with(&input_canon))
        .and_then(|o| o.strip_prefix(&input_canon).ok())
        .map(|rel| input.join(rel));

    Ok(DirectoryPlan {
        input: input.to_path_buf(),
        // same spelling as the input so destinations compare equal to sources
        output: if same_dir {
            input.to_path_buf()
        } else {
            output.to_path_buf()
        },
        same_dir,
        nested_output,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_protected_directories_blocked() {
        assert!(check_protected_directory(Path::new("/")).is_err());
        assert!(check_protected_directory(Path::new("/usr")).is_err());
        let temp = TempDir::new().unwrap();
        assert!(check_protected_directory(temp.path()).is_ok());
    }

    #[test]
    fn test_non_empty_output_refused() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("existing.ogg"), b"x").unwrap();

        let err = check_output_dir(temp.path(), OverwriteMode::Refuse).unwrap_err();
        assert!(matches!(err, BatchError::OutputNotEmpty(_)));
        assert!(err.is_startup_fatal());
        assert!(check_output_dir(temp.path(), OverwriteMode::Overwrite).is_ok());
        assert!(check_output_dir(temp.path(), OverwriteMode::Preserve).is_ok());
    }

    #[test]
    fn test_empty_or_missing_output_accepted() {
        let temp = TempDir::new().unwrap();
        assert!(check_output_dir(temp.path(), OverwriteMode::Refuse).is_ok());
        assert!(check_output_dir(&temp.path().join("new"), OverwriteMode::Refuse).is_ok());
    }

    #[test]
    fn test_overwrite_mode_flags() {
        assert_eq!(OverwriteMode::from_flags(false, false), OverwriteMode::Refuse);
        assert_eq!(OverwriteMode::from_flags(true, false), OverwriteMode::Overwrite);
        assert_eq!(OverwriteMode::from_flags(false, true), OverwriteMode::Preserve);
        assert_eq!(OverwriteMode::from_flags(true, true), OverwriteMode::Preserve);
    }

    #[test]
    fn test_plan_same_and_nested() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("a.png"), b"x").unwrap();

        let same = plan_directories(temp.path(), temp.path(), OverwriteMode::Overwrite).unwrap();
        assert!(same.same_dir);
        assert!(same.nested_output.is_none());
        assert_eq!(same.output, temp.path());

        let out = temp.path().join("out");
        fs::create_dir(&out).unwrap();
        let nested = plan_directories(temp.path(), &out, OverwriteMode::Refuse).unwrap();
        assert!(!nested.same_dir);
        assert_eq!(nested.nested_output, Some(temp.path().join("out")));
    }

    #[test]
    fn test_same_dir_needs_consent() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("a.flac"), b"x").unwrap();

        let err = plan_directories(temp.path(), temp.path(), OverwriteMode::Refuse).unwrap_err();
        assert!(matches!(err, BatchError::OutputNotEmpty(_)));
        assert!(err.is_startup_fatal());

        let preserve = plan_directories(temp.path(), temp.path(), OverwriteMode::Preserve).unwrap();
        assert!(preserve.same_dir);
    }

    #[test]
    fn test_plan_missing_input() {
        let temp = TempDir::new().unwrap();
        let err = plan_directories(&temp.path().join("nope"), temp.path(), OverwriteMode::Refuse)
            .unwrap_err();
        assert!(matches!(err, BatchError::InputNotFound(_)));
    }
}
