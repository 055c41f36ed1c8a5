//! FileSize Type-Safe Wrapper
//!
//! Byte counts with human-readable display and parsing of threshold values
//! such as `500`, `100kb`, `1 MiB` or `2.5G`.

use crate::errors::{BatchError, Result};
use std::fmt;
use std::str::FromStr;

/// Decimal and binary unit suffixes accepted by [`FileSize::parse`].
const UNITS: &[(&str, f64)] = &[
    ("b", 1.0),
    ("k", 1e3),
    ("kb", 1e3),
    ("kib", 1024.0),
    ("m", 1e6),
    ("mb", 1e6),
    ("mib", 1_048_576.0),
    ("g", 1e9),
    ("gb", 1e9),
    ("gib", 1_073_741_824.0),
    ("t", 1e12),
    ("tb", 1e12),
    ("tib", 1_099_511_627_776.0),
    ("p", 1e15),
    ("pb", 1e15),
    ("pib", 1_125_899_906_842_624.0),
];

/// File size in bytes.
///
/// # Examples
/// ```
/// use shared_utils::types::file_size::FileSize;
///
/// let size = FileSize::parse("1 MiB").unwrap();
/// assert_eq!(size.bytes(), 1048576);
/// assert_eq!(size.display(), "1.00 MB");
/// ```
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FileSize(u64);

impl FileSize {
    pub const ZERO: FileSize = FileSize(0);

    pub const KB: u64 = 1024;
    pub const MB: u64 = 1024 * 1024;
    pub const GB: u64 = 1024 * 1024 * 1024;

    #[inline]
    pub const fn new(bytes: u64) -> Self {
        Self(bytes)
    }

    #[inline]
    pub const fn from_kb(kb: u64) -> Self {
        Self(kb * Self::KB)
    }

    #[inline]
    pub const fn from_mb(mb: u64) -> Self {
        Self(mb * Self::MB)
    }

    #[inline]
    pub const fn bytes(&self) -> u64 {
        self.0
    }

    #[inline]
    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Parse `<number>[ ]<unit>`; unit is case-insensitive and optional
    /// (plain bytes). Negative values clamp to zero.
    pub fn parse(input: &str) -> Result<Self> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(BatchError::invalid("file size", "empty value"));
        }

        let split_at = trimmed
            .find(|c: char| c.is_ascii_alphabetic())
            .unwrap_or(trimmed.len());
        let (number, unit) = trimmed.split_at(split_at);
        let number = number.trim();
        let unit = unit.trim().to_ascii_lowercase();

        let value: f64 = number.parse().map_err(|_| {
            BatchError::invalid("file size", format!("'{}' is not a number", input))
        })?;
        if !value.is_finite() {
            return Err(BatchError::invalid("file size", format!("'{}' is not finite", input)));
        }

        let multiplier = if unit.is_empty() {
            1.0
        } else {
            UNITS
                .iter()
                .find(|(name, _)| *name == unit)
                .map(|(_, m)| *m)
                .ok_or_else(|| {
                    BatchError::invalid("file size", format!("unknown unit '{}' in '{}'", unit, input))
                })?
        };

        // `as` saturates, so huge values pin at u64::MAX
        Ok(FileSize((value * multiplier).max(0.0).round() as u64))
    }

    pub fn display(&self) -> String {
        if self.0 >= Self::GB {
            format!("{:.2} GB", self.0 as f64 / Self::GB as f64)
        } else if self.0 >= Self::MB {
            format!("{:.2} MB", self.0 as f64 / Self::MB as f64)
        } else if self.0 >= Self::KB {
            format!("{:.2} KB", self.0 as f64 / Self::KB as f64)
        } else {
            format!("{} B", self.0)
        }
    }
}

impl FromStr for FileSize {
    type Err = BatchError;

    fn from_str(s: &str) -> Result<Self> {
        FileSize::parse(s)
    }
}

impl fmt::Debug for FileSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FileSize({} = {})", self.0, self.display())
    }
}

impl fmt::Display for FileSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display())
    }
}

impl Default for FileSize {
    fn default() -> Self {
        Self::ZERO
    }
}

impl From<u64> for FileSize {
    fn from(bytes: u64) -> Self {
        Self::new(bytes)
    }
}

impl From<FileSize> for u64 {
    fn from(size: FileSize) -> Self {
        size.0
    }
}
