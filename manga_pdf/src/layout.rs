//! Page layout options handed to img2pdf

use clap::ValueEnum;
use regex::Regex;
use shared_utils::errors::{BatchError, Result};
use std::fmt;
use std::sync::OnceLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LayoutPreset {
    /// Page size taken from each image
    Original,
    /// 6" e-ink reader, 90mm x 122mm
    Ereader,
    /// 210mm x 297mm
    A4,
}

impl LayoutPreset {
    pub fn page_size(self) -> PageSize {
        let fixed = |w: &str, h: &str| PageSize {
            width: Some(Length(w.to_string())),
            height: Some(Length(h.to_string())),
        };
        match self {
            LayoutPreset::Original => PageSize::default(),
            LayoutPreset::Ereader => fixed("90mm", "122mm"),
            LayoutPreset::A4 => fixed("210mm", "297mm"),
        }
    }
}

/// What img2pdf does with the rotation stored in a page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Rotation {
    Auto,
    None,
    Ifvalid,
    #[value(name = "0")]
    Deg0,
    #[value(name = "90")]
    Deg90,
    #[value(name = "180")]
    Deg180,
    #[value(name = "270")]
    Deg270,
}

impl Rotation {
    pub fn as_str(self) -> &'static str {
        match self {
            Rotation::Auto => "auto",
            Rotation::None => "none",
            Rotation::Ifvalid => "ifvalid",
            Rotation::Deg0 => "0",
            Rotation::Deg90 => "90",
            Rotation::Deg180 => "180",
            Rotation::Deg270 => "270",
        }
    }
}

fn length_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\d+(\.\d+)?(mm|cm|in|pt)?$").expect("Invalid length pattern"))
}

/// Page dimension in img2pdf notation: a number with optional `mm`, `cm`,
/// `in` or `pt` (the default) suffix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Length(String);

impl Length {
    pub fn parse(raw: &str) -> Result<Self> {
        let value = raw.trim().to_lowercase();
        if !length_regex().is_match(&value) {
            return Err(BatchError::invalid(
                "page length",
                format!("'{}' is not a length like 90mm, 4.5in or 300", raw.trim()),
            ));
        }
        Ok(Length(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Length {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageSize {
    pub width: Option<Length>,
    pub height: Option<Length>,
}

impl PageSize {
    /// `--pagesize` value; either side may be left out. `None` when both are.
    pub fn img2pdf_arg(&self) -> Option<String> {
        if self.width.is_none() && self.height.is_none() {
            return None;
        }
        let side = |l: &Option<Length>| l.as_ref().map(Length::as_str).unwrap_or("").to_string();
        Some(format!("{}x{}", side(&self.width), side(&self.height)))
    }
}
