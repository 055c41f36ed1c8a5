use crate::layout::{LayoutPreset, Length, PageSize, Rotation};
use clap::Parser;
use shared_utils::cli::{CommonArgs, RunOptions};
use shared_utils::errors::Result;
use shared_utils::thread_manager::WorkloadType;
use shared_utils::tool_runner::ToolSpec;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "manga-pdf")]
#[command(
    version,
    about = "Bind a folder of chapters and volumes into one PDF",
    long_about = "Walks the input folder in natural reading order (Volume 1 before \
                  Chapter 2 before Chapter 10), flattens PNG transparency, turns WebP \
                  into JPEG and binds every page into a single PDF with img2pdf. \
                  Use --dry-run to check the page order first."
)]
pub struct MangaCli {
    /// Folder with chapter/volume subfolders of jpg, png and webp pages
    #[arg(value_name = "INPUT_DIR")]
    pub input_dir: PathBuf,

    /// PDF file to write
    #[arg(value_name = "OUTPUT_PDF")]
    pub output_pdf: PathBuf,

    #[command(flatten)]
    pub common: CommonArgs,

    /// Keep PNG pages as they are, alpha channel included
    #[arg(long = "no-png-alpha-removal", alias = "no_png_alpha_removal")]
    pub no_png_alpha_removal: bool,

    /// Keep WebP pages instead of converting them to JPEG
    #[arg(long = "no-webp-to-jpg", alias = "no_webp_to_jpg")]
    pub no_webp_to_jpg: bool,

    /// Page layout preset, replaces --page-width/--page-height
    #[arg(short, long, value_enum)]
    pub preset: Option<LayoutPreset>,

    /// Page width, e.g. 90mm, 6in, 300 (points)
    #[arg(long = "page-width", value_parser = Length::parse)]
    pub page_width: Option<Length>,

    /// Page height, e.g. 122mm
    #[arg(long = "page-height", value_parser = Length::parse)]
    pub page_height: Option<Length>,

    /// Rotate pages to match the page orientation
    #[arg(long = "auto-orient")]
    pub auto_orient: bool,

    /// How img2pdf treats rotation metadata of pages
    #[arg(long, value_enum)]
    pub rotation: Option<Rotation>,

    /// ImageMagick program
    #[arg(long = "magick-path", alias = "convert-path", default_value = "magick")]
    pub magick_path: String,

    /// img2pdf program
    #[arg(long = "img2pdf-path", default_value = "img2pdf")]
    pub img2pdf_path: String,
}

#[derive(Debug, Clone)]
pub struct MangaConfig {
    pub input_dir: PathBuf,
    pub output_pdf: PathBuf,
    pub run: RunOptions,
    pub flatten_png: bool,
    pub webp_to_jpg: bool,
    pub page_size: PageSize,
    pub auto_orient: bool,
    pub rotation: Option<Rotation>,
    pub magick: ToolSpec,
    pub img2pdf: ToolSpec,
}

impl MangaCli {
    pub fn resolve(&self) -> Result<MangaConfig> {
        let page_size = match self.preset {
            Some(preset) => preset.page_size(),
            None => PageSize {
                width: self.page_width.clone(),
                height: self.page_height.clone(),
            },
        };
        Ok(MangaConfig {
            input_dir: self.input_dir.clone(),
            output_pdf: self.output_pdf.clone(),
            run: self.common.resolve(WorkloadType::CpuBound)?,
            flatten_png: !self.no_png_alpha_removal,
            webp_to_jpg: !self.no_webp_to_jpg,
            page_size,
            auto_orient: self.auto_orient,
            rotation: self.rotation,
            magick: ToolSpec::parse(&self.magick_path)?,
            img2pdf: ToolSpec::parse(&self.img2pdf_path)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_utils::cli::{parse_error_exit_code, EXIT_FAILURE};

    fn cli(args: &[&str]) -> std::result::Result<MangaCli, clap::Error> {
        let mut full = vec!["manga-pdf", "in", "out.pdf"];
        full.extend_from_slice(args);
        MangaCli::try_parse_from(full)
    }

    #[test]
    fn test_defaults() {
        let cfg = cli(&[]).unwrap().resolve().unwrap();
        assert!(cfg.flatten_png && cfg.webp_to_jpg);
        assert_eq!(cfg.page_size, PageSize::default());
        assert_eq!(cfg.rotation, None);
        assert_eq!(cfg.magick.label(), "magick");
    }

    #[test]
    fn test_layout_flags() {
        let cfg = cli(&[
            "--page-width",
            "100mm",
            "--auto-orient",
            "--rotation",
            "ifvalid",
            "--no_webp_to_jpg",
        ])
        .unwrap()
        .resolve()
        .unwrap();
        assert_eq!(cfg.page_size.img2pdf_arg().as_deref(), Some("100mmx"));
        assert!(cfg.auto_orient);
        assert_eq!(cfg.rotation, Some(Rotation::Ifvalid));
        assert!(!cfg.webp_to_jpg);
    }

    #[test]
    fn test_preset_replaces_page_flags() {
        let cfg = cli(&["--page-width", "1in", "--preset", "a4"])
            .unwrap()
            .resolve()
            .unwrap();
        assert_eq!(cfg.page_size.img2pdf_arg().as_deref(), Some("210mmx297mm"));
    }

    #[test]
    fn test_bad_length_rejected_by_parser() {
        let err = cli(&["--page-height", "tall"]).unwrap_err();
        assert_eq!(parse_error_exit_code(&err), EXIT_FAILURE);
        let err = cli(&["--rotation", "45"]).unwrap_err();
        assert_eq!(parse_error_exit_code(&err), EXIT_FAILURE);
    }
}
