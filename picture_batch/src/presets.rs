//! cjxl presets. Every preset writes JPEG XL.

use clap::ValueEnum;

pub const DEFAULT_INPUT_MASK: &str = "png,apng,jpg,jpeg,jfif,webp,pam,pgm,ppm,bmp,gif,avif,tif,tiff";
pub const DEFAULT_OUTPUT_FORMAT: &str = "jxl";
/// Pictures only: other files are not copied unless a copy mask says so.
pub const DEFAULT_COPY_MASK: &str = "*";

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
#[value(rename_all = "snake_case")]
pub enum PicturePreset {
    /// Distance 0.9, indistinguishable at normal viewing
    VisualLossless,
    /// Mathematically lossless, JPEGs recompressed bit-exact
    TrueLossless,
    /// Quality 80
    Balanced,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PresetConfig {
    pub cjxl_args: &'static str,
    /// Effort used when none was given on the command line.
    pub default_effort: Option<u8>,
}

impl PicturePreset {
    pub fn config(self) -> PresetConfig {
        match self {
            PicturePreset::VisualLossless => PresetConfig {
                cjxl_args: "-d 0.9 --lossless_jpeg=0",
                default_effort: None,
            },
            PicturePreset::TrueLossless => PresetConfig {
                cjxl_args: "-d 0 --lossless_jpeg=1",
                default_effort: Some(9),
            },
            PicturePreset::Balanced => PresetConfig {
                cjxl_args: "-q 80 --lossless_jpeg=0",
                default_effort: None,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preset_names() {
        assert_eq!(
            PicturePreset::from_str("visual_lossless", false).unwrap(),
            PicturePreset::VisualLossless
        );
        assert_eq!(
            PicturePreset::from_str("true_lossless", false).unwrap(),
            PicturePreset::TrueLossless
        );
        assert!(PicturePreset::from_str("lossy", false).is_err());
    }

    #[test]
    fn test_only_true_lossless_raises_effort() {
        assert_eq!(PicturePreset::TrueLossless.config().default_effort, Some(9));
        assert_eq!(PicturePreset::Balanced.config().default_effort, None);
        assert!(PicturePreset::Balanced.config().cjxl_args.starts_with("-q 80"));
    }
}
