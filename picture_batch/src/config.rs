use crate::presets::{PicturePreset, DEFAULT_COPY_MASK, DEFAULT_INPUT_MASK, DEFAULT_OUTPUT_FORMAT};
use clap::Parser;
use shared_utils::cli::{CommonArgs, MirrorArgs, MirrorDefaults, MirrorOptions, RunOptions};
use shared_utils::errors::Result;
use shared_utils::thread_manager::WorkloadType;
use shared_utils::tool_runner::ToolSpec;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "picture-batch")]
#[command(
    version,
    about = "Copy a picture folder, converting images to JPEG XL with cjxl",
    long_about = "Copies an input directory to a destination and converts matching images \
                  to JPEG XL. Images cjxl cannot read are decoded with ImageMagick first. \
                  Without a preset or cjxl arguments the balanced preset is used."
)]
pub struct PictureCli {
    /// Input folder
    #[arg(value_name = "INPUT_DIR")]
    pub input_dir: PathBuf,

    /// Output folder, may be the input folder itself
    #[arg(value_name = "OUTPUT_DIR")]
    pub output_dir: PathBuf,

    #[command(flatten)]
    pub common: CommonArgs,

    #[command(flatten)]
    pub mirror: MirrorArgs,

    /// cjxl program, may include a container runner prefix
    #[arg(long = "cjxl-path", alias = "cjxlpath", default_value = "cjxl")]
    pub cjxl_path: String,

    /// Codec options passed to cjxl; a preset replaces them
    #[arg(long = "cjxl-args", alias = "cjxlargs", allow_hyphen_values = true)]
    pub cjxl_args: Option<String>,

    /// ImageMagick program used to decode images cjxl rejects
    #[arg(long = "magick-path", alias = "magickpath", default_value = "magick")]
    pub magick_path: String,

    /// cjxl effort, 1 (fast) to 9 (small)
    #[arg(short = 'e', long = "effort", alias = "cjxleffort", value_parser = clap::value_parser!(u8).range(1..=9))]
    pub effort: Option<u8>,

    /// Preset overriding cjxl options
    #[arg(short, long, value_enum)]
    pub preset: Option<PicturePreset>,

    /// Show cjxl's own output
    #[arg(long = "verbose-cjxl", alias = "vv", alias = "allverbose")]
    pub verbose_cjxl: bool,
}

#[derive(Debug, Clone)]
pub struct PictureConfig {
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    pub run: RunOptions,
    pub mirror: MirrorOptions,
    pub cjxl: ToolSpec,
    pub magick: ToolSpec,
    pub cjxl_args: Vec<String>,
    pub effort: Option<u8>,
    /// Preset in effect, including the implicit balanced one.
    pub preset: Option<PicturePreset>,
    pub verbose_cjxl: bool,
}

impl PictureCli {
    pub fn resolve(&self) -> Result<PictureConfig> {
        let run = self.common.resolve(WorkloadType::MemoryHeavy)?;
        let mut mirror = self.mirror.resolve(MirrorDefaults {
            input_file_mask: DEFAULT_INPUT_MASK,
            output_format: DEFAULT_OUTPUT_FORMAT,
            copy_file_mask: DEFAULT_COPY_MASK,
        })?;

        let preset = match (self.preset, &self.cjxl_args) {
            (Some(p), _) => Some(p),
            (None, None) => {
                tracing::info!("No preset and no cjxl arguments given, using balanced");
                Some(PicturePreset::Balanced)
            }
            (None, Some(_)) => None,
        };

        let (raw_args, effort) = match preset {
            Some(p) => {
                let cfg = p.config();
                mirror.output_format = DEFAULT_OUTPUT_FORMAT.to_string();
                (cfg.cjxl_args.to_string(), self.effort.or(cfg.default_effort))
            }
            None => (self.cjxl_args.clone().unwrap_or_default(), self.effort),
        };

        Ok(PictureConfig {
            input_dir: self.input_dir.clone(),
            output_dir: self.output_dir.clone(),
            run,
            mirror,
            cjxl: ToolSpec::parse(&self.cjxl_path)?,
            magick: ToolSpec::parse(&self.magick_path)?,
            cjxl_args: raw_args.split_whitespace().map(str::to_string).collect(),
            effort,
            preset,
            verbose_cjxl: self.verbose_cjxl,
        })
    }
}
