//! Command line and the frozen run configuration

use crate::presets::{MusicPreset, DEFAULT_FFMPEG_ARGS, DEFAULT_INPUT_MASK, DEFAULT_OUTPUT_FORMAT};
use clap::Parser;
use shared_utils::cli::{CommonArgs, MirrorArgs, MirrorDefaults, MirrorOptions, RunOptions};
use shared_utils::errors::{BatchError, Result};
use shared_utils::thread_manager::WorkloadType;
use shared_utils::tool_runner::ToolSpec;
use shared_utils::types::ExtensionMask;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "music-batch")]
#[command(
    version,
    about = "Copy a music folder, converting matching audio files with ffmpeg",
    long_about = "Copies an input directory to a destination and converts matching files \
                  to one output format. A folder of FLACs, MP3s and PNGs is copied while \
                  the FLACs become OGG."
)]
pub struct MusicCli {
    /// Input folder
    #[arg(value_name = "INPUT_DIR")]
    pub input_dir: PathBuf,

    /// Output folder
    #[arg(value_name = "OUTPUT_DIR")]
    pub output_dir: PathBuf,

    #[command(flatten)]
    pub common: CommonArgs,

    #[command(flatten)]
    pub mirror: MirrorArgs,

    /// ffmpeg program, may include a container runner prefix
    #[arg(long = "ffmpeg-path", alias = "ffpath", default_value = "ffmpeg")]
    pub ffmpeg_path: String,

    /// Codec options passed to ffmpeg, must contain -c:a
    #[arg(long = "ffmpeg-args", alias = "ffargs", allow_hyphen_values = true)]
    pub ffmpeg_args: Option<String>,

    /// Preset overriding masks and codec options
    #[arg(short, long, value_enum)]
    pub preset: Option<MusicPreset>,

    /// Show ffmpeg's own output
    #[arg(long = "verbose-ffmpeg", alias = "vff")]
    pub verbose_ffmpeg: bool,

    /// Measure integrated loudness and loudness range of every converted file
    #[arg(long = "loudness-report")]
    pub loudness_report: bool,

    /// Write cover.jpg from embedded art into folders that have no cover image
    #[arg(long = "extract-cover")]
    pub extract_cover: bool,
}

#[derive(Debug, Clone)]
pub struct MusicConfig {
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    pub run: RunOptions,
    pub mirror: MirrorOptions,
    pub ffmpeg: ToolSpec,
    pub ffmpeg_args: Vec<String>,
    pub verbose_ffmpeg: bool,
    pub loudness_report: bool,
    pub extract_cover: bool,
}

impl MusicCli {
    pub fn resolve(&self) -> Result<MusicConfig> {
        let run = self.common.resolve(WorkloadType::CpuBound)?;
        let mut mirror = self.mirror.resolve(MirrorDefaults {
            input_file_mask: DEFAULT_INPUT_MASK,
            output_format: DEFAULT_OUTPUT_FORMAT,
            copy_file_mask: "",
        })?;

        let mut raw_args = self
            .ffmpeg_args
            .clone()
            .unwrap_or_else(|| DEFAULT_FFMPEG_ARGS.to_string());
        if let Some(preset) = self.preset {
            let cfg = preset.config();
            if let Some(mask) = cfg.input_mask {
                mirror.input_mask = ExtensionMask::parse(mask)?;
            }
            mirror.output_format = cfg.output_format.to_string();
            raw_args = cfg.ffmpeg_args.to_string();
        }

        Ok(MusicConfig {
            input_dir: self.input_dir.clone(),
            output_dir: self.output_dir.clone(),
            run,
            mirror,
            ffmpeg: ToolSpec::parse(&self.ffmpeg_path)?,
            ffmpeg_args: parse_ffmpeg_args(&raw_args)?,
            verbose_ffmpeg: self.verbose_ffmpeg,
            loudness_report: self.loudness_report,
            extract_cover: self.extract_cover,
        })
    }
}

/// Split on whitespace; an argument list without an audio codec is rejected.
pub fn parse_ffmpeg_args(raw: &str) -> Result<Vec<String>> {
    let args: Vec<String> = raw.split_whitespace().map(str::to_string).collect();
    if !args.iter().any(|a| a == "-c:a") {
        return Err(BatchError::invalid(
            "--ffmpeg-args",
            "expected an audio codec such as \"-c:a libvorbis -q:a 7\"",
        ));
    }
    Ok(args)
}
