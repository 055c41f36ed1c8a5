//! ffmpeg task planning and the batch entry point

use crate::config::MusicConfig;
use crate::cover_art::CoverExtractor;
use crate::loudness::{self, LoudnessLog};
use shared_utils::batch::BatchResult;
use shared_utils::batch_runner::{run_mirror, MirrorRun, TaskPlanner};
use shared_utils::classifier::Classifier;
use shared_utils::conversion::{ConversionTask, FallbackPlan};
use shared_utils::errors::Result;
use shared_utils::safety::{plan_directories, OverwriteMode};
use shared_utils::shutdown::Shutdown;
use shared_utils::tool_runner::{ToolInvocation, ToolRunner, ToolSpec};
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub struct FfmpegPlanner {
    ffmpeg: ToolSpec,
    codec_args: Vec<String>,
    verbose_ffmpeg: bool,
    loudness: Option<LoudnessLog>,
    covers: Option<CoverExtractor>,
}

impl FfmpegPlanner {
    pub fn new(config: &MusicConfig) -> Self {
        Self {
            ffmpeg: config.ffmpeg.clone(),
            codec_args: config.ffmpeg_args.clone(),
            verbose_ffmpeg: config.verbose_ffmpeg,
            loudness: config.loudness_report.then(LoudnessLog::default),
            covers: config.extract_cover.then(CoverExtractor::new),
        }
    }

    /// `ffmpeg -y -i <input> [-loglevel error]`
    fn base(&self, input: &Path) -> ToolInvocation {
        let invocation = self.ffmpeg.invocation().args(["-y", "-i"]).path_arg(input);
        if self.verbose_ffmpeg {
            invocation
        } else {
            invocation.args(["-loglevel", "error"])
        }
    }

    fn encode(&self, input: &Path, output: &Path) -> ToolInvocation {
        self.base(input).args(&self.codec_args).path_arg(output)
    }

    pub fn loudness_entries(&self) -> Vec<(PathBuf, loudness::Loudness)> {
        self.loudness
            .as_ref()
            .map(LoudnessLog::entries)
            .unwrap_or_default()
    }
}

impl TaskPlanner for FfmpegPlanner {
    /// Fallback: decode the audio stream alone to FLAC, then encode that.
    fn plan(&self, input: &Path, output: &Path) -> ConversionTask {
        let intermediate = output.with_extension("fallback.flac");
        ConversionTask {
            input: input.to_path_buf(),
            output: output.to_path_buf(),
            primary: self.encode(input, output),
            fallback: Some(FallbackPlan {
                prepare: self
                    .base(input)
                    .args(["-map", "0:a", "-c:a", "flac"])
                    .path_arg(&intermediate),
                retry: self.encode(&intermediate, output),
                intermediate,
            }),
        }
    }

    fn after_conversion(&self, runner: &ToolRunner, task: &ConversionTask) {
        if let Some(log) = &self.loudness {
            if let Some(l) = loudness::measure(runner, &self.ffmpeg, &task.output) {
                log.record(task.output.clone(), l);
            }
        }
        if let (Some(covers), Some(out_dir)) = (&self.covers, task.output.parent()) {
            covers.extract(runner, &self.ffmpeg, &task.input, out_dir);
        }
    }
}

pub struct MusicRun {
    pub result: BatchResult,
    pub loudness: Vec<(PathBuf, loudness::Loudness)>,
}

pub fn run(config: &MusicConfig, shutdown: Shutdown) -> Result<MusicRun> {
    let dirs = plan_directories(&config.input_dir, &config.output_dir, config.mirror.overwrite)?;
    let classifier = Classifier::new(
        config.mirror.input_mask.clone(),
        &config.mirror.output_format,
        &dirs.output,
    )
    .copy_mask(config.mirror.copy_mask.clone())
    .min_size(config.mirror.min_size)
    .preserve_existing(config.mirror.overwrite == OverwriteMode::Preserve)
    .fat32(config.mirror.fat32)
    .same_dir(dirs.same_dir);

    tracing::info!(
        mask = %config.mirror.input_mask,
        format = %config.mirror.output_format,
        args = %config.ffmpeg_args.join(" "),
        "🎵 Conversion settings"
    );

    let planner = Arc::new(FfmpegPlanner::new(config));
    let runner = ToolRunner::new(config.run.priority).echo_output(config.verbose_ffmpeg);
    let result = run_mirror(
        &MirrorRun {
            label: "🎵 music",
            run: &config.run,
            dirs: &dirs,
            classifier: &classifier,
            runner: Arc::new(runner),
            shutdown,
        },
        Arc::clone(&planner),
    )?;

    Ok(MusicRun {
        result,
        loudness: planner.loudness_entries(),
    })
}
