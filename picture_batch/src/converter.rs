//! cjxl task planning and the batch entry point
//!
//! Fallback for images cjxl cannot decode (CMYK JPEGs, odd TIFFs, animated
//! WebP): ImageMagick renders a PNG next to the output, cjxl encodes that.

use crate::config::PictureConfig;
use shared_utils::batch::BatchResult;
use shared_utils::batch_runner::{run_mirror, MirrorRun, TaskPlanner};
use shared_utils::classifier::Classifier;
use shared_utils::conversion::{ConversionTask, FallbackPlan};
use shared_utils::errors::Result;
use shared_utils::safety::{plan_directories, OverwriteMode};
use shared_utils::shutdown::Shutdown;
use shared_utils::tool_runner::{ToolInvocation, ToolRunner, ToolSpec};
use std::path::Path;
use std::sync::Arc;

pub struct CjxlPlanner {
    cjxl: ToolSpec,
    magick: ToolSpec,
    cjxl_args: Vec<String>,
    effort: Option<u8>,
    verbose_cjxl: bool,
}

impl CjxlPlanner {
    pub fn new(config: &PictureConfig) -> Self {
        Self {
            cjxl: config.cjxl.clone(),
            magick: config.magick.clone(),
            cjxl_args: config.cjxl_args.clone(),
            effort: config.effort,
            verbose_cjxl: config.verbose_cjxl,
        }
    }

    /// `cjxl <in> <out> [--verbose] [-e N] <args>`
    fn encode(&self, input: &Path, output: &Path) -> ToolInvocation {
        let mut invocation = self.cjxl.invocation().path_arg(input).path_arg(output);
        if self.verbose_cjxl {
            invocation = invocation.arg("--verbose");
        }
        if let Some(effort) = self.effort {
            invocation = invocation.arg("-e").arg(effort.to_string());
        }
        invocation.args(&self.cjxl_args)
    }
}

impl TaskPlanner for CjxlPlanner {
    fn plan(&self, input: &Path, output: &Path) -> ConversionTask {
        // never `<stem>.png`: in same-dir mode that could be the source itself
        let intermediate = output.with_extension("fallback.png");
        ConversionTask {
            input: input.to_path_buf(),
            output: output.to_path_buf(),
            primary: self.encode(input, output),
            fallback: Some(FallbackPlan {
                prepare: self
                    .magick
                    .invocation()
                    .path_arg(input)
                    .args(["-render", "-auto-orient"])
                    .path_arg(&intermediate),
                retry: self.encode(&intermediate, output),
                intermediate,
            }),
        }
    }
}

pub fn run(config: &PictureConfig, shutdown: Shutdown) -> Result<BatchResult> {
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

    let runner = ToolRunner::new(config.run.priority).echo_output(config.verbose_cjxl);
    run_mirror(
        &MirrorRun {
            label: "🖼️  picture",
            run: &config.run,
            dirs: &dirs,
            classifier: &classifier,
            runner: Arc::new(runner),
            shutdown,
        },
        Arc::new(CjxlPlanner::new(config)),
    )
}
