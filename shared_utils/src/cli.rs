//! Shared command-line arguments
//!
//! Flattened into each converter's clap parser, then resolved once into
//! immutable option structs that are passed by reference from there on.

use crate::errors::{BatchError, Result};
use crate::safety::OverwriteMode;
use crate::task_pool::DEFAULT_QUEUE_DEPTH;
use crate::thread_manager::{resolve_workers, WorkloadType};
use crate::tool_runner::PriorityStrategy;
use crate::types::{CopyMask, ExtensionMask, FileSize};
use clap::{Args, Parser};
use std::path::PathBuf;

#[derive(Args, Debug, Clone)]
pub struct CommonArgs {
    /// Parallel conversion workers (default depends on the tool)
    #[arg(short = 'w', long = "max-workers", alias = "max_workers")]
    pub max_workers: Option<usize>,

    /// Tasks queued per worker before the directory walk pauses
    #[arg(long = "queue-depth", default_value_t = DEFAULT_QUEUE_DEPTH)]
    pub queue_depth: usize,

    /// Print per-file progress instead of the progress bar
    #[arg(short, long)]
    pub verbose: bool,

    /// Only print what would be done, in traversal order
    #[arg(long = "dry-run", alias = "dry")]
    pub dry_run: bool,

    /// With --dry-run, print the plan as JSON lines
    #[arg(long, requires = "dry_run")]
    pub json: bool,

    /// Skip every directory with this name
    #[arg(long = "ignore-dir", alias = "ignore_dir")]
    pub ignore_dir: Option<String>,

    /// Do not lower the priority of spawned tools
    #[arg(long = "no-nice")]
    pub no_nice: bool,

    /// Directory for log files (default: system temp dir)
    #[arg(long = "log-dir")]
    pub log_dir: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct RunOptions {
    pub workers: usize,
    pub queue_depth: usize,
    pub verbose: bool,
    pub dry_run: bool,
    pub json: bool,
    pub ignore_dir: Option<String>,
    pub priority: PriorityStrategy,
}

impl CommonArgs {
    pub fn resolve(&self, workload: WorkloadType) -> Result<RunOptions> {
        if self.queue_depth == 0 {
            return Err(BatchError::invalid("--queue-depth", "must be at least 1"));
        }
        let priority = if self.no_nice {
            PriorityStrategy::Unchanged
        } else {
            PriorityStrategy::detect()
        };
        Ok(RunOptions {
            workers: resolve_workers(self.max_workers, workload)?,
            queue_depth: self.queue_depth,
            // dry runs print their plan line by line
            verbose: self.verbose || self.dry_run,
            dry_run: self.dry_run,
            json: self.json,
            ignore_dir: self.ignore_dir.clone().filter(|d| !d.is_empty()),
            priority,
        })
    }
}

/// Arguments of the tree-mirroring converters (music, picture).
#[derive(Args, Debug, Clone)]
pub struct MirrorArgs {
    /// Comma-separated extensions to convert
    #[arg(long = "input-file-mask", alias = "inputfilemask", alias = "ifm")]
    pub input_file_mask: Option<String>,

    /// Extension of converted files
    #[arg(long = "output-format", alias = "outputfilemask", alias = "ofm")]
    pub output_format: Option<String>,

    /// Extensions NOT to copy; '*' or 'all' copies nothing besides converted files
    #[arg(long = "copy-file-mask", alias = "copyfilemask", alias = "cfm")]
    pub copy_file_mask: Option<String>,

    /// Files below this size are copied instead of converted (e.g. 500KiB, 1 MB)
    #[arg(short = 'm', long = "minimum-file-size", alias = "ms")]
    pub minimum_file_size: Option<String>,

    /// Make output paths storable on FAT32
    #[arg(long = "fat32-compatible", alias = "fat")]
    pub fat32_compatible: bool,

    /// Write into a non-empty output directory, replacing existing files
    #[arg(long = "ignore-not-empty")]
    pub ignore_not_empty: bool,

    /// Write into a non-empty output directory, keeping existing files
    #[arg(long = "ignore-not-empty-and-preserve")]
    pub ignore_not_empty_and_preserve: bool,
}

/// Tool-specific defaults for [`MirrorArgs::resolve`].
#[derive(Debug, Clone, Copy)]
pub struct MirrorDefaults {
    pub input_file_mask: &'static str,
    pub output_format: &'static str,
    pub copy_file_mask: &'static str,
}

#[derive(Debug, Clone)]
pub struct MirrorOptions {
    pub input_mask: ExtensionMask,
    pub output_format: String,
    pub copy_mask: CopyMask,
    pub min_size: FileSize,
    pub fat32: bool,
    pub overwrite: OverwriteMode,
}

impl MirrorArgs {
    pub fn resolve(&self, defaults: MirrorDefaults) -> Result<MirrorOptions> {
        let input_mask = ExtensionMask::parse(
            self.input_file_mask
                .as_deref()
                .unwrap_or(defaults.input_file_mask),
        )?;
        if input_mask.is_empty() {
            return Err(BatchError::invalid("--input-file-mask", "no extensions given"));
        }

        let output_format = self
            .output_format
            .as_deref()
            .unwrap_or(defaults.output_format)
            .trim()
            .trim_start_matches('.')
            .to_lowercase();
        if output_format.is_empty() || !output_format.chars().all(char::is_alphanumeric) {
            return Err(BatchError::invalid(
                "--output-format",
                format!("'{}' is not a plain extension", output_format),
            ));
        }

        let copy_mask = CopyMask::parse(
            self.copy_file_mask
                .as_deref()
                .unwrap_or(defaults.copy_file_mask),
        )?;

        let min_size = match self.minimum_file_size.as_deref() {
            Some(raw) => FileSize::parse(raw).map_err(|e| match e {
                BatchError::InvalidArgument { reason, .. } => {
                    BatchError::invalid("--minimum-file-size", reason)
                }
                other => other,
            })?,
            None => FileSize::ZERO,
        };

        Ok(MirrorOptions {
            input_mask,
            output_format,
            copy_mask,
            min_size,
            fat32: self.fat32_compatible,
            overwrite: OverwriteMode::from_flags(
                self.ignore_not_empty,
                self.ignore_not_empty_and_preserve,
            ),
        })
    }
}

/// Process exit status for startup failures.
pub const EXIT_FAILURE: i32 = -1;

/// Exit status for a command line clap rejected. Help and version output
/// is not an error; anything else is an invalid argument.
pub fn parse_error_exit_code(err: &clap::Error) -> i32 {
    if err.use_stderr() {
        EXIT_FAILURE
    } else {
        0
    }
}

/// `P::parse()` with invalid arguments exiting [`EXIT_FAILURE`] instead of
/// clap's usage status.
pub fn parse_args<P: Parser>() -> P {
    match P::try_parse() {
        Ok(cli) => cli,
        Err(e) if !e.use_stderr() => e.exit(),
        Err(e) => {
            if e.print().is_err() {
                eprintln!("❌ {}", e);
            }
            std::process::exit(parse_error_exit_code(&e));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser, Debug)]
    #[command(version = "1.0")]
    struct TestCli {
        #[command(flatten)]
        common: CommonArgs,
        #[command(flatten)]
        mirror: MirrorArgs,
    }

    const DEFAULTS: MirrorDefaults = MirrorDefaults {
        input_file_mask: "flac,wav",
        output_format: "ogg",
        copy_file_mask: "",
    };

    #[test]
    fn test_defaults_resolve() {
        let cli = TestCli::parse_from(["test"]);
        let run = cli.common.resolve(WorkloadType::CpuBound).unwrap();
        assert!(run.workers >= 1);
        assert_eq!(run.queue_depth, DEFAULT_QUEUE_DEPTH);
        assert!(!run.dry_run);

        let mirror = cli.mirror.resolve(DEFAULTS).unwrap();
        assert_eq!(mirror.input_mask.to_string(), "flac,wav");
        assert_eq!(mirror.output_format, "ogg");
        assert_eq!(mirror.copy_mask, CopyMask::copy_everything());
        assert_eq!(mirror.min_size, FileSize::ZERO);
        assert_eq!(mirror.overwrite, OverwriteMode::Refuse);
    }

    #[test]
    fn test_flags_and_aliases() {
        let cli = TestCli::parse_from([
            "test",
            "--max_workers",
            "3",
            "--ifm",
            "PNG,.jpg",
            "--output-format",
            ".JXL",
            "--cfm",
            "*",
            "-m",
            "1 MiB",
            "--fat",
            "--ignore-not-empty-and-preserve",
            "--dry",
            "--json",
            "--no-nice",
        ]);
        let run = cli.common.resolve(WorkloadType::MemoryHeavy).unwrap();
        assert_eq!(run.workers, 3);
        assert!(run.dry_run && run.json && run.verbose);
        assert_eq!(run.priority, PriorityStrategy::Unchanged);

        let mirror = cli.mirror.resolve(DEFAULTS).unwrap();
        assert_eq!(mirror.input_mask.to_string(), "png,jpg");
        assert_eq!(mirror.output_format, "jxl");
        assert_eq!(mirror.copy_mask, CopyMask::ExcludeAll);
        assert_eq!(mirror.min_size.bytes(), 1_048_576);
        assert!(mirror.fat32);
        assert_eq!(mirror.overwrite, OverwriteMode::Preserve);
    }

    #[test]
    fn test_invalid_values_are_startup_fatal() {
        let cli = TestCli::parse_from(["test", "-m", "12 parsecs"]);
        let err = cli.mirror.resolve(DEFAULTS).unwrap_err();
        assert!(err.is_startup_fatal());
        assert!(err.to_string().contains("--minimum-file-size"));

        let cli = TestCli::parse_from(["test", "--max-workers", "0"]);
        assert!(cli.common.resolve(WorkloadType::CpuBound).is_err());

        let cli = TestCli::parse_from(["test", "--output-format", "tar.gz"]);
        assert!(cli.mirror.resolve(DEFAULTS).is_err());
    }

    #[test]
    fn test_json_requires_dry_run() {
        assert!(TestCli::try_parse_from(["test", "--json"]).is_err());
    }

    #[test]
    fn test_parse_errors_exit_with_failure_status() {
        for bad in [
            vec!["test", "--max-workers", "many"],
            vec!["test", "--no-such-flag"],
            vec!["test", "--json"],
        ] {
            let err = TestCli::try_parse_from(bad.clone()).unwrap_err();
            assert_eq!(parse_error_exit_code(&err), EXIT_FAILURE, "{:?}", bad);
        }
        let help = TestCli::try_parse_from(["test", "--help"]).unwrap_err();
        assert_eq!(parse_error_exit_code(&help), 0);
        let version = TestCli::try_parse_from(["test", "--version"]).unwrap_err();
        assert_eq!(parse_error_exit_code(&version), 0);
    }
}
