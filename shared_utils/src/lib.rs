//! Shared core of the batch media converters
//!
//! Used by manga-pdf, music-batch and picture-batch:
//! - Natural sort and a natural-order tree walker
//! - FAT32-compatible path sanitizing
//! - Classification into convert / copy / skip
//! - Bounded task pools with drain-on-drop
//! - External tool invocation with lowered priority and a fallback chain
//! - Progress bar, summary report, logging

pub mod batch;
pub mod batch_runner;
pub mod classifier;
pub mod cli;
pub mod conversion;
pub mod errors;
pub mod fat32;
pub mod file_copier;
pub mod logging;
pub mod natural_sort;
pub mod path_safety;
pub mod progress;
pub mod report;
pub mod safety;
pub mod shutdown;
pub mod task_pool;
pub mod thread_manager;
pub mod tool_runner;
pub mod types;
pub mod walker;

pub use batch::{BatchResult, SharedBatchResult};
pub use batch_runner::{run_mirror, MirrorRun, TaskPlanner};
pub use classifier::{Classifier, Route, SkipReason};
pub use cli::{CommonArgs, MirrorArgs, MirrorDefaults, MirrorOptions, RunOptions};
pub use conversion::{run_conversion, Attempt, ConversionOutcome, ConversionTask, FallbackPlan};
pub use errors::{BatchError, Result};
pub use fat32::{make_fat32_compatible, sanitize_segment};
pub use file_copier::{copy_file, preserve_timestamps, CopyTask};
pub use logging::{init_logging, LogConfig};
pub use natural_sort::{compare_file_names, natural_cmp, sort_naturally, SortKey};
pub use progress::{format_duration, ProgressReporter};
pub use report::{print_simple_summary, print_summary_report};
pub use safety::{plan_directories, DirectoryPlan, OverwriteMode};
pub use shutdown::Shutdown;
pub use task_pool::{TaskPool, DEFAULT_QUEUE_DEPTH};
pub use thread_manager::{resolve_workers, WorkloadType};
pub use tool_runner::{PriorityStrategy, ToolInvocation, ToolOutput, ToolRunner, ToolSpec};
pub use types::{CopyMask, ExtensionMask, FileSize};
pub use walker::{DiscoveredFile, TreeWalker, WalkEvent};
