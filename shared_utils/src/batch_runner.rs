//! Mirror Batch Runner
//!
//! The pipeline shared by the tree-mirroring converters: walk the input in
//! natural order, route every file, stream conversions into the converter
//! pool and copies into the single-worker copy pool, then collect the tallies.
//!
//! Each converter supplies a [`TaskPlanner`] that turns an (input, output)
//! pair into a fully resolved [`ConversionTask`].

use crate::batch::{BatchResult, SharedBatchResult};
use crate::classifier::{Classifier, Route, SkipReason};
use crate::cli::RunOptions;
use crate::conversion::{run_conversion, Attempt, ConversionOutcome, ConversionTask};
use crate::errors::Result;
use crate::file_copier::{copy_file, CopyTask};
use crate::progress::ProgressReporter;
use crate::safety::DirectoryPlan;
use crate::shutdown::Shutdown;
use crate::task_pool::TaskPool;
use crate::tool_runner::ToolRunner;
use crate::walker::{DiscoveredFile, TreeWalker, WalkEvent};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

pub trait TaskPlanner: Send + Sync + 'static {
    fn plan(&self, input: &Path, output: &Path) -> ConversionTask;

    /// Hook run on the worker right after a successful conversion.
    fn after_conversion(&self, _runner: &ToolRunner, _task: &ConversionTask) {}
}

pub struct MirrorRun<'a> {
    /// Progress bar prefix, e.g. "🎵 music".
    pub label: &'a str,
    pub run: &'a RunOptions,
    pub dirs: &'a DirectoryPlan,
    pub classifier: &'a Classifier,
    pub runner: Arc<ToolRunner>,
    pub shutdown: Shutdown,
}

/// One line of the `--dry-run --json` plan.
#[derive(Debug, Serialize)]
struct PlanEntry<'a> {
    input: &'a Path,
    #[serde(flatten)]
    route: &'a Route,
}

/// Records a failure for its file if the task unwinds before finishing.
struct PanicGuard {
    path: Option<PathBuf>,
    results: Arc<SharedBatchResult>,
}

impl PanicGuard {
    fn new(path: &Path, results: &Arc<SharedBatchResult>) -> Self {
        Self {
            path: Some(path.to_path_buf()),
            results: Arc::clone(results),
        }
    }

    fn disarm(mut self) {
        self.path = None;
    }
}

impl Drop for PanicGuard {
    fn drop(&mut self) {
        if let Some(path) = self.path.take() {
            self.results
                .record(|r| r.fail(path, "conversion task panicked".to_string()));
        }
    }
}

pub fn run_mirror<P: TaskPlanner>(mirror: &MirrorRun<'_>, planner: Arc<P>) -> Result<BatchResult> {
    let run = mirror.run;
    let mut walker = TreeWalker::new(&mirror.dirs.input).ignore_dir(run.ignore_dir.as_deref());
    if let Some(nested) = &mirror.dirs.nested_output {
        walker = walker.exclude(nested);
    }

    let convert_pool = TaskPool::new("converter", run.workers, run.queue_depth)?;
    let copy_pool = TaskPool::new("copy", 1, run.queue_depth)?;
    let results = Arc::new(SharedBatchResult::new());
    let producer_done = AtomicBool::new(false);
    let reporter = ProgressReporter::new(mirror.label, !run.verbose);

    tracing::info!(
        input = %mirror.dirs.input.display(),
        output = %mirror.dirs.output.display(),
        workers = run.workers,
        dry_run = run.dry_run,
        "Starting batch"
    );

    let pools = [("converted", &convert_pool), ("copied", &copy_pool)];
    std::thread::scope(|scope| {
        let watcher = scope.spawn(|| reporter.watch(&pools, &producer_done));

        for event in walker.walk() {
            if mirror.shutdown.is_requested() {
                tracing::warn!("⚠️ Interrupted, no further files are queued");
                break;
            }
            match event {
                Ok(WalkEvent::Directory { path, relative }) => {
                    let out_dir = mirror.classifier.output_dir_for(&relative);
                    tracing::info!(dir = %path.display(), "📂 Entering directory");
                    if !run.dry_run {
                        if let Err(e) = std::fs::create_dir_all(&out_dir) {
                            tracing::warn!(dir = %out_dir.display(), error = %e, "Could not create output directory");
                        }
                    }
                }
                Ok(WalkEvent::File(file)) => {
                    let route = mirror.classifier.route(&file);
                    if run.dry_run {
                        print_plan_entry(&file, &route, run.json);
                        results.record(|r| match route {
                            Route::Convert { .. } => r.convert(false),
                            Route::Copy { .. } => r.copy(),
                            Route::Skip { .. } => r.skip(),
                        });
                        continue;
                    }
                    dispatch(mirror, &planner, &results, &convert_pool, &copy_pool, file, route);
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Walk error");
                    let path = match &e {
                        crate::errors::BatchError::Walk(w) => {
                            w.path().map(Path::to_path_buf).unwrap_or_default()
                        }
                        _ => PathBuf::new(),
                    };
                    results.record(|r| r.fail(path, e.to_string()));
                }
            }
        }

        producer_done.store(true, Ordering::Release);
        if watcher.join().is_err() {
            tracing::warn!("Progress watcher panicked");
        }
    });

    convert_pool.wait_idle();
    copy_pool.wait_idle();
    Ok(results.snapshot())
}

fn dispatch<P: TaskPlanner>(
    mirror: &MirrorRun<'_>,
    planner: &Arc<P>,
    results: &Arc<SharedBatchResult>,
    convert_pool: &TaskPool,
    copy_pool: &TaskPool,
    file: DiscoveredFile,
    route: Route,
) {
    match route {
        Route::Convert { output } => {
            let task = planner.plan(&file.path, &output);
            let runner = Arc::clone(&mirror.runner);
            let planner = Arc::clone(planner);
            let results = Arc::clone(results);
            let shutdown = mirror.shutdown.clone();
            convert_pool.submit(move || {
                if shutdown.is_requested() {
                    results.record(BatchResult::cancel);
                    return;
                }
                let guard = PanicGuard::new(&task.input, &results);
                let outcome = run_conversion(&runner, &task);
                match outcome {
                    ConversionOutcome::Converted { attempt, duration } => {
                        tracing::info!(
                            input = %task.input.display(),
                            output = %task.output.display(),
                            fallback = attempt == Attempt::Fallback,
                            ms = duration.as_millis() as u64,
                            "✅ Converted"
                        );
                        planner.after_conversion(&runner, &task);
                        results.record(|r| r.convert(attempt == Attempt::Fallback));
                    }
                    ConversionOutcome::Failed { reason } => {
                        tracing::warn!(input = %task.input.display(), error = %reason, "❌ Conversion failed");
                        let input = task.input.clone();
                        results.record(|r| r.fail(input, reason));
                    }
                }
                guard.disarm();
            });
        }
        Route::Copy {
            output,
            below_min_size,
        } => {
            let copy = CopyTask::new(file.path, output);
            let results = Arc::clone(results);
            let shutdown = mirror.shutdown.clone();
            copy_pool.submit(move || {
                if shutdown.is_requested() {
                    results.record(BatchResult::cancel);
                    return;
                }
                match copy_file(&copy) {
                    Ok(bytes) => {
                        tracing::info!(
                            input = %copy.input.display(),
                            bytes,
                            below_min_size,
                            "📦 Copied"
                        );
                        results.record(BatchResult::copy);
                    }
                    Err(e) => {
                        tracing::warn!(input = %copy.input.display(), error = %e, "❌ Copy failed");
                        let input = copy.input.clone();
                        results.record(|r| r.fail(input, e.to_string()));
                    }
                }
            });
        }
        Route::Skip { reason } => {
            match &reason {
                SkipReason::OutputExists(out) => {
                    tracing::info!(input = %file.path.display(), output = %out.display(), "⏭️ Output exists")
                }
                SkipReason::NotSelected | SkipReason::AlreadyInPlace => {
                    tracing::debug!(input = %file.path.display(), reason = ?reason, "⏭️ Skipped")
                }
            }
            results.record(BatchResult::skip);
        }
    }
}

fn print_plan_entry(file: &DiscoveredFile, route: &Route, json: bool) {
    if json {
        let entry = PlanEntry {
            input: &file.path,
            route,
        };
        match serde_json::to_string(&entry) {
            Ok(line) => println!("{}", line),
            Err(e) => tracing::warn!(error = %e, "Could not serialize plan entry"),
        }
        return;
    }
    let line = match route {
        Route::Convert { output } => format!("convert {} → {}", file.path.display(), output.display()),
        Route::Copy { output, .. } => format!("copy    {} → {}", file.path.display(), output.display()),
        Route::Skip { reason } => match reason {
            SkipReason::OutputExists(_) => format!("skip    {} (output exists)", file.path.display()),
            SkipReason::AlreadyInPlace => format!("keep    {}", file.path.display()),
            SkipReason::NotSelected => format!("skip    {}", file.path.display()),
        },
    };
    println!("{}", line);
}
