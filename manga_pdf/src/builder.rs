//! Walk, pre-process and bind

use crate::config::MangaConfig;
use crate::pages::{collect_pages, page_task, walk_pages, Page, PageKind};
use crate::pdf::{assemble_pdf, PdfLayout};
use shared_utils::batch::{BatchResult, SharedBatchResult};
use shared_utils::conversion::{run_conversion, Attempt, ConversionOutcome};
use shared_utils::errors::{BatchError, Result};
use shared_utils::progress::ProgressReporter;
use shared_utils::shutdown::Shutdown;
use shared_utils::task_pool::TaskPool;
use shared_utils::tool_runner::ToolRunner;
use std::ops::ControlFlow;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

#[derive(Debug)]
pub struct MangaRun {
    /// `converted` counts pre-processed pages, `copied` pages used as-is.
    pub result: BatchResult,
    /// Pages that made it into the PDF.
    pub bound_pages: usize,
}

pub fn build_pdf(config: &MangaConfig, shutdown: Shutdown) -> Result<MangaRun> {
    if !config.input_dir.is_dir() {
        return Err(BatchError::InputNotFound(config.input_dir.clone()));
    }
    if config.run.dry_run {
        let pages = collect_pages(config)?;
        tracing::info!(pages = pages.len(), "Pages collected");
        let mut result = BatchResult::new();
        for page in &pages {
            print_page(page, &config.input_dir, config.run.json);
            match page.kind {
                PageKind::AsIs => result.copy(),
                PageKind::FlattenPng | PageKind::WebpToJpeg => result.convert(false),
            }
        }
        return Ok(MangaRun {
            result,
            bound_pages: 0,
        });
    }

    let scratch = tempfile::Builder::new()
        .prefix("manga-pdf-")
        .tempdir()
        .map_err(|e| BatchError::io(std::env::temp_dir(), e))?;
    let runner = Arc::new(ToolRunner::new(config.run.priority));
    let results = Arc::new(SharedBatchResult::new());

    // pages are submitted while the walk goes on; their numbers keep the binding order
    let mut pages: Vec<Page> = Vec::new();
    let walked = {
        let pool = TaskPool::new("converter", config.run.workers, config.run.queue_depth)?;
        let producer_done = AtomicBool::new(false);
        let reporter = ProgressReporter::new("📖 pages", !config.run.verbose);
        let pools = [("prepared", &pool)];

        let walked = std::thread::scope(|scope| {
            let watcher = scope.spawn(|| reporter.watch(&pools, &producer_done));
            let walked = walk_pages(config, |page| {
                if shutdown.is_requested() {
                    return ControlFlow::Break(());
                }
                submit_page(&pool, config, &page, scratch.path(), &runner, &results, &shutdown);
                pages.push(page);
                ControlFlow::Continue(())
            });
            producer_done.store(true, Ordering::Release);
            if watcher.join().is_err() {
                tracing::warn!("Progress watcher panicked");
            }
            walked
        });
        pool.wait_idle();
        walked
    };
    let found = walked?;
    tracing::info!(pages = found, "Pages collected");

    if shutdown.is_requested() {
        return Err(BatchError::Interrupted);
    }

    let files = bound_files(&pages, scratch.path());
    if files.len() < pages.len() {
        tracing::warn!(
            dropped = pages.len() - files.len(),
            "⚠️ Pages that failed to convert are left out of the PDF"
        );
    }

    let layout = PdfLayout {
        page_size: config.page_size.clone(),
        auto_orient: config.auto_orient,
        rotation: config.rotation,
    };
    assemble_pdf(&runner, &config.img2pdf, &layout, &config.output_pdf, &files)?;

    Ok(MangaRun {
        result: results.snapshot(),
        bound_pages: files.len(),
    })
}

fn submit_page(
    pool: &TaskPool,
    config: &MangaConfig,
    page: &Page,
    scratch: &Path,
    runner: &Arc<ToolRunner>,
    results: &Arc<SharedBatchResult>,
    shutdown: &Shutdown,
) {
    let Some(task) = page_task(&config.magick, page, scratch) else {
        results.record(BatchResult::copy);
        return;
    };
    let runner = Arc::clone(runner);
    let results = Arc::clone(results);
    let shutdown = shutdown.clone();
    pool.submit(move || {
        if shutdown.is_requested() {
            results.record(BatchResult::cancel);
            return;
        }
        match run_conversion(&runner, &task) {
            ConversionOutcome::Converted { attempt, .. } => {
                results.record(|r| r.convert(attempt == Attempt::Fallback));
            }
            ConversionOutcome::Failed { reason } => {
                tracing::warn!(page = %task.input.display(), error = %reason, "❌ Page conversion failed");
                let input = task.input.clone();
                results.record(|r| r.fail(input, reason));
            }
        }
    });
}

/// Files to bind, in page order. A pre-processed page whose scratch file is
/// missing failed and is dropped.
fn bound_files(pages: &[Page], scratch: &Path) -> Vec<PathBuf> {
    pages
        .iter()
        .filter_map(|page| match page.prepared_name() {
            None => Some(page.source.clone()),
            Some(name) => {
                let prepared = scratch.join(name);
                prepared.exists().then_some(prepared)
            }
        })
        .collect()
}

fn print_page(page: &Page, root: &Path, json: bool) {
    if json {
        match serde_json::to_string(page) {
            Ok(line) => println!("{}", line),
            Err(e) => tracing::warn!(error = %e, "Could not serialize page"),
        }
        return;
    }
    let shown = page.source.strip_prefix(root).unwrap_or(&page.source);
    let note = match page.kind {
        PageKind::AsIs => "",
        PageKind::FlattenPng => "  (flatten alpha)",
        PageKind::WebpToJpeg => "  (webp → jpg)",
    };
    println!("{:>5}. {}{}", page.number, shown.display(), note);
}
