//! Progress Reporter
//!
//! One indicatif bar per run, fed by a watcher thread that polls the task
//! pools. The producer keeps walking and submitting while the watcher runs;
//! the bar length grows as files are discovered.

use crate::task_pool::TaskPool;
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

pub mod templates {
    pub const BATCH: &str = "{spinner:.green} {prefix:.cyan.bold} ▕{bar:35.green/black}▏ {percent:>3}% • {pos}/{len} • ⏱️ {elapsed_precise} • {msg}";
    pub const PROGRESS_CHARS: &str = "█▓░";
    pub const SPINNER_CHARS: &str = "⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏";
}

const POLL_INTERVAL: Duration = Duration::from_millis(100);

pub struct ProgressReporter {
    bar: ProgressBar,
}

impl ProgressReporter {
    /// A hidden reporter still counts, it just never draws. Used in verbose
    /// mode where per-file log lines replace the bar.
    pub fn new(prefix: &str, visible: bool) -> Self {
        let bar = ProgressBar::new(0);
        if visible {
            if let Ok(style) = ProgressStyle::default_bar().template(templates::BATCH) {
                bar.set_style(
                    style
                        .progress_chars(templates::PROGRESS_CHARS)
                        .tick_chars(templates::SPINNER_CHARS),
                );
            }
            bar.set_prefix(prefix.to_string());
            bar.set_draw_target(ProgressDrawTarget::stderr_with_hz(10));
        } else {
            bar.set_draw_target(ProgressDrawTarget::hidden());
        }
        Self { bar }
    }

    pub fn hidden() -> Self {
        Self::new("", false)
    }

    /// Poll `pools` until the producer is done and every submitted task has
    /// completed. Never blocks submission.
    pub fn watch(&self, pools: &[(&str, &TaskPool)], producer_done: &AtomicBool) {
        loop {
            // read the flag before the counters: once it is set, every
            // submission is already reflected in `submitted`
            let done = producer_done.load(Ordering::Acquire);
            let (submitted, completed) = pools.iter().fold((0, 0), |(s, c), (_, pool)| {
                (s + pool.submitted(), c + pool.completed())
            });

            self.bar.set_length(submitted as u64);
            self.bar.set_position(completed as u64);
            self.bar.set_message(status_line(pools));

            if done && completed >= submitted {
                break;
            }
            std::thread::sleep(POLL_INTERVAL);
        }
        self.bar.finish_and_clear();
    }

    pub fn println(&self, msg: &str) {
        self.bar.suspend(|| eprintln!("{}", msg));
    }
}

/// "converted 12 of 40 • copied 3 of 5"
pub fn status_line(pools: &[(&str, &TaskPool)]) -> String {
    pools
        .iter()
        .map(|(label, pool)| format!("{} {} of {}", label, pool.completed(), pool.submitted()))
        .collect::<Vec<_>>()
        .join(" • ")
}

pub fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    if secs >= 3600 {
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    } else if secs >= 60 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{:.1}s", duration.as_secs_f64())
    }
}
