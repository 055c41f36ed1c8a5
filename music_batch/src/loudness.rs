//! EBU R128 loudness report
//!
//! ffmpeg's `ebur128` filter does the measuring; this module only runs it
//! and reads the summary it prints to stderr.

use regex::Regex;
use shared_utils::tool_runner::{ToolRunner, ToolSpec};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, OnceLock, PoisonError};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Loudness {
    /// Integrated loudness in LUFS.
    pub integrated: f64,
    /// Loudness range in LU.
    pub range: f64,
}

fn integrated_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"Integrated loudness:\s*I:\s*(-?[\d.]+)").expect("Invalid loudness pattern")
    })
}

fn range_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"Loudness range:\s*LRA:\s*(-?[\d.]+)").expect("Invalid loudness pattern")
    })
}

/// Read the summary block of the ebur128 filter. Silent input reports
/// `-inf`, which does not parse and yields `None`.
pub fn parse_ebur128_summary(stderr: &str) -> Option<Loudness> {
    let capture = |re: &Regex| -> Option<f64> {
        re.captures_iter(stderr)
            .last()
            .and_then(|c| c.get(1))
            .and_then(|m| m.as_str().parse().ok())
    };
    Some(Loudness {
        integrated: capture(integrated_regex())?,
        range: capture(range_regex())?,
    })
}

pub fn measure(runner: &ToolRunner, ffmpeg: &ToolSpec, file: &Path) -> Option<Loudness> {
    let invocation = ffmpeg
        .invocation()
        .args(["-hide_banner", "-nostats", "-i"])
        .path_arg(file)
        .args(["-af", "ebur128", "-f", "null", "-"]);
    match runner.run(&invocation) {
        Ok(output) if output.success() => parse_ebur128_summary(&output.output),
        Ok(output) => {
            tracing::debug!(file = %file.display(), exit_code = ?output.exit_code, "Loudness measurement failed");
            None
        }
        Err(e) => {
            tracing::debug!(file = %file.display(), error = %e, "Loudness measurement failed");
            None
        }
    }
}

/// Collected from the worker threads, printed once the batch is over.
#[derive(Debug, Default)]
pub struct LoudnessLog(Mutex<Vec<(PathBuf, Loudness)>>);

impl LoudnessLog {
    pub fn record(&self, file: PathBuf, loudness: Loudness) {
        tracing::info!(
            file = %file.display(),
            integrated_lufs = loudness.integrated,
            lra = loudness.range,
            "🔊 Loudness measured"
        );
        self.0
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((file, loudness));
    }

    /// Entries sorted by path.
    pub fn entries(&self) -> Vec<(PathBuf, Loudness)> {
        let mut entries = self.0.lock().unwrap_or_else(PoisonError::into_inner).clone();
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        entries
    }
}

pub fn print_loudness_report(entries: &[(PathBuf, Loudness)]) {
    if entries.is_empty() {
        return;
    }
    println!();
    println!("🔊 Loudness (EBU R128)");
    println!("   {:>9}  {:>7}  file", "I (LUFS)", "LRA (LU)");
    for (file, l) in entries {
        println!("   {:>9.1}  {:>7.1}  {}", l.integrated, l.range, file.display());
    }
}
