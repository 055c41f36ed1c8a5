//! Conversion Runner
//!
//! Runs one [`ConversionTask`] as an explicit two-step sequence:
//!
//! 1. the primary invocation (input → output)
//! 2. only if that fails and a [`FallbackPlan`] exists: prepare a lossless
//!    intermediate, convert the intermediate once, delete the intermediate
//!
//! Success means exit status 0 and the output file present. A file that
//! still fails is reported and any partial output is removed.

use crate::file_copier::{ensure_parent_dir_exists, preserve_timestamps, remove_if_present};
use crate::tool_runner::{ToolInvocation, ToolRunner};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// Alternate tool chain tried after the primary attempt failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FallbackPlan {
    pub intermediate: PathBuf,
    /// Produces `intermediate` from the input.
    pub prepare: ToolInvocation,
    /// Converts `intermediate` to the final output.
    pub retry: ToolInvocation,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionTask {
    pub input: PathBuf,
    pub output: PathBuf,
    pub primary: ToolInvocation,
    pub fallback: Option<FallbackPlan>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Attempt {
    Primary,
    Fallback,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConversionOutcome {
    Converted { attempt: Attempt, duration: Duration },
    Failed { reason: String },
}

impl ConversionOutcome {
    pub fn is_converted(&self) -> bool {
        matches!(self, ConversionOutcome::Converted { .. })
    }
}

pub fn run_conversion(runner: &ToolRunner, task: &ConversionTask) -> ConversionOutcome {
    let start = Instant::now();
    // cleanup of a failed attempt removes the output, which must never be the source
    if is_same_file(&task.input, &task.output) {
        return ConversionOutcome::Failed {
            reason: format!("output {} is the input file itself", task.output.display()),
        };
    }
    if let Err(e) = ensure_parent_dir_exists(&task.output) {
        return ConversionOutcome::Failed {
            reason: e.to_string(),
        };
    }

    let primary_error = match attempt(runner, &task.primary, &task.output) {
        Ok(()) => return converted(task, Attempt::Primary, start),
        Err(reason) => reason,
    };

    remove_if_present(&task.output);
    let Some(plan) = &task.fallback else {
        return ConversionOutcome::Failed {
            reason: primary_error,
        };
    };

    tracing::info!(
        input = %task.input.display(),
        error = %primary_error,
        "Primary conversion failed, trying fallback"
    );

    let fallback = attempt(runner, &plan.prepare, &plan.intermediate)
        .and_then(|()| attempt(runner, &plan.retry, &task.output));
    remove_if_present(&plan.intermediate);

    match fallback {
        Ok(()) => converted(task, Attempt::Fallback, start),
        Err(fallback_error) => {
            remove_if_present(&task.output);
            ConversionOutcome::Failed {
                reason: format!("{}; fallback: {}", primary_error, fallback_error),
            }
        }
    }
}

fn converted(task: &ConversionTask, attempt: Attempt, start: Instant) -> ConversionOutcome {
    preserve_timestamps(&task.input, &task.output);
    ConversionOutcome::Converted {
        attempt,
        duration: start.elapsed(),
    }
}

fn attempt(runner: &ToolRunner, invocation: &ToolInvocation, expected: &Path) -> Result<(), String> {
    let output = runner.run(invocation).map_err(|e| e.to_string())?;
    if !output.success() {
        return Err(match output.exit_code {
            Some(code) => format!("{} exited with status {}", invocation.label(), code),
            None => format!("{} was terminated by a signal", invocation.label()),
        });
    }
    if !expected.exists() {
        return Err(format!(
            "{} produced no output at {}",
            invocation.label(),
            expected.display()
        ));
    }
    Ok(())
}

fn is_same_file(input: &Path, output: &Path) -> bool {
    if input == output {
        return true;
    }
    match (input.canonicalize(), output.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}


#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::tool_runner::{PriorityStrategy, ToolSpec};
    use std::fs;
    use tempfile::TempDir;

    /// Fake tool run through `sh` so the script never needs the exec bit.
    /// Every call appends its arguments to `calls.log`.
    fn fake_tool(dir: &Path, name: &str, body: &str) -> ToolSpec {
        let script = dir.join(format!("{}.sh", name));
        let log = dir.join("calls.log");
        fs::write(
            &script,
            format!("echo \"{} $*\" >> '{}'\n{}\n", name, log.display(), body),
        )
        .unwrap();
        ToolSpec::parse(&format!("sh {}", script.display())).unwrap()
    }

    fn calls(dir: &Path) -> Vec<String> {
        fs::read_to_string(dir.join("calls.log"))
            .unwrap_or_default()
            .lines()
            .map(str::to_string)
            .collect()
    }

    fn runner() -> ToolRunner {
        ToolRunner::new(PriorityStrategy::Unchanged)
    }

    fn task(dir: &Path, encoder: &ToolSpec, prep: &ToolSpec) -> ConversionTask {
        let input = dir.join("in.webp");
        fs::write(&input, b"img").unwrap();
        let output = dir.join("out/in.jxl");
        let intermediate = dir.join("out/in.png");
        ConversionTask {
            primary: encoder.invocation().path_arg(&input).path_arg(&output),
            fallback: Some(FallbackPlan {
                prepare: prep.invocation().path_arg(&input).path_arg(&intermediate),
                retry: encoder.invocation().path_arg(&intermediate).path_arg(&output),
                intermediate,
            }),
            input,
            output,
        }
    }

    #[test]
    fn test_primary_success_skips_fallback() {
        let temp = TempDir::new().unwrap();
        let enc = fake_tool(temp.path(), "enc", "cp \"$1\" \"$2\"");
        let prep = fake_tool(temp.path(), "prep", "cp \"$1\" \"$2\"");
        let t = task(temp.path(), &enc, &prep);

        let outcome = run_conversion(&runner(), &t);
        assert!(matches!(outcome, ConversionOutcome::Converted { attempt: Attempt::Primary, .. }));
        assert!(t.output.exists());
        assert_eq!(calls(temp.path()).len(), 1);
    }

    #[test]
    fn test_missing_output_triggers_exactly_one_fallback() {
        let temp = TempDir::new().unwrap();
        // encoder only understands the png intermediate
        let enc = fake_tool(
            temp.path(),
            "enc",
            "case \"$1\" in *.png) cp \"$1\" \"$2\";; esac\nexit 0",
        );
        let prep = fake_tool(temp.path(), "prep", "cp \"$1\" \"$2\"");
        let t = task(temp.path(), &enc, &prep);

        let outcome = run_conversion(&runner(), &t);
        assert!(matches!(outcome, ConversionOutcome::Converted { attempt: Attempt::Fallback, .. }));
        assert!(t.output.exists());
        let fb = t.fallback.as_ref().unwrap();
        assert!(!fb.intermediate.exists(), "intermediate must be cleaned up");

        let log = calls(temp.path());
        assert_eq!(log.len(), 3);
        assert!(log[0].starts_with("enc "));
        assert!(log[1].starts_with("prep "));
        assert!(log[2].starts_with("enc "));
    }

    #[test]
    fn test_failed_fallback_leaves_no_output() {
        let temp = TempDir::new().unwrap();
        // writes a partial file then fails every time
        let enc = fake_tool(temp.path(), "enc", "echo partial > \"$2\"\nexit 1");
        let prep = fake_tool(temp.path(), "prep", "cp \"$1\" \"$2\"");
        let t = task(temp.path(), &enc, &prep);

        let outcome = run_conversion(&runner(), &t);
        match outcome {
            ConversionOutcome::Failed { reason } => {
                assert!(reason.contains("exited with status 1"), "{}", reason);
                assert!(reason.contains("fallback"), "{}", reason);
            }
            other => panic!("expected failure, got {:?}", other),
        }
        assert!(!t.output.exists());
        assert!(!t.fallback.as_ref().unwrap().intermediate.exists());
        let enc_calls = calls(temp.path()).iter().filter(|l| l.starts_with("enc ")).count();
        assert_eq!(enc_calls, 2, "one primary and exactly one fallback attempt");
    }

    #[test]
    fn test_no_fallback_plan_fails_after_primary() {
        let temp = TempDir::new().unwrap();
        let enc = fake_tool(temp.path(), "enc", "exit 0");
        let prep = fake_tool(temp.path(), "prep", "exit 0");
        let mut t = task(temp.path(), &enc, &prep);
        t.fallback = None;

        let outcome = run_conversion(&runner(), &t);
        match outcome {
            ConversionOutcome::Failed { reason } => assert!(reason.contains("produced no output")),
            other => panic!("expected failure, got {:?}", other),
        }
        assert_eq!(calls(temp.path()).len(), 1);
    }

    #[test]
    fn test_output_equal_to_input_is_refused() {
        let temp = TempDir::new().unwrap();
        let enc = fake_tool(temp.path(), "enc", "echo clobbered > \"$2\"\nexit 1");
        let prep = fake_tool(temp.path(), "prep", "cp \"$1\" \"$2\"");
        let mut t = task(temp.path(), &enc, &prep);
        t.output = temp.path().join("./in.webp");
        t.primary = enc.invocation().path_arg(&t.input).path_arg(&t.output);

        let outcome = run_conversion(&runner(), &t);
        match outcome {
            ConversionOutcome::Failed { reason } => assert!(reason.contains("input file itself"), "{}", reason),
            other => panic!("expected failure, got {:?}", other),
        }
        assert!(calls(temp.path()).is_empty());
        assert_eq!(fs::read(&t.input).unwrap(), b"img");
    }

    #[test]
    fn test_failure_next_to_source_keeps_source() {
        let temp = TempDir::new().unwrap();
        let enc = fake_tool(temp.path(), "enc", "echo partial > \"$2\"\nexit 1");
        let prep = fake_tool(temp.path(), "prep", "exit 1");
        let mut t = task(temp.path(), &enc, &prep);
        t.output = temp.path().join("in.jxl");
        t.primary = enc.invocation().path_arg(&t.input).path_arg(&t.output);
        if let Some(fb) = t.fallback.as_mut() {
            fb.intermediate = temp.path().join("in.fallback.png");
            fb.prepare = prep.invocation().path_arg(&t.input).path_arg(&fb.intermediate);
            fb.retry = enc.invocation().path_arg(&fb.intermediate).path_arg(&t.output);
        }

        let outcome = run_conversion(&runner(), &t);
        assert!(!outcome.is_converted());
        assert!(!t.output.exists());
        assert_eq!(fs::read(&t.input).unwrap(), b"img");
    }
}
