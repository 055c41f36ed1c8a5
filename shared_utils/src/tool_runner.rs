//! External Tool Invoker
//!
//! Every transcoder call goes through [`ToolRunner::run`]: one blocking
//! subprocess per file, priority lowered according to a [`PriorityStrategy`]
//! picked once at startup, stdout and stderr captured and logged.

use crate::errors::{BatchError, Result};
use crate::logging::log_external_tool;
use crate::path_safety::safe_path_arg;
use std::ffi::{OsStr, OsString};
use std::path::Path;
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

#[cfg(windows)]
const BELOW_NORMAL_PRIORITY_CLASS: u32 = 0x0000_4000;

/// How child processes are deprioritized so a batch does not starve the
/// desktop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriorityStrategy {
    /// `chrt -b 0 nice -n19 <tool>`: batch scheduling class plus lowest nice.
    Idle,
    /// `nice -n19 <tool>`
    Nice,
    /// Windows below-normal priority class.
    BelowNormal,
    Unchanged,
}

impl PriorityStrategy {
    /// Pick the strongest strategy available on this machine.
    pub fn detect() -> Self {
        if cfg!(windows) {
            return PriorityStrategy::BelowNormal;
        }
        let has_nice = which::which("nice").is_ok();
        if cfg!(target_os = "linux") && has_nice && which::which("chrt").is_ok() {
            PriorityStrategy::Idle
        } else if cfg!(unix) && has_nice {
            PriorityStrategy::Nice
        } else {
            PriorityStrategy::Unchanged
        }
    }

    pub fn command(&self, invocation: &ToolInvocation) -> Command {
        let mut cmd = match self {
            PriorityStrategy::Idle => {
                let mut c = Command::new("chrt");
                c.args(["-b", "0", "nice", "-n19"]).arg(&invocation.program);
                c
            }
            PriorityStrategy::Nice => {
                let mut c = Command::new("nice");
                c.arg("-n19").arg(&invocation.program);
                c
            }
            PriorityStrategy::BelowNormal | PriorityStrategy::Unchanged => {
                Command::new(&invocation.program)
            }
        };
        cmd.args(&invocation.args);

        #[cfg(windows)]
        if *self == PriorityStrategy::BelowNormal {
            use std::os::windows::process::CommandExt;
            cmd.creation_flags(BELOW_NORMAL_PRIORITY_CLASS);
        }

        cmd
    }
}

/// A configured external tool: program plus fixed leading arguments.
///
/// `"podman run --rm -v /data:/data jxl cjxl"` becomes program `podman`
/// with the rest as prefix arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolSpec {
    program: OsString,
    prefix_args: Vec<OsString>,
    label: String,
}

impl ToolSpec {
    pub fn parse(spec: &str) -> Result<Self> {
        let trimmed = spec.trim();
        if trimmed.is_empty() {
            return Err(BatchError::invalid("tool path", "empty value"));
        }

        // a real file wins so paths with spaces keep working
        let (program, prefix_args) = if Path::new(trimmed).is_file() {
            (OsString::from(trimmed), Vec::new())
        } else {
            let mut parts = trimmed.split_whitespace().map(OsString::from);
            let program = parts
                .next()
                .ok_or_else(|| BatchError::invalid("tool path", "empty value"))?;
            (program, parts.collect())
        };

        let label = Path::new(&program)
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| trimmed.to_string());

        Ok(Self {
            program,
            prefix_args,
            label,
        })
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn display(&self) -> String {
        std::iter::once(&self.program)
            .chain(&self.prefix_args)
            .map(|s| s.to_string_lossy())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Start building one call of this tool.
    pub fn invocation(&self) -> ToolInvocation {
        ToolInvocation {
            program: self.program.clone(),
            args: self.prefix_args.clone(),
            label: self.label.clone(),
        }
    }

    /// Spawn the tool once with `probe_args` (e.g. `-version`). A tool that
    /// cannot be started is a startup-fatal [`BatchError::ToolNotFound`];
    /// its exit status does not matter.
    pub fn ensure_available(&self, probe_args: &[&str]) -> Result<()> {
        let status = Command::new(&self.program)
            .args(&self.prefix_args)
            .args(probe_args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status();

        match status {
            Ok(_) => {
                tracing::debug!(tool = %self.display(), "External tool available");
                Ok(())
            }
            Err(e) => Err(BatchError::ToolNotFound {
                tool: self.display(),
                reason: e.to_string(),
            }),
        }
    }
}

/// Fully formed argument list for a single tool call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolInvocation {
    program: OsString,
    args: Vec<OsString>,
    label: String,
}

impl ToolInvocation {
    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().to_os_string());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.args
            .extend(args.into_iter().map(|a| a.as_ref().to_os_string()));
        self
    }

    /// Append a path, guarded against being read as an option.
    pub fn path_arg(mut self, path: &Path) -> Self {
        self.args.push(safe_path_arg(path).into_owned());
        self
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn arguments(&self) -> &[OsString] {
        &self.args
    }

    pub fn command_line(&self) -> String {
        std::iter::once(&self.program)
            .chain(&self.args)
            .map(|s| s.to_string_lossy())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[derive(Debug, Clone)]
pub struct ToolOutput {
    pub exit_code: Option<i32>,
    /// stdout followed by stderr
    pub output: String,
    pub duration: Duration,
}

impl ToolOutput {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

#[derive(Debug, Clone)]
pub struct ToolRunner {
    priority: PriorityStrategy,
    echo_output: bool,
}

impl ToolRunner {
    pub fn new(priority: PriorityStrategy) -> Self {
        Self {
            priority,
            echo_output: false,
        }
    }

    /// Also print each tool's captured output to stderr.
    pub fn echo_output(mut self, echo: bool) -> Self {
        self.echo_output = echo;
        self
    }

    pub fn priority(&self) -> PriorityStrategy {
        self.priority
    }

    /// Run to completion. Only a failure to start the process is an `Err`;
    /// a non-zero exit is reported through [`ToolOutput::exit_code`].
    pub fn run(&self, invocation: &ToolInvocation) -> Result<ToolOutput> {
        let command_line = invocation.command_line();
        tracing::debug!(tool = invocation.label(), command = %command_line, "Executing external command");

        let start = Instant::now();
        let raw = self
            .priority
            .command(invocation)
            .stdin(Stdio::null())
            .output()
            .map_err(|source| BatchError::Spawn {
                tool: invocation.label().to_string(),
                source,
            })?;
        let duration = start.elapsed();

        let mut output = String::from_utf8_lossy(&raw.stdout).into_owned();
        output.push_str(&String::from_utf8_lossy(&raw.stderr));
        let exit_code = raw.status.code();

        log_external_tool(invocation.label(), &command_line, &output, exit_code, duration);
        if self.echo_output && !output.trim().is_empty() {
            eprintln!("{}", output.trim_end());
        }

        Ok(ToolOutput {
            exit_code,
            output,
            duration,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spec_splits_container_runner() {
        let spec = ToolSpec::parse("podman run --rm jxl cjxl").unwrap();
        assert_eq!(spec.label(), "podman");
        let inv = spec.invocation().arg("-h");
        assert_eq!(inv.command_line(), "podman run --rm jxl cjxl -h");
    }

    #[test]
    fn test_spec_label_is_program_stem() {
        assert_eq!(ToolSpec::parse("/opt/bin/ffmpeg").unwrap().label(), "ffmpeg");
        assert_eq!(ToolSpec::parse("  magick ").unwrap().label(), "magick");
        assert!(ToolSpec::parse("   ").is_err());
    }

    #[test]
    fn test_path_arg_guards_dashes() {
        let inv = ToolSpec::parse("cjxl")
            .unwrap()
            .invocation()
            .path_arg(Path::new("-in.png"))
            .path_arg(Path::new("out.jxl"));
        assert_eq!(inv.command_line(), "cjxl ./-in.png out.jxl");
    }

    #[test]
    fn test_missing_tool_is_startup_fatal() {
        let spec = ToolSpec::parse("definitely-not-a-real-tool-7f3a").unwrap();
        let err = spec.ensure_available(&["-version"]).unwrap_err();
        assert!(matches!(err, BatchError::ToolNotFound { .. }));
        assert!(err.is_startup_fatal());
    }

    #[test]
    fn test_priority_prefixes() {
        let inv = ToolSpec::parse("ffmpeg").unwrap().invocation().arg("-y");

        let idle = PriorityStrategy::Idle.command(&inv);
        assert_eq!(idle.get_program(), "chrt");
        let args: Vec<_> = idle.get_args().collect();
        assert_eq!(args, ["-b", "0", "nice", "-n19", "ffmpeg", "-y"]);

        let nice = PriorityStrategy::Nice.command(&inv);
        assert_eq!(nice.get_program(), "nice");
        let args: Vec<_> = nice.get_args().collect();
        assert_eq!(args, ["-n19", "ffmpeg", "-y"]);

        let plain = PriorityStrategy::Unchanged.command(&inv);
        assert_eq!(plain.get_program(), "ffmpeg");
    }

    #[cfg(unix)]
    #[test]
    fn test_run_captures_output_and_exit_code() {
        let runner = ToolRunner::new(PriorityStrategy::Unchanged);
        let inv = ToolSpec::parse("sh")
            .unwrap()
            .invocation()
            .args(["-c", "echo out; echo err >&2; exit 3"]);
        let out = runner.run(&inv).unwrap();
        assert_eq!(out.exit_code, Some(3));
        assert!(!out.success());
        assert!(out.output.contains("out"));
        assert!(out.output.contains("err"));
    }

    #[test]
    fn test_spawn_failure_is_err() {
        let runner = ToolRunner::new(PriorityStrategy::Unchanged);
        let inv = ToolSpec::parse("definitely-not-a-real-tool-7f3a").unwrap().invocation();
        assert!(matches!(runner.run(&inv), Err(BatchError::Spawn { .. })));
    }
}
