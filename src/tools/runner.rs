use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use log::{debug, warn};

use crate::constants::OUTCOME_NOT_COMPLETED;

/// How often a running tool is polled while a timeout is armed
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// A single external tool invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
    /// When set, captured stdout is also written to this file
    pub stdout_path: Option<PathBuf>,
}

impl Invocation {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            stdout_path: None,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn path_arg(self, path: &Path) -> Self {
        self.arg(path.to_string_lossy().to_string())
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn stdout_to(mut self, path: &Path) -> Self {
        self.stdout_path = Some(path.to_path_buf());
        self
    }

    /// Canonical command line string recorded in provenance events.
    ///
    /// Arguments containing whitespace or quotes are wrapped in double quotes
    /// with embedded quotes backslash-escaped; everything else is emitted as is.
    pub fn command_line(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .map(quote_arg)
            .collect::<Vec<_>>()
            .join(" ")
    }
}

fn quote_arg(arg: &str) -> String {
    if arg.is_empty() {
        return "\"\"".to_string();
    }
    if !arg.chars().any(|c| c.is_whitespace() || c == '"') {
        return arg.to_string();
    }
    format!("\"{}\"", arg.replace('"', "\\\""))
}

/// Captured result of a tool invocation
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ToolOutput {
    /// `None` when the process was killed, timed out or never started
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
    pub timed_out: bool,
}

impl ToolOutput {
    pub fn exited(code: i32, stdout: &str, stderr: &str) -> Self {
        Self {
            exit_code: Some(code),
            stdout: stdout.to_string(),
            stderr: stderr.to_string(),
            timed_out: false,
        }
    }

    pub fn not_started(reason: String) -> Self {
        Self {
            exit_code: None,
            stdout: String::new(),
            stderr: reason,
            timed_out: false,
        }
    }

    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }

    /// Exit code as recorded in provenance events
    pub fn outcome_code(&self) -> i32 {
        self.exit_code.unwrap_or(OUTCOME_NOT_COMPLETED)
    }
}

/// Contract around running an external process to completion.
///
/// Implementations never fail: a tool that cannot be started, is killed or
/// exits nonzero is reported through [`ToolOutput`] so callers can record the
/// outcome and carry on.
#[cfg_attr(test, mockall::automock)]
pub trait ToolRunner {
    fn run(&self, invocation: &Invocation) -> ToolOutput;
}

/// Runs tools as child processes of this one
#[derive(Debug, Clone, Default)]
pub struct SystemRunner {
    timeout: Option<Duration>,
}

impl SystemRunner {
    pub fn new(timeout: Option<Duration>) -> Self {
        Self { timeout }
    }
}

impl ToolRunner for SystemRunner {
    fn run(&self, invocation: &Invocation) -> ToolOutput {
        debug!("Running {}", invocation.command_line());

        let mut command = Command::new(&invocation.program);
        command
            .args(&invocation.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let mut child = match command.spawn() {
            Ok(child) => child,
            Err(e) => {
                warn!("Failed to start {}: {}", invocation.program, e);
                return ToolOutput::not_started(format!("failed to start {}: {}", invocation.program, e));
            }
        };

        // Drain both pipes concurrently so a chatty tool cannot fill one and block
        let stdout_reader = child.stdout.take().map(|mut pipe| {
            thread::spawn(move || {
                let mut buf = Vec::new();
                let _ = pipe.read_to_end(&mut buf);
                buf
            })
        });
        let stderr_reader = child.stderr.take().map(|mut pipe| {
            thread::spawn(move || {
                let mut buf = Vec::new();
                let _ = pipe.read_to_end(&mut buf);
                buf
            })
        });

        let (status, timed_out) = wait_with_timeout(&mut child, self.timeout);

        let stdout = stdout_reader.and_then(|h| h.join().ok()).unwrap_or_default();
        let stderr = stderr_reader.and_then(|h| h.join().ok()).unwrap_or_default();

        if let Some(path) = &invocation.stdout_path {
            if let Err(e) = fs::write(path, &stdout) {
                warn!("Failed to write output of {} to {}: {}", invocation.program, path.display(), e);
            }
        }

        if timed_out {
            warn!("{} exceeded its time limit and was terminated", invocation.program);
        }

        let output = ToolOutput {
            exit_code: status.and_then(|s| s.code()),
            stdout: String::from_utf8_lossy(&stdout).into_owned(),
            stderr: String::from_utf8_lossy(&stderr).into_owned(),
            timed_out,
        };

        if !output.success() {
            warn!("{} finished with outcome {}", invocation.program, output.outcome_code());
            if !output.stderr.trim().is_empty() {
                debug!("{} stderr: {}", invocation.program, output.stderr.trim());
            }
        }

        output
    }
}

fn wait_with_timeout(child: &mut Child, timeout: Option<Duration>) -> (Option<ExitStatus>, bool) {
    let limit = match timeout {
        Some(limit) => limit,
        None => return (child.wait().ok(), false),
    };

    let started = Instant::now();
    loop {
        match child.try_wait() {
            Ok(Some(status)) => return (Some(status), false),
            Ok(None) => {
                if started.elapsed() >= limit {
                    let _ = child.kill();
                    let _ = child.wait();
                    return (None, true);
                }
                thread::sleep(POLL_INTERVAL);
            }
            Err(e) => {
                warn!("Failed to wait for child process: {}", e);
                return (None, false);
            }
        }
    }
}

/// Which stream a tool prints its version banner on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VersionStream {
    Stdout,
    Stderr,
}

/// Ask a tool for the version string used in provenance agent fields.
///
/// Returns the first non-empty line of the chosen stream, or the program
/// name when the tool printed nothing.
pub fn tool_version(runner: &dyn ToolRunner, program: &str, args: &[&str], stream: VersionStream) -> String {
    let output = runner.run(&Invocation::new(program).args(args.iter().copied()));
    let text = match stream {
        VersionStream::Stdout => &output.stdout,
        VersionStream::Stderr => &output.stderr,
    };
    text.lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| program.to_string())
}
