//! Runs one external tool with a timeout and captured diagnostics.

use std::ffi::OsString;
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use serde::Serialize;

use super::cancel::CancelHandle;
use crate::models::{StageName, ToolName};
use crate::orchestrator::{StageError, StepResult};
use crate::tools::ToolBinary;

/// Everything needed to launch one stage's tool.
#[derive(Debug, Clone)]
pub struct StageInvocation<'a> {
    pub stage: StageName,
    pub binary: &'a ToolBinary,
    /// Discrete argv tokens; never passed through a shell.
    pub args: Vec<OsString>,
    /// Files that must be readable before the tool is launched.
    pub inputs: Vec<PathBuf>,
    /// File the tool must leave behind, non-empty.
    pub output: PathBuf,
    /// File receiving the tool's stdout and stderr.
    pub log_path: PathBuf,
    pub timeout: Duration,
}

impl StageInvocation<'_> {
    /// Printable command line (for logs only).
    pub fn command_line(&self) -> String {
        let mut line = self.binary.path.display().to_string();
        for arg in &self.args {
            line.push(' ');
            line.push_str(&arg.to_string_lossy());
        }
        line
    }
}

/// Outcome of a successful stage.
#[derive(Debug, Clone, Serialize)]
pub struct StageResult {
    pub stage: StageName,
    pub tool: ToolName,
    pub exit_code: i32,
    /// Everything the tool wrote to stdout/stderr.
    pub diagnostics: String,
    pub elapsed: Duration,
    pub output: PathBuf,
    pub output_bytes: u64,
}

/// Launches stage tools and waits for them.
#[derive(Debug, Clone)]
pub struct StageRunner {
    poll_interval: Duration,
    /// Lines of tool output kept in error messages.
    excerpt_lines: usize,
}

impl Default for StageRunner {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(20),
            excerpt_lines: 20,
        }
    }
}

impl StageRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_excerpt_lines(mut self, lines: usize) -> Self {
        self.excerpt_lines = lines.max(1);
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Run the tool to completion.
    ///
    /// Fails with `InputUnreadable` before launching when an input is
    /// missing, `Timeout` or `Cancelled` after killing the child, `Failed`
    /// on a non-zero exit, and `NoOutput` when the tool exits 0 without
    /// leaving a non-empty output file.
    pub fn run(&self, invocation: &StageInvocation<'_>, cancel: &CancelHandle) -> StepResult<StageResult> {
        let tool = invocation.binary.tool;

        for input in &invocation.inputs {
            check_readable(input)?;
        }

        if cancel.is_cancelled() {
            return Err(StageError::Cancelled);
        }

        match fs::remove_file(&invocation.output) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(StageError::io_error("removing stale output", e)),
        }

        let log = File::create(&invocation.log_path)
            .map_err(|e| StageError::io_error("creating stage log", e))?;
        let log_err = log
            .try_clone()
            .map_err(|e| StageError::io_error("creating stage log", e))?;

        tracing::debug!("[{}] $ {}", invocation.stage, invocation.command_line());

        let started = Instant::now();
        let mut child = Command::new(&invocation.binary.path)
            .args(&invocation.args)
            .stdin(Stdio::null())
            .stdout(Stdio::from(log))
            .stderr(Stdio::from(log_err))
            .spawn()
            .map_err(|e| StageError::io_error(format!("launching {}", tool), e))?;

        let status = self.wait(&mut child, invocation, cancel, started)?;
        let elapsed = started.elapsed();
        let diagnostics = read_log(&invocation.log_path);

        if !status.success() {
            return Err(StageError::Failed {
                tool,
                exit_code: status.code(),
                diagnostics: excerpt(&diagnostics, self.excerpt_lines),
            });
        }

        let output_bytes = fs::metadata(&invocation.output).map(|m| m.len()).unwrap_or(0);
        if output_bytes == 0 {
            return Err(StageError::NoOutput {
                tool,
                path: invocation.output.clone(),
            });
        }

        tracing::debug!(
            "[{}] {} finished in {:.2}s ({} bytes)",
            invocation.stage,
            tool,
            elapsed.as_secs_f64(),
            output_bytes
        );

        Ok(StageResult {
            stage: invocation.stage,
            tool,
            exit_code: status.code().unwrap_or(0),
            diagnostics,
            elapsed,
            output: invocation.output.clone(),
            output_bytes,
        })
    }

    /// Poll the child until it exits, times out, or is cancelled.
    fn wait(
        &self,
        child: &mut Child,
        invocation: &StageInvocation<'_>,
        cancel: &CancelHandle,
        started: Instant,
    ) -> StepResult<ExitStatus> {
        loop {
            match child.try_wait() {
                Ok(Some(status)) => return Ok(status),
                Ok(None) => {}
                Err(e) => {
                    terminate(child);
                    return Err(StageError::io_error("waiting for tool", e));
                }
            }

            if cancel.is_cancelled() {
                tracing::info!("[{}] cancelled, killing {}", invocation.stage, invocation.binary.tool);
                terminate(child);
                return Err(StageError::Cancelled);
            }

            if started.elapsed() >= invocation.timeout {
                tracing::warn!(
                    "[{}] {} exceeded {:?}, killing it",
                    invocation.stage,
                    invocation.binary.tool,
                    invocation.timeout
                );
                terminate(child);
                return Err(StageError::Timeout {
                    tool: invocation.binary.tool,
                    after: invocation.timeout,
                    diagnostics: excerpt(&read_log(&invocation.log_path), self.excerpt_lines),
                });
            }

            thread::sleep(self.poll_interval);
        }
    }
}

/// Kill and reap the child; errors mean it already exited.
fn terminate(child: &mut Child) {
    let _ = child.kill();
    let _ = child.wait();
}

fn check_readable(path: &Path) -> StepResult<()> {
    let metadata =
        fs::metadata(path).map_err(|e| StageError::input_unreadable(path, e.to_string()))?;
    if !metadata.is_file() {
        return Err(StageError::input_unreadable(path, "not a regular file"));
    }
    File::open(path).map_err(|e| StageError::input_unreadable(path, e.to_string()))?;
    Ok(())
}

fn read_log(path: &Path) -> String {
    fs::read(path)
        .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
        .unwrap_or_default()
}

/// Last `lines` non-empty lines of `text`.
fn excerpt(text: &str, lines: usize) -> String {
    let kept: Vec<&str> = text.lines().filter(|l| !l.trim().is_empty()).collect();
    let start = kept.len().saturating_sub(lines);
    kept[start..].join("\n")
}
