//! Execution engine
//!
//! Spawns exactly one child process per invocation, enforces the descriptor
//! timeout and independent per-stream output caps, and normalizes the
//! outcome into a `RunResult`. Ordinary process failure (non-zero exit,
//! timeout, unparseable output) never raises; only a launch failure does.

use chrono::Utc;
use std::process::Stdio;
use std::time::Instant;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;

use crate::errors::{Result, ToolError};
use crate::telemetry::{RunEvent, TelemetryCollector};
use crate::tools::descriptor::{OutputKind, RunRequest, ToolDescriptor};
use crate::tools::result::RunResult;
use crate::workspace::WorkspaceContext;

/// Default stdout capture cap in bytes (2MB)
pub const DEFAULT_STDOUT_CAP: usize = 2_097_152;

/// Default stderr capture cap in bytes
pub const DEFAULT_STDERR_CAP: usize = 262_144;

/// Per-stream capture caps
#[derive(Debug, Clone, Copy)]
pub struct EngineLimits {
    pub stdout_cap: usize,
    pub stderr_cap: usize,
}

impl Default for EngineLimits {
    fn default() -> Self {
        Self {
            stdout_cap: DEFAULT_STDOUT_CAP,
            stderr_cap: DEFAULT_STDERR_CAP,
        }
    }
}

/// Process execution engine
pub struct ExecutionEngine {
    workspace: WorkspaceContext,
    limits: EngineLimits,
    telemetry: TelemetryCollector,
}

impl ExecutionEngine {
    /// Create an engine for the given workspace
    pub fn new(workspace: WorkspaceContext) -> Self {
        Self {
            workspace,
            limits: EngineLimits::default(),
            telemetry: TelemetryCollector::new(),
        }
    }

    /// Override the capture caps
    pub fn with_limits(mut self, limits: EngineLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Share an external telemetry collector
    pub fn with_telemetry(mut self, telemetry: TelemetryCollector) -> Self {
        self.telemetry = telemetry;
        self
    }

    /// Access the engine's telemetry collector
    pub fn telemetry(&self) -> &TelemetryCollector {
        &self.telemetry
    }

    /// Execute one tool invocation to completion.
    ///
    /// Returns `Err` only for launch failures; every completed process, even
    /// a timed-out or failing one, comes back as a `RunResult`.
    pub async fn execute(
        &self,
        descriptor: &ToolDescriptor,
        request: RunRequest,
    ) -> Result<RunResult> {
        let started_at = Utc::now();
        let start = Instant::now();

        self.telemetry.record(RunEvent::RunStarted {
            tool: descriptor.id.clone(),
            reason: request.reason,
            timestamp: Instant::now(),
        });

        let mut child = self
            .build_command(descriptor)
            .spawn()
            .map_err(|e| ToolError::Launch {
                tool: descriptor.id.clone(),
                command: descriptor.command.clone(),
                message: e.to_string(),
            })?;

        // Each stream drains in its own task so the child never blocks on a
        // full pipe, even after its cap is reached.
        let stdout_task = tokio::spawn(read_capped(child.stdout.take(), self.limits.stdout_cap));
        let stderr_task = tokio::spawn(read_capped(child.stderr.take(), self.limits.stderr_cap));

        let mut timed_out = false;
        let status = match descriptor.timeout() {
            Some(limit) => match tokio::time::timeout(limit, child.wait()).await {
                Ok(waited) => Some(waited.map_err(|e| wait_error(descriptor, e))?),
                Err(_) => {
                    timed_out = true;
                    let _ = child.kill().await;
                    None
                }
            },
            None => Some(child.wait().await.map_err(|e| wait_error(descriptor, e))?),
        };

        let (stdout_raw, stdout_truncated) = stdout_task.await.unwrap_or_default();
        let (stderr_raw, stderr_truncated) = stderr_task.await.unwrap_or_default();

        let exit_code = status.and_then(|s| s.code());
        let stdout = normalize_output(&stdout_raw);
        let stderr = normalize_output(&stderr_raw);

        let mut data = None;
        let mut parse_error = None;
        if descriptor.output_kind == OutputKind::Structured && !stdout.is_empty() {
            match serde_json::from_str::<serde_json::Value>(&stdout) {
                Ok(value) => data = Some(value),
                Err(e) => parse_error = Some(format!("Invalid JSON output: {e}")),
            }
        }

        let success = !timed_out && exit_code == Some(0) && parse_error.is_none();
        let duration_ms = start.elapsed().as_millis() as u64;

        self.telemetry.record(RunEvent::RunCompleted {
            tool: descriptor.id.clone(),
            success,
            timed_out,
            duration_ms,
            timestamp: Instant::now(),
        });

        Ok(RunResult {
            id: descriptor.id.clone(),
            title: descriptor.title.clone(),
            command: descriptor.command.clone(),
            args: descriptor.args.clone(),
            stdout,
            stderr,
            data,
            parse_error,
            exit_code,
            success,
            stdout_truncated,
            stderr_truncated,
            timed_out,
            started_at,
            duration_ms,
            provenance: descriptor.provenance,
        })
    }

    /// Assemble the child command: program, environment, working directory
    fn build_command(&self, descriptor: &ToolDescriptor) -> Command {
        let mut cmd = if descriptor.shell {
            shell_command(&command_line(descriptor))
        } else {
            let mut c = Command::new(&descriptor.command);
            c.args(&descriptor.args);
            c
        };

        cmd.stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        // Ambient process environment overlaid with descriptor overrides;
        // overrides win on key collision.
        cmd.env_clear()
            .envs(&self.workspace.ambient_env)
            .envs(&descriptor.env);

        if let Some(dir) = self.resolve_cwd(descriptor) {
            cmd.current_dir(dir);
        }

        cmd
    }

    /// Descriptor cwd if set and existing, else workspace root if existing,
    /// else inherit the engine's own working directory
    fn resolve_cwd(&self, descriptor: &ToolDescriptor) -> Option<std::path::PathBuf> {
        if let Some(cwd) = &descriptor.cwd {
            let path = std::path::PathBuf::from(cwd);
            if path.is_dir() {
                return Some(path);
            }
        }

        if let Some(root) = &self.workspace.workspace_root {
            if root.is_dir() {
                return Some(root.clone());
            }
        }

        None
    }
}

fn wait_error(descriptor: &ToolDescriptor, e: std::io::Error) -> ToolError {
    ToolError::Launch {
        tool: descriptor.id.clone(),
        command: descriptor.command.clone(),
        message: e.to_string(),
    }
}

/// Join command and args into one line for shell interpretation
fn command_line(descriptor: &ToolDescriptor) -> String {
    if descriptor.args.is_empty() {
        descriptor.command.clone()
    } else {
        format!("{} {}", descriptor.command, descriptor.args.join(" "))
    }
}

fn shell_command(line: &str) -> Command {
    #[cfg(unix)]
    {
        let mut c = Command::new("sh");
        c.arg("-c");
        c.arg(line);
        c
    }
    #[cfg(windows)]
    {
        let mut c = Command::new("cmd");
        c.arg("/C");
        c.arg(line);
        c
    }
}

/// Read a stream to the end, keeping at most `cap` bytes.
///
/// Overflow bytes are dropped, not buffered, so memory stays bounded no
/// matter how much the process writes; the stream keeps draining either way.
async fn read_capped<R>(reader: Option<R>, cap: usize) -> (Vec<u8>, bool)
where
    R: AsyncRead + Unpin,
{
    let Some(mut reader) = reader else {
        return (Vec::new(), false);
    };

    let mut buf = Vec::new();
    let mut truncated = false;
    let mut chunk = [0u8; 8192];

    loop {
        match reader.read(&mut chunk).await {
            Ok(0) => break,
            Ok(n) => {
                if buf.len() < cap {
                    let take = n.min(cap - buf.len());
                    buf.extend_from_slice(&chunk[..take]);
                    if take < n {
                        truncated = true;
                    }
                } else {
                    truncated = true;
                }
            }
            Err(_) => break,
        }
    }

    (buf, truncated)
}

/// Normalize line endings and trim the captured text
fn normalize_output(raw: &[u8]) -> String {
    String::from_utf8_lossy(raw)
        .replace("\r\n", "\n")
        .trim()
        .to_string()
}
