//! The Bash tool: shell commands behind the permission gate.

use std::path::Path;
use std::process::Stdio;
use std::time::{Duration, Instant};

use serde_json::json;
use tokio::io::AsyncRead;
use tracing::{debug, info, warn};

use super::params::Params;
use crate::error::{ToolError, ToolOutcome};
use crate::permissions::PermissionGate;
use crate::shell::{read_capped, ShellConfig, ShellOutput};
use crate::types::config::BashConfig;
use crate::types::{ToolContext, ToolResult};

/// Runs shell commands with a timeout and a combined output cap.
#[derive(Debug, Clone)]
pub struct ProcessRunner {
    shell: ShellConfig,
    config: BashConfig,
}

impl ProcessRunner {
    #[must_use]
    pub fn new(config: BashConfig) -> Self {
        Self {
            shell: ShellConfig::default(),
            config,
        }
    }

    #[must_use]
    pub fn config(&self) -> &BashConfig {
        &self.config
    }

    /// The effective timeout for a requested value: the default when absent,
    /// never above the hard cap.
    #[must_use]
    pub fn effective_timeout(&self, requested_ms: Option<u64>) -> Duration {
        let ms = requested_ms
            .unwrap_or(self.config.default_timeout_ms)
            .clamp(1, self.config.max_timeout_ms);
        Duration::from_millis(ms)
    }

    /// Runs `command` in `cwd` and waits for it.
    ///
    /// Stdout and stderr are read concurrently. Together they keep at most
    /// `max_output_bytes`; the rest is drained and discarded.
    ///
    /// # Errors
    ///
    /// [`ToolError::Timeout`] if the command outlives `timeout` (its whole
    /// process group is killed), or an I/O error if it cannot be spawned.
    pub async fn run(&self, command: &str, cwd: &Path, timeout: Duration) -> ToolOutcome<ShellOutput> {
        let mut cmd = self.shell.build_command_in(command, cwd);
        cmd.stdout(Stdio::piped()).stderr(Stdio::piped()).kill_on_drop(true);
        #[cfg(unix)]
        cmd.process_group(0);

        let mut child = cmd.spawn().map_err(|e| ToolError::from_io(cwd, &e))?;
        let pid = child.id();

        let stdout = child.stdout.take();
        let stderr = child.stderr.take();
        let limit = self.config.max_output_bytes;

        let collected = tokio::time::timeout(timeout, async {
            tokio::join!(drain(stdout, limit), drain(stderr, limit), child.wait())
        })
        .await;

        let (out, err, status) = match collected {
            Ok(parts) => parts,
            Err(_) => {
                warn!(timeout_ms = timeout.as_millis() as u64, "Command timed out, killing");
                if let Some(pgid) = pid {
                    self.kill_group(pgid).await;
                }
                if let Err(e) = child.start_kill() {
                    debug!(error = %e, "Kill after timeout failed");
                }
                return Err(ToolError::Timeout {
                    timeout_ms: timeout.as_millis() as u64,
                });
            }
        };

        let status = status.map_err(|e| ToolError::from_io(cwd, &e))?;
        let (mut out, out_cut) = out.map_err(|e| ToolError::from_io(cwd, &e))?;
        let (mut err, err_cut) = err.map_err(|e| ToolError::from_io(cwd, &e))?;

        let mut truncated = out_cut || err_cut;
        if out.len() > limit {
            out.truncate(limit);
            truncated = true;
        }
        let room = limit - out.len();
        if err.len() > room {
            err.truncate(room);
            truncated = true;
        }
        if truncated {
            warn!(limit, "Command output truncated");
        }

        Ok(ShellOutput {
            exit_code: status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&out).into_owned(),
            stderr: String::from_utf8_lossy(&err).into_owned(),
            truncated,
        })
    }

    /// Sends SIGKILL to every process in group `pgid`, so background jobs the
    /// command started die with it.
    #[cfg(unix)]
    async fn kill_group(&self, pgid: u32) {
        let status = self
            .shell
            .build_command(&format!("kill -s KILL -- -{pgid}"))
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await;
        match status {
            Ok(status) if status.success() => debug!(pgid, "Killed process group"),
            Ok(status) => debug!(pgid, code = ?status.code(), "Process group kill reported failure"),
            Err(e) => debug!(pgid, error = %e, "Process group kill failed to start"),
        }
    }

    #[cfg(not(unix))]
    async fn kill_group(&self, _pgid: u32) {}

    /// Starts `command` detached and returns its pid without waiting.
    ///
    /// The child gets null stdio and, on Unix, its own process group. A
    /// reaper task waits for it so it never lingers as a zombie.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the command cannot be spawned.
    pub fn spawn_background(&self, command: &str, cwd: &Path) -> ToolOutcome<u32> {
        let mut cmd = self.shell.build_command_in(command, cwd);
        cmd.stdout(Stdio::null()).stderr(Stdio::null());
        #[cfg(unix)]
        cmd.process_group(0);

        let mut child = cmd.spawn().map_err(|e| ToolError::from_io(cwd, &e))?;
        let pid = child.id().unwrap_or_default();

        tokio::spawn(async move {
            match child.wait().await {
                Ok(status) => debug!(pid, code = ?status.code(), "Background command exited"),
                Err(e) => warn!(pid, error = %e, "Failed waiting for background command"),
            }
        });

        Ok(pid)
    }
}

async fn drain<R>(reader: Option<R>, limit: usize) -> std::io::Result<(Vec<u8>, bool)>
where
    R: AsyncRead + Unpin,
{
    match reader {
        Some(reader) => read_capped(reader, limit).await,
        None => Ok((Vec::new(), false)),
    }
}

/// Handles one Bash invocation.
///
/// Validation happens first, then the permission gate. A declined command
/// never runs and yields the cancelled result shape.
pub async fn bash(
    runner: &ProcessRunner,
    gate: &PermissionGate,
    ctx: &ToolContext,
    params: Params<'_>,
) -> ToolOutcome<ToolResult> {
    let command = params.str("command")?;
    let cwd = params
        .opt_str("cwd")?
        .map_or_else(|| ctx.working_dir.clone(), |p| ctx.resolve(p));
    let timeout = runner.effective_timeout(params.opt_u64("timeout")?);
    let background = params.bool_or("background", false)?;

    if !gate.evaluate(command).await {
        return Err(ToolError::Cancelled);
    }

    if background {
        let pid = runner.spawn_background(command, &cwd)?;
        info!(pid, cwd = %cwd.display(), "Started background command");
        return ToolResult::success(json!({
            "background": true,
            "pid": pid,
        }));
    }

    let started = Instant::now();
    let output = match runner.run(command, &cwd, timeout).await {
        Ok(output) => output,
        Err(err @ ToolError::Timeout { timeout_ms }) => {
            return Ok(ToolResult::success(json!({
                "timed_out": true,
                "timeout_ms": timeout_ms,
            }))?
            .into_failure(err.to_string()));
        }
        Err(err) => return Err(err),
    };

    debug!(
        exit_code = output.exit_code,
        truncated = output.truncated,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "Command finished"
    );

    let result = ToolResult::success(json!({
        "stdout": output.stdout,
        "stderr": output.stderr,
        "exit_code": output.exit_code,
        "truncated": output.truncated,
    }))?;

    if output.success() {
        Ok(result)
    } else {
        Ok(result.into_failure(format!("Command failed with exit code {}", output.exit_code)))
    }
}
