//! Platform shell selection and bounded output capture.
//!
//! Commands run through `sh -c` on Unix and `cmd.exe /C` on Windows.
//!
//! # Examples
//!
//! ```
//! use toolbench::shell::ShellConfig;
//!
//! let config = ShellConfig::default();
//! let cmd = config.build_command("echo hello");
//! assert_eq!(cmd.as_std().get_program(), config.command.as_str());
//! ```

use std::path::Path;
use std::process::Stdio;

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;

/// Shell executable and the arguments that precede the script.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use]
pub struct ShellConfig {
    /// The shell executable (e.g., "sh" or "cmd.exe").
    pub command: String,
    /// Arguments to pass before the script (e.g., ["-c"] or ["/C"]).
    pub args: Vec<String>,
}

#[cfg(unix)]
impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            command: "sh".to_string(),
            args: vec!["-c".to_string()],
        }
    }
}

#[cfg(windows)]
impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            command: "cmd.exe".to_string(),
            args: vec!["/C".to_string()],
        }
    }
}

impl ShellConfig {
    /// Creates a command that runs `script` through this shell. Stdin is
    /// closed; the caller picks stdout/stderr handling.
    #[must_use]
    pub fn build_command(&self, script: &str) -> Command {
        let mut cmd = Command::new(&self.command);
        cmd.args(&self.args).arg(script).stdin(Stdio::null());
        cmd
    }

    /// Like [`build_command`](Self::build_command), running in `cwd`.
    #[must_use]
    pub fn build_command_in(&self, script: &str, cwd: &Path) -> Command {
        let mut cmd = self.build_command(script);
        cmd.current_dir(cwd);
        cmd
    }
}

/// Output of a foreground command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellOutput {
    /// Exit code, or -1 when the process was ended by a signal.
    pub exit_code: i32,
    /// Captured standard output (lossy UTF-8).
    pub stdout: String,
    /// Captured standard error (lossy UTF-8).
    pub stderr: String,
    /// Whether output beyond the capture limit was discarded.
    pub truncated: bool,
}

impl ShellOutput {
    /// Returns `true` if the command exited with code 0.
    #[must_use]
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Reads `reader` to the end, keeping at most `limit` bytes.
///
/// The stream is always drained so the child never blocks on a full pipe.
/// Returns the kept bytes and whether anything was dropped.
pub async fn read_capped<R>(mut reader: R, limit: usize) -> std::io::Result<(Vec<u8>, bool)>
where
    R: AsyncRead + Unpin,
{
    let mut kept = Vec::new();
    let mut truncated = false;
    let mut buf = [0u8; 8192];

    loop {
        let n = reader.read(&mut buf).await?;
        if n == 0 {
            break;
        }
        let room = limit.saturating_sub(kept.len());
        if n > room {
            truncated = true;
        }
        kept.extend_from_slice(&buf[..n.min(room)]);
    }

    Ok((kept, truncated))
}
