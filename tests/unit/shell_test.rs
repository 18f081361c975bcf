//! Tests for the cross-platform shell abstraction and the process runner.

use std::time::Duration;

use toolbench::shell::{read_capped, ShellConfig, ShellOutput};
use toolbench::tools::ProcessRunner;
use toolbench::types::config::BashConfig;

// ============================================================================
// ShellConfig
// ============================================================================

#[test]
#[cfg(unix)]
fn test_shell_config_returns_sh_on_unix() {
    let config = ShellConfig::default();
    assert_eq!(config.command, "sh");
    assert_eq!(config.args, vec!["-c"]);
}

#[test]
#[cfg(windows)]
fn test_shell_config_returns_cmd_on_windows() {
    let config = ShellConfig::default();
    assert_eq!(config.command, "cmd.exe");
    assert_eq!(config.args, vec!["/C"]);
}

#[cfg(unix)]
#[tokio::test]
async fn test_build_command_in_sets_working_dir() {
    let dir = tempfile::TempDir::new().unwrap();
    let output = ShellConfig::default()
        .build_command_in("pwd", dir.path())
        .output()
        .await
        .unwrap();
    let printed = String::from_utf8_lossy(&output.stdout);
    let expected = dir.path().canonicalize().unwrap();
    assert_eq!(std::path::Path::new(printed.trim()).canonicalize().unwrap(), expected);
}

#[test]
fn test_shell_output_success_is_exit_zero() {
    let mut output = ShellOutput {
        exit_code: 0,
        stdout: String::new(),
        stderr: String::new(),
        truncated: false,
    };
    assert!(output.success());
    output.exit_code = 1;
    assert!(!output.success());
}

// ============================================================================
// read_capped
// ============================================================================

#[tokio::test]
async fn test_read_capped_drains_past_limit() {
    let data = vec![b'a'; 20_000];
    let (kept, truncated) = read_capped(&data[..], 100).await.unwrap();
    assert_eq!(kept.len(), 100);
    assert!(truncated);
}

#[tokio::test]
async fn test_read_capped_exact_fit() {
    let (kept, truncated) = read_capped(&b"hello"[..], 5).await.unwrap();
    assert_eq!(kept, b"hello");
    assert!(!truncated);
}

// ============================================================================
// ProcessRunner
// ============================================================================

#[cfg(unix)]
#[tokio::test]
async fn test_stdout_keeps_priority_under_cap() {
    let dir = tempfile::TempDir::new().unwrap();
    let runner = ProcessRunner::new(BashConfig {
        max_output_bytes: 8,
        ..BashConfig::default()
    });

    let out = runner
        .run("printf 12345; printf abcdefgh >&2", dir.path(), Duration::from_secs(10))
        .await
        .unwrap();
    assert_eq!(out.stdout, "12345");
    assert_eq!(out.stderr, "abc");
    assert!(out.truncated);
}

#[cfg(unix)]
#[tokio::test]
async fn test_background_returns_immediately() {
    let dir = tempfile::TempDir::new().unwrap();
    let runner = ProcessRunner::new(BashConfig::default());

    let started = std::time::Instant::now();
    let pid = runner.spawn_background("sleep 3", dir.path()).unwrap();
    assert!(pid > 0);
    assert!(started.elapsed() < Duration::from_secs(1));
}
