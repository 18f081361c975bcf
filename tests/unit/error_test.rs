//! Tests for tool error types.
//!
//! These tests verify Display output, error categories, and the mapping from
//! errors onto the result envelope.

use std::io;
use std::path::Path;

use pretty_assertions::assert_eq;
use toolbench::error::{ToolError, CANCELLED_MESSAGE};
use toolbench::types::ToolResult;

// ============== Display ==============

#[test]
fn test_display_messages() {
    assert_eq!(
        ToolError::invalid("mode", "unknown mode 'weekly'").to_string(),
        "Invalid parameter 'mode': unknown mode 'weekly'"
    );
    assert_eq!(
        ToolError::UnknownTool { name: "Fly".into() }.to_string(),
        "Unknown tool: Fly"
    );
    assert_eq!(
        ToolError::Timeout { timeout_ms: 250 }.to_string(),
        "Command timed out after 250 ms"
    );
}

// ============== I/O mapping ==============

#[test]
fn test_from_io_maps_kinds() {
    let path = Path::new("/data/x.json");

    let not_found = ToolError::from_io(path, &io::Error::from(io::ErrorKind::NotFound));
    assert_eq!(not_found.to_string(), "File not found: /data/x.json");

    let denied = ToolError::from_io(path, &io::Error::from(io::ErrorKind::PermissionDenied));
    assert!(matches!(denied, ToolError::PermissionDenied { .. }));

    let other = ToolError::from_io(path, &io::Error::other("disk on fire"));
    assert!(other.to_string().contains("disk on fire"));
    assert!(!other.is_validation());
}

// ============== Categories ==============

#[test]
fn test_categories() {
    assert!(ToolError::missing("x").is_validation());
    assert!(ToolError::UnknownTool { name: "x".into() }.is_validation());
    assert!(!ToolError::Cancelled.is_validation());
    assert!(ToolError::Cancelled.is_cancellation());
    assert!(!ToolError::NotFound { path: "x".into() }.is_cancellation());
}

// ============== Result envelope ==============

#[test]
fn test_cancelled_error_becomes_cancelled_result() {
    let result = ToolResult::from(ToolError::Cancelled);
    assert!(!result.success);
    assert!(result.cancelled);
    assert_eq!(result.error.as_deref(), Some(CANCELLED_MESSAGE));
}

#[test]
fn test_operational_error_becomes_failed_result() {
    let result = ToolResult::from(ToolError::StringNotFound { path: "a.txt".into() });
    assert!(!result.success);
    assert!(!result.cancelled);
    assert_eq!(result.error.as_deref(), Some("String not found in a.txt"));
    assert!(result.payload.is_empty());
}
