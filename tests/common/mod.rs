//! Common test utilities and fixtures for toolbench.
//!
//! This module provides shared test infrastructure including:
//! - A temporary directory fixture
//! - Executor factories with scripted terminal input
//! - JSON export fixtures

#![allow(dead_code)]

use std::path::PathBuf;

use serde_json::{Map, Value};
use toolbench::permissions::{PromptLog, ScriptedInput, SharedInput};
use toolbench::types::{EngineConfig, Tool, ToolContext, ToolInvocation, ToolResult};
use toolbench::ToolExecutor;

/// Test context providing common setup for integration tests.
pub struct TestContext {
    /// Temporary directory for test file operations.
    pub temp_dir: tempfile::TempDir,
}

impl TestContext {
    /// Creates a new test context with a temporary directory.
    ///
    /// # Panics
    ///
    /// Panics if the temporary directory cannot be created.
    #[must_use]
    pub fn new() -> Self {
        Self {
            temp_dir: tempfile::tempdir().expect("failed to create temp dir"),
        }
    }

    /// Returns the path to the temporary directory.
    #[must_use]
    pub fn path(&self) -> PathBuf {
        self.temp_dir.path().to_path_buf()
    }

    /// A tool context rooted at the temporary directory.
    #[must_use]
    pub fn tool_ctx(&self) -> ToolContext {
        ToolContext::new(self.path())
    }

    /// Creates a file in the temporary directory with the given content.
    ///
    /// # Panics
    ///
    /// Panics if the file cannot be created or written.
    pub fn create_file(&self, name: &str, content: &str) -> PathBuf {
        let path = self.temp_dir.path().join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("failed to create parent dirs");
        }
        std::fs::write(&path, content).expect("failed to write file");
        path
    }

    /// Writes `value` as JSON.
    pub fn create_json(&self, name: &str, value: &Value) -> PathBuf {
        self.create_file(name, &serde_json::to_string(value).expect("serialize fixture"))
    }

    /// Creates a directory (and parents).
    pub fn create_dir(&self, name: &str) -> PathBuf {
        let path = self.temp_dir.path().join(name);
        std::fs::create_dir_all(&path).expect("failed to create dir");
        path
    }

    /// Reads a file back.
    pub fn read(&self, name: &str) -> String {
        std::fs::read_to_string(self.temp_dir.path().join(name)).expect("failed to read file")
    }
}

impl Default for TestContext {
    fn default() -> Self {
        Self::new()
    }
}

/// An executor whose terminal answers with `answers`, in order, then EOF.
pub fn scripted_executor<I, S>(answers: I, skip_permissions: bool) -> (ToolExecutor, PromptLog)
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let input = ScriptedInput::new(answers);
    let log = input.log();
    let executor = ToolExecutor::new(EngineConfig::default(), SharedInput::new(input), skip_permissions);
    (executor, log)
}

/// An executor with no terminal input.
pub fn executor() -> ToolExecutor {
    scripted_executor(Vec::<String>::new(), false).0
}

/// Builds an invocation from a JSON object literal.
pub fn invocation(tool: Tool, params: Value) -> ToolInvocation {
    let params: Map<String, Value> = match params {
        Value::Object(map) => map,
        _ => panic!("params must be an object"),
    };
    ToolInvocation::new(tool, params)
}

/// Runs one tool against `ctx`.
pub async fn run(executor: &ToolExecutor, ctx: &TestContext, tool: Tool, params: Value) -> ToolResult {
    executor.execute(&ctx.tool_ctx(), invocation(tool, params)).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_creates_nested_file() {
        let ctx = TestContext::new();
        let file_path = ctx.create_file("nested/dir/test.txt", "nested content");
        assert!(file_path.exists());
        assert_eq!(ctx.read("nested/dir/test.txt"), "nested content");
    }
}
