//! Parameter schemas published to the agent.
//!
//! One definition per [`Tool`] variant; [`definition`] matches exhaustively,
//! so adding a tool without a schema does not compile.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::types::Tool;

/// A tool's name, description and JSON Schema input.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    /// JSON Schema with `"type": "object"`.
    pub input_schema: Value,
}

impl ToolDefinition {
    #[must_use]
    pub fn new(name: impl Into<String>, description: impl Into<String>, input_schema: Value) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            input_schema,
        }
    }

    /// Names listed under `required`.
    #[must_use]
    pub fn required(&self) -> Vec<&str> {
        self.input_schema["required"]
            .as_array()
            .map(|items| items.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default()
    }
}

fn object(properties: Value, required: &[&str]) -> Value {
    json!({
        "type": "object",
        "properties": properties,
        "required": required,
    })
}

/// The definition of one tool.
#[must_use]
pub fn definition(tool: Tool) -> ToolDefinition {
    let (description, schema) = match tool {
        Tool::Read => (
            "Read a text file. Returns numbered lines starting at `offset` (1-based), at most 2000 per call.",
            object(
                json!({
                    "file_path": {"type": "string", "description": "File to read"},
                    "offset": {"type": "integer", "minimum": 1, "description": "First line (default 1)"},
                    "limit": {"type": "integer", "minimum": 1, "maximum": 2000, "description": "Lines to return (default 2000)"}
                }),
                &["file_path"],
            ),
        ),
        Tool::Write => (
            "Create or overwrite a file, creating missing parent directories.",
            object(
                json!({
                    "file_path": {"type": "string"},
                    "content": {"type": "string"}
                }),
                &["file_path", "content"],
            ),
        ),
        Tool::Edit => (
            "Replace text in a file. Without replace_all only the first occurrence is replaced.",
            object(
                json!({
                    "file_path": {"type": "string"},
                    "old_string": {"type": "string"},
                    "new_string": {"type": "string"},
                    "replace_all": {"type": "boolean", "default": false}
                }),
                &["file_path", "old_string", "new_string"],
            ),
        ),
        Tool::Glob => (
            "Find files and directories by glob pattern relative to `path`. `**` recurses.",
            object(
                json!({
                    "pattern": {"type": "string", "description": "e.g. *.json or reports/**/*.csv"},
                    "path": {"type": "string", "description": "Base directory (default: working directory)"},
                    "type": {"type": "string", "enum": ["f", "d"]},
                    "limit": {"type": "integer", "minimum": 0, "default": 100}
                }),
                &["pattern"],
            ),
        ),
        Tool::Grep => (
            "Search file contents with a regular expression.",
            object(
                json!({
                    "pattern": {"type": "string"},
                    "path": {"type": "string", "description": "File or directory (default: working directory)"},
                    "glob": {"type": "string", "description": "File name filter, e.g. *.rs"},
                    "case_insensitive": {"type": "boolean", "default": false},
                    "before": {"type": "integer", "minimum": 0},
                    "after": {"type": "integer", "minimum": 0},
                    "context": {"type": "integer", "minimum": 0},
                    "output_mode": {"type": "string", "enum": ["content", "files", "count"], "default": "content"},
                    "limit": {"type": "integer", "minimum": 0, "default": 250}
                }),
                &["pattern"],
            ),
        ),
        Tool::Ls => (
            "List a directory, sorted by name.",
            object(
                json!({
                    "path": {"type": "string"},
                    "all": {"type": "boolean", "default": false, "description": "Include dotfiles"},
                    "long": {"type": "boolean", "default": false, "description": "Include size and mtime"}
                }),
                &["path"],
            ),
        ),
        Tool::Multi => (
            "Read several files at once. Each file reports its own success.",
            object(
                json!({
                    "paths": {"type": "array", "items": {"type": "string"}},
                    "max_lines": {"type": "integer", "minimum": 0, "default": 500}
                }),
                &["paths"],
            ),
        ),
        Tool::Bash => (
            "Run a shell command. Dangerous commands require confirmation.",
            object(
                json!({
                    "command": {"type": "string"},
                    "cwd": {"type": "string"},
                    "timeout": {"type": "integer", "minimum": 1, "maximum": 600_000, "default": 120_000, "description": "Milliseconds"},
                    "background": {"type": "boolean", "default": false}
                }),
                &["command"],
            ),
        ),
        Tool::Scan => (
            "Summarize a directory tree: sizes, extensions, largest files and optional JSON samples.",
            object(
                json!({
                    "path": {"type": "string", "description": "Default: store data directory"},
                    "max_depth": {"type": "integer", "minimum": 0, "default": 5},
                    "include_content": {"type": "boolean", "default": false}
                }),
                &[],
            ),
        ),
        Tool::Peek => (
            "Sample records from a JSON file, optionally aggregating it.",
            object(
                json!({
                    "file_path": {"type": "string"},
                    "max_records": {"type": "integer", "minimum": 0, "default": 100},
                    "aggregate": {
                        "type": "object",
                        "properties": {
                            "group_by": {"type": "string"},
                            "fields": {"type": "array", "items": {"type": "string"}},
                            "top_n": {"type": "integer", "minimum": 0}
                        }
                    }
                }),
                &["file_path"],
            ),
        ),
        Tool::Sum => (
            "Group records across JSON exports by a field and sum numeric fields.",
            object(
                json!({
                    "path": {"type": "string", "description": "File or directory (default: store data directory)"},
                    "group_by": {"type": "string", "default": "Product"},
                    "fields": {"type": "array", "items": {"type": "string"}},
                    "top_n": {"type": "integer", "minimum": 0, "default": 20},
                    "mode": {"type": "string", "enum": ["auto", "product", "invoice", "itemized", "daily"], "default": "auto"}
                }),
                &[],
            ),
        ),
        Tool::TodoWrite => (
            "Replace the todo list.",
            object(
                json!({
                    "todos": {
                        "type": "array",
                        "items": {
                            "type": "object",
                            "properties": {
                                "content": {"type": "string"},
                                "status": {"type": "string", "enum": ["pending", "in_progress", "completed"]},
                                "id": {"type": "string"}
                            },
                            "required": ["content", "status"]
                        }
                    }
                }),
                &["todos"],
            ),
        ),
        Tool::AskUser => (
            "Ask the user a question. A numeric answer selects from `options`.",
            object(
                json!({
                    "question": {"type": "string"},
                    "options": {"type": "array", "items": {"type": "string"}}
                }),
                &["question"],
            ),
        ),
    };

    ToolDefinition::new(tool.name(), description, schema)
}

/// Definitions for every tool, in [`Tool::ALL`] order.
#[must_use]
pub fn tool_definitions() -> Vec<ToolDefinition> {
    Tool::ALL.into_iter().map(definition).collect()
}
