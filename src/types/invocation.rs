//! The request side of the agent contract.
//!
//! The remote agent sends an array of [`ToolUse`] blocks; each one is parsed
//! into a [`ToolInvocation`] (closed [`Tool`] enum plus parameters) and answered
//! with a [`ToolResponse`] echoing the block id.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::result::ToolResult;
use crate::error::ToolError;

/// Every tool the engine provides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tool {
    /// Read a slice of a text file.
    Read,
    /// Create or overwrite a file.
    Write,
    /// Replace a string inside a file.
    Edit,
    /// Find paths by glob pattern.
    Glob,
    /// Search file contents by regex.
    Grep,
    /// List one directory.
    Ls,
    /// Read several files concurrently.
    Multi,
    /// Run a shell command.
    Bash,
    /// Recursive directory statistics.
    Scan,
    /// Sample records from a JSON file.
    Peek,
    /// Group-by summation over JSON exports.
    Sum,
    /// Replace the session todo list.
    TodoWrite,
    /// Ask the user a question on the terminal.
    AskUser,
}

impl Tool {
    /// All tools, in schema order.
    pub const ALL: [Tool; 13] = [
        Tool::Read,
        Tool::Write,
        Tool::Edit,
        Tool::Glob,
        Tool::Grep,
        Tool::Ls,
        Tool::Multi,
        Tool::Bash,
        Tool::Scan,
        Tool::Peek,
        Tool::Sum,
        Tool::TodoWrite,
        Tool::AskUser,
    ];

    /// The wire name of the tool.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Tool::Read => "Read",
            Tool::Write => "Write",
            Tool::Edit => "Edit",
            Tool::Glob => "Glob",
            Tool::Grep => "Grep",
            Tool::Ls => "LS",
            Tool::Multi => "Multi",
            Tool::Bash => "Bash",
            Tool::Scan => "Scan",
            Tool::Peek => "Peek",
            Tool::Sum => "Sum",
            Tool::TodoWrite => "TodoWrite",
            Tool::AskUser => "AskUser",
        }
    }
}

impl fmt::Display for Tool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Tool {
    type Err = ToolError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        Tool::ALL
            .into_iter()
            .find(|tool| tool.name() == name)
            .ok_or_else(|| ToolError::UnknownTool {
                name: name.to_string(),
            })
    }
}

/// One parsed request: which tool, with which parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolInvocation {
    /// The tool to run.
    pub tool: Tool,
    /// Raw parameters as sent by the agent.
    pub params: Map<String, Value>,
}

impl ToolInvocation {
    /// Creates an invocation for a known tool.
    #[must_use]
    pub fn new(tool: Tool, params: Map<String, Value>) -> Self {
        Self { tool, params }
    }

    /// Parses a tool name and a JSON parameter value.
    ///
    /// A `null` parameter value is treated as an empty object.
    ///
    /// # Errors
    ///
    /// Returns `UnknownTool` for an unrecognized name, or `InvalidParameter`
    /// if `params` is neither an object nor null.
    pub fn parse(name: &str, params: Value) -> Result<Self, ToolError> {
        let tool = name.parse()?;
        let params = match params {
            Value::Object(map) => map,
            Value::Null => Map::new(),
            other => {
                return Err(ToolError::invalid(
                    "params",
                    format!("expected an object, got {other}"),
                ))
            }
        };
        Ok(Self { tool, params })
    }
}

/// A tool-use block as received from the agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolUse {
    /// Correlation id, echoed back unchanged.
    pub id: String,
    /// Tool name.
    pub name: String,
    /// Tool parameters.
    #[serde(default, alias = "input")]
    pub params: Value,
}

/// A tool result block sent back to the agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolResponse {
    /// The id of the originating [`ToolUse`].
    pub tool_use_id: String,
    /// The serialized [`ToolResult`].
    pub content: ToolResult,
}
