//! Tool dispatch.
//!
//! [`ToolExecutor`] takes one [`ToolInvocation`] at a time, routes it to its
//! handler by [`Tool`] variant, and always returns a [`ToolResult`]. Handlers
//! return `Result<ToolResult, ToolError>`; the executor turns any error into
//! a failed result, so nothing propagates past this boundary.
//!
//! # Example
//!
//! ```no_run
//! use toolbench::permissions::SharedInput;
//! use toolbench::tools::ToolExecutor;
//! use toolbench::types::{EngineConfig, ToolContext, ToolUse};
//! use serde_json::json;
//!
//! # async fn example() {
//! let executor = ToolExecutor::new(EngineConfig::default(), SharedInput::stdin(), false);
//! let ctx = ToolContext::new("/tmp");
//! let call = ToolUse {
//!     id: "toolu_1".into(),
//!     name: "LS".into(),
//!     params: json!({"path": "."}),
//! };
//! let response = executor.execute_use(&ctx, &call).await;
//! assert_eq!(response.tool_use_id, "toolu_1");
//! # }
//! ```

pub mod analysis;
pub mod bash;
pub mod fs;
pub mod interactive;
pub mod params;
pub mod schema;
pub mod search;

use std::time::Instant;

use tracing::{debug, info, warn};

use crate::error::ToolOutcome;
use crate::permissions::{PermissionGate, SharedInput};
use crate::types::{EngineConfig, Tool, ToolContext, ToolInvocation, ToolResponse, ToolResult, ToolUse};

pub use bash::ProcessRunner;
pub use interactive::{TodoItem, TodoList, TodoStatus};
pub use params::Params;
pub use schema::{tool_definitions, ToolDefinition};

/// Executes tool invocations.
#[derive(Debug)]
pub struct ToolExecutor {
    config: EngineConfig,
    gate: PermissionGate,
    input: SharedInput,
    runner: ProcessRunner,
    todos: TodoList,
}

impl ToolExecutor {
    /// Creates an executor.
    ///
    /// `input` is the shared terminal used by both the permission prompt and
    /// AskUser, so at most one prompt is ever pending.
    #[must_use]
    pub fn new(config: EngineConfig, input: SharedInput, skip_permissions: bool) -> Self {
        Self {
            gate: PermissionGate::new(skip_permissions, input.clone()),
            runner: ProcessRunner::new(config.bash.clone()),
            todos: TodoList::default(),
            config,
            input,
        }
    }

    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    #[must_use]
    pub fn gate(&self) -> &PermissionGate {
        &self.gate
    }

    /// The current todo list.
    #[must_use]
    pub fn todos(&self) -> Vec<TodoItem> {
        self.todos.snapshot()
    }

    /// Runs one invocation. Never fails: errors become failed results.
    pub async fn execute(&self, ctx: &ToolContext, invocation: ToolInvocation) -> ToolResult {
        let tool = invocation.tool;
        let started = Instant::now();
        debug!(tool = %tool, "Executing tool");

        let result = match self.dispatch(ctx, &invocation).await {
            Ok(result) => result,
            Err(err) => {
                if err.is_cancellation() {
                    info!(tool = %tool, "Tool cancelled by user");
                } else {
                    warn!(tool = %tool, error = %err, "Tool failed");
                }
                ToolResult::from(err)
            }
        };

        info!(
            tool = %tool,
            success = result.success,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Tool finished"
        );
        result
    }

    async fn dispatch(&self, ctx: &ToolContext, invocation: &ToolInvocation) -> ToolOutcome<ToolResult> {
        let params = Params::new(&invocation.params);
        match invocation.tool {
            Tool::Read => fs::read(ctx, params).await,
            Tool::Write => fs::write(ctx, params).await,
            Tool::Edit => fs::edit(ctx, params).await,
            Tool::Ls => fs::ls(ctx, params).await,
            Tool::Multi => fs::multi(ctx, params).await,
            Tool::Glob => search::glob(ctx, params).await,
            Tool::Grep => search::grep(ctx, params).await,
            Tool::Bash => bash::bash(&self.runner, &self.gate, ctx, params).await,
            Tool::Scan => analysis::scan(&self.config, ctx, params).await,
            Tool::Peek => analysis::peek(&self.config, ctx, params).await,
            Tool::Sum => analysis::sum(&self.config, ctx, params).await,
            Tool::TodoWrite => interactive::todo_write(&self.todos, params),
            Tool::AskUser => interactive::ask_user(&self.input, params).await,
        }
    }

    /// Parses and runs one wire-level tool use, echoing its id.
    pub async fn execute_use(&self, ctx: &ToolContext, tool_use: &ToolUse) -> ToolResponse {
        let content = match ToolInvocation::parse(&tool_use.name, tool_use.params.clone()) {
            Ok(invocation) => self.execute(ctx, invocation).await,
            Err(err) => {
                warn!(name = %tool_use.name, error = %err, "Rejected tool use");
                ToolResult::from(err)
            }
        };
        ToolResponse {
            tool_use_id: tool_use.id.clone(),
            content,
        }
    }

    /// Runs a turn's tool uses one after another, in order.
    pub async fn execute_all(&self, ctx: &ToolContext, uses: &[ToolUse]) -> Vec<ToolResponse> {
        let mut responses = Vec::with_capacity(uses.len());
        for tool_use in uses {
            responses.push(self.execute_use(ctx, tool_use).await);
        }
        responses
    }
}
