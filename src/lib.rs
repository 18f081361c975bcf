//! toolbench - local tool-execution engine
//!
//! Lets a remote agent act on the local machine through a fixed set of tools:
//! file access, in-process search, gated shell commands, and summaries of
//! large JSON datasets.
//!
//! This library exposes the engine for the `toolbench` binary and for tests.

pub mod aggregate;
pub mod error;
pub mod parallel;
pub mod permissions;
pub mod sampler;
pub mod scan;
pub mod shell;
pub mod tools;
pub mod types;
pub mod util;

// Re-export core types for convenient access
pub use error::{ToolError, ToolOutcome};
pub use tools::ToolExecutor;
pub use types::{EngineConfig, Tool, ToolContext, ToolInvocation, ToolResult, ToolUse};
