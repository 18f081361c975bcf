//! Core type definitions for the tool engine.
//!
//! - [`config`] - Engine configuration and per-call context
//! - [`invocation`] - Tool names, invocations, and the wire envelope
//! - [`result`] - The result envelope returned by every tool
//!
//! # Re-exports
//!
//! ```
//! use toolbench::types::{Tool, ToolContext, ToolInvocation, ToolResult};
//! ```

pub mod config;
pub mod invocation;
pub mod result;

pub use config::{EngineConfig, StoreContext, ToolContext};
pub use invocation::{Tool, ToolInvocation, ToolResponse, ToolUse};
pub use result::ToolResult;
