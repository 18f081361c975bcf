//! Permission gate for shell commands.
//!
//! Every command the Bash tool is asked to run passes through
//! [`PermissionGate::evaluate`] first.
//!
//! # Architecture
//!
//! ```text
//! Bash invocation
//!     ↓
//! PermissionGate::evaluate()
//!     ├─ skip_permissions set      → allowed, no check
//!     ├─ no dangerous pattern      → allowed
//!     └─ dangerous pattern matched → warning + y/N prompt
//!           ├─ "y" / "yes"         → allowed
//!           └─ anything else       → denied (cancelled result)
//! ```
//!
//! Commands that match nothing are allowed. This fail-open default is a
//! product policy; see `DESIGN.md`.
//!
//! # Example
//!
//! ```
//! use toolbench::permissions::{PermissionGate, ScriptedInput, SharedInput};
//!
//! # tokio_test_block_on(async {
//! let gate = PermissionGate::new(false, SharedInput::new(ScriptedInput::new(["n"])));
//! assert!(gate.evaluate("ls -la").await);
//! assert!(!gate.evaluate("rm -rf /").await);
//! # });
//! # fn tokio_test_block_on<F: std::future::Future>(f: F) -> F::Output {
//! #     tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap().block_on(f)
//! # }
//! ```

pub mod input;
pub mod patterns;

use tracing::{debug, info, warn};

pub use input::{is_affirmative, PromptLog, ScriptedInput, SharedInput, StdinInput, UserInput};
pub use patterns::{find_dangerous, normalize_command, DangerousPattern};

use crate::util::truncate_string;

/// Maximum command length echoed in the warning.
const DISPLAY_COMMAND_LEN: usize = 100;

/// Classifies commands against the dangerous-pattern table and asks the user
/// to confirm matches.
#[derive(Debug, Clone)]
pub struct PermissionGate {
    skip_permissions: bool,
    input: SharedInput,
}

impl PermissionGate {
    /// Creates a gate.
    ///
    /// With `skip_permissions` set, every command is approved without a check.
    /// This is the `--dangerously-skip-permissions` flag.
    #[must_use]
    pub fn new(skip_permissions: bool, input: SharedInput) -> Self {
        Self {
            skip_permissions,
            input,
        }
    }

    /// Returns whether permission checks are skipped.
    #[must_use]
    pub fn skip_permissions(&self) -> bool {
        self.skip_permissions
    }

    /// Returns the dangerous pattern a command matches, if any.
    #[must_use]
    pub fn classify(&self, command: &str) -> Option<&'static DangerousPattern> {
        find_dangerous(command)
    }

    /// Decides whether `command` may run, prompting the user if it looks
    /// dangerous.
    pub async fn evaluate(&self, command: &str) -> bool {
        if self.skip_permissions {
            debug!(command = %command, "Permission check skipped");
            return true;
        }

        let Some(pattern) = self.classify(command) else {
            return true;
        };

        warn!(
            reason = pattern.description,
            pattern = %pattern.as_str(),
            command = %command,
            "Dangerous command requires confirmation"
        );

        let warning = format!(
            "WARNING: {}\n  Command: {}",
            pattern.description,
            truncate_string(command, DISPLAY_COMMAND_LEN)
        );
        let approved = self
            .input
            .confirm(Some(warning), "Do you want to proceed? (y/N): ".to_string())
            .await;

        if approved {
            info!(reason = pattern.description, "User approved dangerous command");
        } else {
            info!(reason = pattern.description, "User declined dangerous command");
        }
        approved
    }
}
