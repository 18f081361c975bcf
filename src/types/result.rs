//! The result envelope returned for every tool invocation.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{ToolError, ToolOutcome, CANCELLED_MESSAGE};

/// Outcome of one tool invocation, serialized as a single JSON object.
///
/// The tool-specific payload is flattened next to the envelope fields, so a
/// successful `Read` serializes as
/// `{"success": true, "content": "...", "total_lines": 3, ...}`.
///
/// Invariant: `success == false` implies `error` is set. A cancelled result
/// carries both `cancelled: true` and the fixed cancellation message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolResult {
    /// Whether the tool achieved what was asked.
    pub success: bool,

    /// Failure description; present whenever `success` is false.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Set when the user declined the operation at the permission prompt.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub cancelled: bool,

    /// Tool-specific fields.
    #[serde(flatten)]
    pub payload: Map<String, Value>,
}

impl ToolResult {
    /// Creates a successful result from a serializable payload.
    ///
    /// Struct payloads are flattened into the envelope; any non-object payload
    /// is stored under a `result` key.
    ///
    /// # Errors
    ///
    /// Returns an internal error if the payload cannot be serialized.
    pub fn success<T: Serialize>(payload: T) -> ToolOutcome<Self> {
        let value = serde_json::to_value(payload)
            .map_err(|e| ToolError::internal(format!("failed to serialize result: {e}")))?;

        let payload = match value {
            Value::Object(map) => map,
            Value::Null => Map::new(),
            other => {
                let mut map = Map::new();
                map.insert("result".to_string(), other);
                map
            }
        };

        Ok(Self {
            success: true,
            error: None,
            cancelled: false,
            payload,
        })
    }

    /// Creates a failed result with no payload.
    #[must_use]
    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
            cancelled: false,
            payload: Map::new(),
        }
    }

    /// Creates the distinct result shape for a user-declined operation.
    #[must_use]
    pub fn cancelled() -> Self {
        Self {
            success: false,
            error: Some(CANCELLED_MESSAGE.to_string()),
            cancelled: true,
            payload: Map::new(),
        }
    }

    /// Marks a result as failed while keeping its payload.
    ///
    /// Used when a tool produced data but did not succeed, such as a command
    /// that exited non-zero.
    #[must_use]
    pub fn into_failure(mut self, error: impl Into<String>) -> Self {
        self.success = false;
        self.error = Some(error.into());
        self
    }

    /// Returns a payload field.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.payload.get(key)
    }

    /// Serializes the result as a JSON value.
    #[must_use]
    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or_else(|_| {
            serde_json::json!({"success": false, "error": "failed to serialize result"})
        })
    }
}

impl From<ToolError> for ToolResult {
    fn from(err: ToolError) -> Self {
        if err.is_cancellation() {
            Self::cancelled()
        } else {
            Self::failure(err.to_string())
        }
    }
}
