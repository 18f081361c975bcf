//! Typed access to invocation parameters.
//!
//! Required getters fail with [`ToolError::MissingParameter`] when the key is
//! absent or has the wrong JSON type; optional getters fall back to `None`
//! only when the key is absent or null, and reject a value of the wrong type.

use serde_json::{Map, Value};

use crate::error::{ToolError, ToolOutcome};

/// Parameters of one invocation.
#[derive(Debug, Clone, Copy)]
pub struct Params<'a> {
    map: &'a Map<String, Value>,
}

impl<'a> Params<'a> {
    pub fn new(map: &'a Map<String, Value>) -> Self {
        Self { map }
    }

    fn present(&self, name: &str) -> Option<&'a Value> {
        self.map.get(name).filter(|v| !v.is_null())
    }

    pub fn raw(&self, name: &str) -> Option<&'a Value> {
        self.present(name)
    }

    pub fn str(&self, name: &str) -> ToolOutcome<&'a str> {
        self.present(name)
            .and_then(Value::as_str)
            .ok_or_else(|| ToolError::missing(name))
    }

    pub fn opt_str(&self, name: &str) -> ToolOutcome<Option<&'a str>> {
        match self.present(name) {
            None => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.as_str())),
            Some(_) => Err(ToolError::invalid(name, "expected a string")),
        }
    }

    pub fn opt_bool(&self, name: &str) -> ToolOutcome<Option<bool>> {
        match self.present(name) {
            None => Ok(None),
            Some(Value::Bool(b)) => Ok(Some(*b)),
            Some(_) => Err(ToolError::invalid(name, "expected a boolean")),
        }
    }

    pub fn bool_or(&self, name: &str, default: bool) -> ToolOutcome<bool> {
        Ok(self.opt_bool(name)?.unwrap_or(default))
    }

    /// Non-negative integer. Floats with no fractional part are accepted.
    pub fn opt_u64(&self, name: &str) -> ToolOutcome<Option<u64>> {
        match self.present(name) {
            None => Ok(None),
            Some(Value::Number(n)) => n
                .as_u64()
                .or_else(|| n.as_f64().filter(|f| *f >= 0.0 && f.fract() == 0.0).map(|f| f as u64))
                .map(Some)
                .ok_or_else(|| ToolError::invalid(name, "expected a non-negative integer")),
            Some(_) => Err(ToolError::invalid(name, "expected a non-negative integer")),
        }
    }

    /// Any integer, including negatives. Floats with no fractional part are
    /// accepted.
    pub fn opt_i64(&self, name: &str) -> ToolOutcome<Option<i64>> {
        match self.present(name) {
            None => Ok(None),
            Some(Value::Number(n)) => n
                .as_i64()
                .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64))
                .map(Some)
                .ok_or_else(|| ToolError::invalid(name, "expected an integer")),
            Some(_) => Err(ToolError::invalid(name, "expected an integer")),
        }
    }

    pub fn opt_usize(&self, name: &str) -> ToolOutcome<Option<usize>> {
        Ok(self
            .opt_u64(name)?
            .map(|n| usize::try_from(n).unwrap_or(usize::MAX)))
    }

    pub fn str_list(&self, name: &str) -> ToolOutcome<Vec<String>> {
        self.opt_str_list(name)?.ok_or_else(|| ToolError::missing(name))
    }

    /// A list of strings. A single string is accepted as a one-element list.
    pub fn opt_str_list(&self, name: &str) -> ToolOutcome<Option<Vec<String>>> {
        match self.present(name) {
            None => Ok(None),
            Some(Value::String(s)) => Ok(Some(vec![s.clone()])),
            Some(Value::Array(items)) => items
                .iter()
                .map(|item| {
                    item.as_str()
                        .map(str::to_string)
                        .ok_or_else(|| ToolError::invalid(name, "expected an array of strings"))
                })
                .collect::<ToolOutcome<Vec<_>>>()
                .map(Some),
            Some(_) => Err(ToolError::invalid(name, "expected an array of strings")),
        }
    }
}
