//! Value coercion for aggregation.
//!
//! Exported sales data mixes real numbers with formatted strings such as
//! `"$1,234.50"`. Numeric fields are reduced to their digits, decimal
//! points, and minus signs before parsing, so accounting parentheses do not
//! make a value negative.

use serde_json::Value;

/// Group key used when a record has no value for the group-by field.
pub const MISSING_KEY: &str = "(none)";

/// Coerces a JSON value to a number.
///
/// Numbers pass through. Strings keep only `0-9`, `.` and `-` and are then
/// parsed; anything that still does not parse (or any other JSON type)
/// yields `None`, and the field is skipped for that record.
#[must_use]
pub fn coerce_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => {
            let cleaned: String = s
                .chars()
                .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
                .collect();
            cleaned.parse::<f64>().ok().filter(|n| n.is_finite())
        }
        _ => None,
    }
}

/// Renders the group-by value of a record as a key.
#[must_use]
pub fn group_key(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => MISSING_KEY.to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}
