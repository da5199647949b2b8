//! Named pure value transforms applied during field mapping.
//!
//! Coercions have an explicit failure contract: anything that cannot be
//! converted to the target type yields `Value::Null` (JSON has no NaN), so a
//! bad input degrades the mapped field instead of aborting a conversion.

use chrono::{DateTime, NaiveDate, Utc};
use serde_json::Value;

/// A named value transform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transform {
    Uppercase,
    Lowercase,
    Trim,
    ToNumber,
    ToString,
    ToBoolean,
    ToDate,
    /// Fallback for unrecognized names — passes the value through unchanged.
    Identity,
}

impl Transform {
    /// Resolve a transform by name. Unrecognized names are the identity.
    pub fn from_name(name: &str) -> Self {
        match name {
            "uppercase" => Self::Uppercase,
            "lowercase" => Self::Lowercase,
            "trim" => Self::Trim,
            "toNumber" => Self::ToNumber,
            "toString" => Self::ToString,
            "toBoolean" => Self::ToBoolean,
            "toDate" => Self::ToDate,
            _ => Self::Identity,
        }
    }

    /// Apply the transform to a value.
    pub fn apply(&self, value: &Value) -> Value {
        match self {
            Self::Uppercase => map_str(value, |s| s.to_uppercase()),
            Self::Lowercase => map_str(value, |s| s.to_lowercase()),
            Self::Trim => map_str(value, |s| s.trim().to_string()),
            Self::ToNumber => to_number(value),
            Self::ToString => to_string(value),
            Self::ToBoolean => to_boolean(value),
            Self::ToDate => to_date(value),
            Self::Identity => value.clone(),
        }
    }
}

/// Apply a named transform to a value. Shorthand for
/// `Transform::from_name(name).apply(value)`.
pub fn transform(value: &Value, name: &str) -> Value {
    Transform::from_name(name).apply(value)
}

/// Case/trim transforms only touch strings; other values pass through.
fn map_str(value: &Value, f: impl Fn(&str) -> String) -> Value {
    match value.as_str() {
        Some(s) => Value::String(f(s)),
        None => value.clone(),
    }
}

fn to_number(value: &Value) -> Value {
    match value {
        Value::Number(_) => value.clone(),
        Value::String(s) => s
            .trim()
            .parse::<f64>()
            .ok()
            .and_then(serde_json::Number::from_f64)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        Value::Bool(b) => Value::from(if *b { 1 } else { 0 }),
        _ => Value::Null,
    }
}

fn to_string(value: &Value) -> Value {
    match value {
        Value::String(_) => value.clone(),
        Value::Number(n) => Value::String(n.to_string()),
        Value::Bool(b) => Value::String(b.to_string()),
        Value::Null => Value::Null,
        // Composite values stringify as compact JSON.
        other => Value::String(other.to_string()),
    }
}

fn to_boolean(value: &Value) -> Value {
    match value {
        Value::Bool(_) => value.clone(),
        Value::String(s) => match s.trim().to_lowercase().as_str() {
            "true" | "yes" | "1" => Value::Bool(true),
            "false" | "no" | "0" | "" => Value::Bool(false),
            _ => Value::Null,
        },
        Value::Number(n) => Value::Bool(n.as_f64().is_some_and(|f| f != 0.0)),
        _ => Value::Null,
    }
}

/// Dates normalize to an RFC 3339 string. Accepts RFC 3339 strings,
/// `YYYY-MM-DD` strings, and epoch-millisecond numbers.
fn to_date(value: &Value) -> Value {
    match value {
        Value::String(s) => {
            let s = s.trim();
            if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
                return Value::String(dt.with_timezone(&Utc).to_rfc3339());
            }
            if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
                let dt = date.and_hms_opt(0, 0, 0).map(|naive| naive.and_utc());
                if let Some(dt) = dt {
                    return Value::String(dt.to_rfc3339());
                }
            }
            Value::Null
        }
        Value::Number(n) => n
            .as_i64()
            .and_then(DateTime::<Utc>::from_timestamp_millis)
            .map(|dt| Value::String(dt.to_rfc3339()))
            .unwrap_or(Value::Null),
        _ => Value::Null,
    }
}
