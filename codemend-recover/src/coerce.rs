//! Type coercion applied to every working value before it is returned.
//!
//! Coercion is total: whatever the working value is (or if there is none),
//! the result has the declared type.

use serde_json::{Number, Value};

use crate::types::{FieldType, ScalarKind};

/// Integral floats below this magnitude are emitted as JSON integers.
const MAX_EXACT_INTEGER: f64 = 9_007_199_254_740_992.0;

/// Coerce a working value to `ty`, substituting the type default when needed.
pub fn coerce(value: Option<Value>, ty: FieldType) -> Value {
    let converted = match ty {
        FieldType::Scalar(kind) => value.and_then(|v| convert_scalar(v, kind)),
        FieldType::ArrayOf(kind) => value.and_then(|v| convert_array(v, kind)),
    };
    converted.unwrap_or_else(|| ty.default_value())
}

/// Coerce a single value to a primitive kind.
pub fn coerce_scalar(value: Option<Value>, kind: ScalarKind) -> Value {
    value
        .and_then(|v| convert_scalar(v, kind))
        .unwrap_or_else(|| kind.default_value())
}

/// Converted value, or `None` when only the default will do.
fn convert_scalar(value: Value, kind: ScalarKind) -> Option<Value> {
    match kind {
        ScalarKind::String => to_text(value).map(Value::String),
        ScalarKind::Number => to_number(&value),
        ScalarKind::Boolean => Some(Value::Bool(to_bool(&value))),
    }
}

fn convert_array(value: Value, kind: ScalarKind) -> Option<Value> {
    match value {
        Value::Array(items) => Some(coerce_items(items, kind)),
        Value::String(s) => match serde_json::from_str::<Value>(&s) {
            Ok(Value::Array(items)) => Some(coerce_items(items, kind)),
            _ => Some(Value::Array(vec![coerce_scalar(Some(Value::String(s)), kind)])),
        },
        _ => None,
    }
}

fn coerce_items(items: Vec<Value>, kind: ScalarKind) -> Value {
    items
        .into_iter()
        .map(|item| coerce_scalar(Some(item), kind))
        .collect()
}

fn to_text(value: Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s),
        Value::Null => None,
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        other => Some(other.to_string()),
    }
}

fn to_number(value: &Value) -> Option<Value> {
    match value {
        Value::Number(n) => Some(Value::Number(n.clone())),
        Value::String(s) => s.trim().parse::<f64>().ok().and_then(number_value),
        Value::Bool(b) => Some(Value::from(u8::from(*b))),
        _ => None,
    }
}

/// JSON number for `f`; NaN and infinities have none.
fn number_value(f: f64) -> Option<Value> {
    if !f.is_finite() {
        return None;
    }
    if f.fract() == 0.0 && f.abs() < MAX_EXACT_INTEGER {
        return Some(Value::from(f as i64));
    }
    Number::from_f64(f).map(Value::Number)
}

fn to_bool(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::String(s) => s.to_lowercase() == "true",
        other => other.to_string().to_lowercase() == "true",
    }
}
