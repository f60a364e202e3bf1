//! Schema descriptions: the JSON text form callers hand to the repair engine.
//!
//! A description is a JSON object whose values are type hints:
//! `"string"`, `"number"`, `"boolean"`, or an array hint. Array hints are
//! usually written as a string holding an array literal (`"[\"string\"]"`),
//! but a real one-element JSON array (`["string"]`) is accepted too.

use serde_json::{Map, Value};
use tracing::error;

use crate::error::{RecoverError, Result};
use crate::types::{FieldSchema, FieldType, ScalarKind};

/// Parse a schema description into a [`FieldSchema`], preserving key order.
///
/// Control characters are stripped before parsing; callers sometimes build
/// descriptions by joining fragments with newlines and tabs.
///
/// # Errors
///
/// Returns [`RecoverError::Schema`] if the description is not a JSON object
/// of recognised type hints. This is a bug in the caller and is logged at
/// error level.
pub fn parse_schema(description: &str) -> Result<FieldSchema> {
    parse_schema_inner(description).inspect_err(|e| {
        error!(description, "failed to parse schema description: {e}");
    })
}

fn parse_schema_inner(description: &str) -> Result<FieldSchema> {
    let cleaned: String = description
        .chars()
        .filter(|c| !is_stripped_control(*c))
        .collect();
    let value: Value = serde_json::from_str(cleaned.trim())
        .map_err(|e| RecoverError::Schema(format!("invalid schema JSON: {e}")))?;
    let Value::Object(map) = value else {
        return Err(RecoverError::Schema(
            "schema description must be a JSON object".into(),
        ));
    };

    let mut schema = FieldSchema::new();
    for (name, hint) in map {
        let ty = parse_type_hint(&hint)
            .map_err(|e| RecoverError::Schema(format!("field {name:?}: {e}")))?;
        schema.insert(name, ty);
    }
    Ok(schema)
}

/// Render a schema back into its description form.
pub fn describe_schema(schema: &FieldSchema) -> String {
    let map: Map<String, Value> = schema
        .iter()
        .map(|(name, ty)| (name.to_owned(), Value::String(ty.hint())))
        .collect();
    Value::Object(map).to_string()
}

fn parse_type_hint(hint: &Value) -> std::result::Result<FieldType, String> {
    match hint {
        Value::String(s) => {
            let s = s.trim();
            if let Some(inner) = s.strip_prefix('[').and_then(|r| r.strip_suffix(']')) {
                let inner = inner.trim().trim_matches(|c| c == '"' || c == '\'');
                parse_kind(inner).map(FieldType::ArrayOf)
            } else {
                parse_kind(s).map(FieldType::Scalar)
            }
        }
        Value::Array(items) => match items.as_slice() {
            [Value::String(s)] => parse_kind(s).map(FieldType::ArrayOf),
            _ => Err("array hint must hold exactly one type name".into()),
        },
        other => Err(format!("unsupported type hint {other}")),
    }
}

fn parse_kind(s: &str) -> std::result::Result<ScalarKind, String> {
    s.parse::<ScalarKind>().map_err(|e| e.to_string())
}

fn is_stripped_control(c: char) -> bool {
    matches!(c, '\u{0000}'..='\u{001F}' | '\u{007F}'..='\u{009F}')
}
