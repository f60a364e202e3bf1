//! Targeted recovery of single field values from near-JSON text.
//!
//! Patterns are anchored on a `"key":` occurrence (case-insensitive, key
//! regex-escaped) and capture whatever follows in a shape suited to the
//! declared type. Captures are returned as raw JSON values for the coercion
//! step; nothing here enforces the final type.

use regex::Regex;
use serde_json::Value;
use tracing::warn;

use crate::types::{FieldType, ScalarKind};

/// Scan `text` for the value of `key`, shaped for `ty`.
///
/// Returns `None` when no pattern matches.
pub fn scan_field(text: &str, key: &str, ty: FieldType) -> Option<Value> {
    match ty {
        FieldType::ArrayOf(_) => scan_array(text, key),
        FieldType::Scalar(ScalarKind::String) => scan_string(text, key),
        FieldType::Scalar(_) => scan_literal(text, key),
    }
}

/// Whether a well-formed JSON string token after `"key":` in `text` decodes
/// to `value`.
///
/// A parsed string holding quotes whose key is not followed by a valid token
/// for it usually means the parser split the real value at an unescaped quote.
/// Any valid escaping is accepted (`\/`, `\u00e9`, ...).
pub fn appears_escaped(text: &str, key: &str, value: &str) -> bool {
    let pattern = format!(r#"{}("(?:[^"\\]|\\[\s\S])*")"#, key_prefix(key));
    let Some(re) = compile(&pattern) else {
        return false;
    };
    re.captures_iter(text)
        .filter_map(|caps| caps.get(1))
        .any(|token| serde_json::from_str::<String>(token.as_str()).is_ok_and(|s| s == value))
}

/// Array span from `[` to the first `]` that closes a parseable array.
///
/// When no close yields a valid array, the span up to the first `]` is
/// returned so coercion can still wrap it.
fn scan_array(text: &str, key: &str) -> Option<Value> {
    let re = compile(&format!(r"{}\[", key_prefix(key)))?;
    let m = re.find(text)?;
    let open = m.end() - 1;
    let rest = &text[open..];

    let mut first_close: Option<&str> = None;
    for (idx, _) in rest.match_indices(']') {
        let span = &rest[..=idx];
        if matches!(serde_json::from_str::<Value>(span), Ok(Value::Array(_))) {
            return Some(Value::String(span.to_owned()));
        }
        first_close.get_or_insert(span);
    }
    first_close.map(|span| Value::String(span.to_owned()))
}

/// String value: double-quoted, else single-quoted, else an unquoted run.
///
/// The double-quoted form ends at a quote followed by a structural boundary:
/// `,` plus the next `"key":`, closing brackets that run to `,` or end of
/// text, or end of text. Values with stray inner quotes and brackets (such
/// as `d["k"] + 1`) are captured whole.
fn scan_string(text: &str, key: &str) -> Option<Value> {
    let pattern = format!(
        r#"{}(?:"([\s\S]*?)"\s*(?:,\s*(?:"[^"]*"\s*:|$)|[}}\]]\s*(?:[,}}\]]|$)|$)|'([^']*)'|([\s\S]*?)(?:\s*"\w+"\s*:|[,\]}}]|$))"#,
        key_prefix(key)
    );
    let re = compile(&pattern)?;
    let caps = re.captures(text)?;

    if let Some(m) = caps.get(1) {
        return Some(Value::String(unescape(m.as_str())));
    }
    if let Some(m) = caps.get(2) {
        return Some(Value::String(m.as_str().to_owned()));
    }
    let run = caps.get(3).map_or("", |m| m.as_str()).trim();
    // Truncated values keep their opening quote.
    let run = run.strip_prefix('"').unwrap_or(run);
    let run = run.strip_suffix('"').unwrap_or(run);
    Some(Value::String(run.to_owned()))
}

/// Number or boolean: unquoted run up to `,`, `}`, `]` or end of text.
///
/// The run is parsed as a JSON literal when possible and kept as text
/// otherwise.
fn scan_literal(text: &str, key: &str) -> Option<Value> {
    let re = compile(&format!(r"{}([\s\S]*?)(?:,|\}}|\]|$)", key_prefix(key)))?;
    let caps = re.captures(text)?;
    let run = caps.get(1).map_or("", |m| m.as_str()).trim();
    if run.is_empty() {
        return Some(Value::String(String::new()));
    }
    Some(serde_json::from_str::<Value>(run).unwrap_or_else(|_| Value::String(run.to_owned())))
}

fn key_prefix(key: &str) -> String {
    format!(r#"(?i)"{}"\s*:\s*"#, regex::escape(key))
}

fn compile(pattern: &str) -> Option<Regex> {
    Regex::new(pattern)
        .inspect_err(|e| warn!("field recovery pattern failed to compile: {e}"))
        .ok()
}

/// JSON-unescape captured string content, falling back to the raw capture.
fn unescape(raw: &str) -> String {
    serde_json::from_str::<String>(&format!("\"{raw}\"")).unwrap_or_else(|_| raw.to_owned())
}
