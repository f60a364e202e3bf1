//! Schema-guided repair of malformed model responses.
//!
//! Each schema field is resolved in four steps: exact lookup in the
//! first-pass object, fuzzy key resolution, targeted scanning of the raw
//! text, and type coercion. The result always carries every schema key.

use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::coerce::coerce;
use crate::config::RepairConfig;
use crate::error::Result;
use crate::extract::extract;
use crate::fuzzy::best_key_match;
use crate::scan::{appears_escaped, scan_field};
use crate::schema::parse_schema;
use crate::types::{FieldSchema, FieldSource, FieldType, RecoveredObject, RepairReport, Repaired};

/// Repair `text` against `schema` with the default thresholds.
///
/// Never fails: fields that cannot be recovered get their type default.
#[must_use]
pub fn repair(text: &str, schema: &FieldSchema) -> Repaired {
    repair_with_config(text, schema, &RepairConfig::default())
}

/// Repair `text` against a schema description (see [`crate::schema`]).
///
/// # Errors
///
/// Returns [`crate::RecoverError::Schema`] if the description cannot be
/// parsed. Malformed response text never causes an error.
pub fn repair_described(text: &str, description: &str) -> Result<Repaired> {
    let schema = parse_schema(description)?;
    Ok(repair(text, &schema))
}

/// Repair `text` against `schema` using `config` for fuzzy key thresholds.
#[must_use]
pub fn repair_with_config(text: &str, schema: &FieldSchema, config: &RepairConfig) -> Repaired {
    let first_pass = first_pass_object(text);
    let first_pass_parsed = first_pass.is_some();
    let first_pass = first_pass.unwrap_or_default();

    let mut object = RecoveredObject::new();
    let mut sources = Vec::with_capacity(schema.len());
    for (name, ty) in schema.iter() {
        let (value, source) = resolve_field(text, name, ty, &first_pass, config);
        debug!(field = name, ?source, "field resolved");
        object.insert(name.to_owned(), value);
        sources.push((name.to_owned(), source));
    }

    debug!(fields = object.len(), "response repaired");
    Repaired {
        object,
        report: RepairReport {
            sources,
            first_pass_parsed,
            clear_last_error: true,
            reset_retries: true,
            stop_progress: true,
        },
    }
}

/// Object produced by the extractor, or `None` if it failed or found a non-object.
fn first_pass_object(text: &str) -> Option<Map<String, Value>> {
    match extract(text) {
        Ok(Value::Object(map)) => Some(map),
        Ok(other) => {
            warn!(kind = json_kind(&other), "first pass found a non-object value");
            None
        }
        Err(e) => {
            warn!("first pass extraction failed, falling back to field scanning: {e}");
            None
        }
    }
}

fn resolve_field(
    text: &str,
    name: &str,
    ty: FieldType,
    first_pass: &Map<String, Value>,
    config: &RepairConfig,
) -> (Value, FieldSource) {
    let (mut working, mut source, key) = if let Some(value) = first_pass.get(name) {
        (Some(value.clone()), FieldSource::Exact, name)
    } else if let Some(m) = best_key_match(name, first_pass.keys().map(String::as_str), config) {
        debug!(field = name, key = m.key, distance = m.distance, "fuzzy key match");
        (
            first_pass.get(m.key).cloned(),
            FieldSource::Fuzzy {
                key: m.key.to_owned(),
                distance: m.distance,
            },
            m.key,
        )
    } else {
        (None, FieldSource::Default, name)
    };

    if needs_scan(text, key, ty, working.as_ref()) {
        match scan_field(text, key, ty) {
            Some(value) => {
                debug!(field = name, key, "value recovered from raw text");
                working = Some(value);
                source = FieldSource::Regex {
                    key: key.to_owned(),
                };
            }
            None => warn!(field = name, key, "no value found in raw text"),
        }
    }

    (coerce(working, ty), source)
}

/// Whether the working value is suspect enough to rescan the raw text.
fn needs_scan(text: &str, key: &str, ty: FieldType, value: Option<&Value>) -> bool {
    let Some(value) = value else {
        return true;
    };
    match (ty, value) {
        (FieldType::STRING, Value::String(s)) => {
            s.trim().is_empty()
                || ((s.contains('"') || s.contains('\'')) && !appears_escaped(text, key, s))
        }
        _ => !ty.matches(value),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ScalarKind;
    use serde_json::json;

    fn schema(fields: &[(&str, FieldType)]) -> FieldSchema {
        fields
            .iter()
            .fold(FieldSchema::new(), |s, (name, ty)| s.with_field(*name, *ty))
    }

    fn keys(object: &RecoveredObject) -> Vec<&str> {
        object.keys().map(String::as_str).collect()
    }

    #[test]
    fn well_formed_response_passes_through() {
        let s = schema(&[("review", FieldType::STRING), ("score", FieldType::NUMBER)]);
        let repaired = repair(r#"{"review": "<p>ok</p>", "score": 7}"#, &s);
        assert_eq!(
            Value::Object(repaired.object),
            json!({"review": "<p>ok</p>", "score": 7})
        );
        assert!(repaired.report.first_pass_parsed);
        assert_eq!(repaired.report.source("score"), Some(&FieldSource::Exact));
    }

    #[test]
    fn output_keys_follow_schema_exactly() {
        let s = schema(&[("code", FieldType::STRING), ("explanation", FieldType::STRING)]);
        let repaired = repair(r#"{"explanation": "e", "code": "c", "extra": true}"#, &s);
        assert_eq!(keys(&repaired.object), vec!["code", "explanation"]);
    }

    #[test]
    fn fuzzy_key_substitution() {
        let s = schema(&[("explanation", FieldType::STRING)]);
        let repaired = repair(r#"{"exlanation": "hi"}"#, &s);
        assert_eq!(Value::Object(repaired.object), json!({"explanation": "hi"}));
        assert_eq!(
            repaired.report.source("explanation"),
            Some(&FieldSource::Fuzzy {
                key: "exlanation".into(),
                distance: 1
            })
        );
    }

    #[test]
    fn fuzzy_threshold_rejection() {
        let s = schema(&[("code", FieldType::STRING)]);
        let repaired = repair(r#"{"summary": "x"}"#, &s);
        assert_eq!(Value::Object(repaired.object), json!({"code": ""}));
        assert_eq!(repaired.report.source("code"), Some(&FieldSource::Default));
    }

    #[test]
    fn fuzzy_key_used_for_scanning() {
        let s = schema(&[("score", FieldType::NUMBER)]);
        let repaired = repair(r#"{"scor": "9"}"#, &s);
        assert_eq!(repaired.object["score"], json!(9));
        assert_eq!(
            repaired.report.source("score"),
            Some(&FieldSource::Regex { key: "scor".into() })
        );
    }

    #[test]
    fn scan_without_first_pass_uses_expected_name() {
        let s = schema(&[("summary", FieldType::STRING)]);
        let repaired = repair(r#"{"sumary": "adds "docs"", "x": }"#, &s);
        assert_eq!(repaired.object["summary"], json!(""));
    }

    #[test]
    fn number_default_on_bad_data() {
        let s = schema(&[("score", FieldType::NUMBER)]);
        let repaired = repair(r#"{"score": "seven"}"#, &s);
        assert_eq!(Value::Object(repaired.object), json!({"score": 0}));
    }

    #[test]
    fn quoted_number_is_converted() {
        let s = schema(&[("score", FieldType::NUMBER)]);
        let repaired = repair(r#"{"score": "8"}"#, &s);
        assert_eq!(repaired.object["score"], json!(8));
    }

    #[test]
    fn array_from_stringified_json() {
        let s = schema(&[("codes", FieldType::ArrayOf(ScalarKind::String))]);
        let repaired = repair(r#"{"codes": "[\"a\",\"b\"]"}"#, &s);
        assert_eq!(Value::Object(repaired.object), json!({"codes": ["a", "b"]}));
    }

    #[test]
    fn array_single_element_wrap() {
        let s = schema(&[("codes", FieldType::ArrayOf(ScalarKind::String))]);
        let repaired = repair(r#"{"codes": "just one snippet"}"#, &s);
        assert_eq!(
            Value::Object(repaired.object),
            json!({"codes": ["just one snippet"]})
        );
    }

    #[test]
    fn empty_object_for_array_field_defaults() {
        let s = schema(&[("codes", FieldType::ArrayOf(ScalarKind::String))]);
        let repaired = repair(r#"{"codes": {}}"#, &s);
        assert_eq!(repaired.object["codes"], json!([]));
    }

    #[test]
    fn quote_broken_string_recovered() {
        let s = schema(&[("code", FieldType::STRING), ("explanation", FieldType::STRING)]);
        let raw = r#"{"code": "console.log("hi")", "explanation": "logs "hi""}"#;
        let repaired = repair(raw, &s);
        assert!(!repaired.report.first_pass_parsed);
        assert_eq!(repaired.object["code"], json!("console.log(\"hi\")"));
        assert_eq!(repaired.object["explanation"], json!("logs \"hi\""));
        assert_eq!(
            repaired.report.source("code"),
            Some(&FieldSource::Regex { key: "code".into() })
        );
    }

    #[test]
    fn properly_escaped_quotes_not_rescanned() {
        let s = schema(&[("code", FieldType::STRING)]);
        let repaired = repair(r#"{"code":"say \"hi\""}"#, &s);
        assert_eq!(repaired.object["code"], json!("say \"hi\""));
        assert_eq!(repaired.report.source("code"), Some(&FieldSource::Exact));
    }

    #[test]
    fn quote_broken_index_expression_recovered() {
        let s = schema(&[("code", FieldType::STRING), ("explanation", FieldType::STRING)]);
        let raw = r#"{"code": "x = d["k"] + 1", "explanation": "reads "k" key"}"#;
        let repaired = repair(raw, &s);
        assert_eq!(repaired.object["code"], json!("x = d[\"k\"] + 1"));
        assert_eq!(repaired.object["explanation"], json!("reads \"k\" key"));
    }

    #[test]
    fn alternate_escapes_not_rescanned() {
        let s = schema(&[("code", FieldType::STRING)]);
        let repaired = repair(r#"{"code": "d[\"k\"] \/ 2"}"#, &s);
        assert_eq!(repaired.object["code"], json!("d[\"k\"] / 2"));
        assert_eq!(repaired.report.source("code"), Some(&FieldSource::Exact));
    }

    #[test]
    fn pure_prose_yields_defaults() {
        let s = schema(&[
            ("review", FieldType::STRING),
            ("score", FieldType::NUMBER),
            ("ok", FieldType::BOOLEAN),
            ("codes", FieldType::ArrayOf(ScalarKind::String)),
        ]);
        let repaired = repair("I'm sorry, I can't help with that.", &s);
        assert_eq!(
            Value::Object(repaired.object),
            json!({"review": "", "score": 0, "ok": false, "codes": []})
        );
        assert_eq!(repaired.report.defaulted_fields().count(), 4);
    }

    #[test]
    fn empty_schema_empty_object() {
        let repaired = repair(r#"{"a": 1}"#, &FieldSchema::new());
        assert!(repaired.object.is_empty());
    }

    #[test]
    fn report_requests_state_reset() {
        let s = schema(&[("roast", FieldType::STRING)]);
        let report = repair("", &s).report;
        assert!(report.clear_last_error);
        assert!(report.reset_retries);
        assert!(report.stop_progress);
        assert!(!report.first_pass_parsed);
    }

    #[test]
    fn non_object_first_pass_treated_as_empty() {
        let s = schema(&[("code", FieldType::STRING)]);
        let repaired = repair(r#"["code", "x"]"#, &s);
        assert!(!repaired.report.first_pass_parsed);
        assert_eq!(repaired.object["code"], json!(""));
    }

    #[test]
    fn repair_is_idempotent() {
        let s = schema(&[("code", FieldType::STRING), ("score", FieldType::NUMBER)]);
        let raw = r#"Here: {"code": "a "b" c", "score": 9"#;
        assert_eq!(repair(raw, &s), repair(raw, &s));
    }

    #[test]
    fn described_schema_errors_propagate() {
        assert!(repair_described("{}", "not a schema").is_err());
        let repaired = repair_described(r#"{"roast": "ok"}"#, r#"{"roast": "string"}"#).unwrap();
        assert_eq!(repaired.object["roast"], json!("ok"));
    }
}
