//! Core types for field schemas and repair results.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

use crate::error::RecoverError;

/// A primitive JSON type a schema field (or array element) may declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScalarKind {
    /// JSON string.
    String,
    /// JSON number.
    Number,
    /// JSON boolean.
    Boolean,
}

impl ScalarKind {
    /// Returns the type hint used in schema descriptions.
    pub fn name(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Number => "number",
            Self::Boolean => "boolean",
        }
    }

    /// Whether `value` already has this runtime type.
    pub fn matches(&self, value: &Value) -> bool {
        match self {
            Self::String => value.is_string(),
            Self::Number => value.is_number(),
            Self::Boolean => value.is_boolean(),
        }
    }

    /// The value substituted when nothing of this type could be recovered.
    pub fn default_value(&self) -> Value {
        match self {
            Self::String => Value::String(String::new()),
            Self::Number => Value::from(0),
            Self::Boolean => Value::Bool(false),
        }
    }
}

impl fmt::Display for ScalarKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ScalarKind {
    type Err = RecoverError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "string" => Ok(Self::String),
            "number" => Ok(Self::Number),
            "boolean" => Ok(Self::Boolean),
            other => Err(RecoverError::Schema(format!("unknown type hint: {other:?}"))),
        }
    }
}

/// The declared type of a schema field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldType {
    /// A single primitive value.
    Scalar(ScalarKind),
    /// An array whose elements are all of one primitive type.
    ArrayOf(ScalarKind),
}

impl FieldType {
    /// Shorthand for `Scalar(ScalarKind::String)`.
    pub const STRING: Self = Self::Scalar(ScalarKind::String);
    /// Shorthand for `Scalar(ScalarKind::Number)`.
    pub const NUMBER: Self = Self::Scalar(ScalarKind::Number);
    /// Shorthand for `Scalar(ScalarKind::Boolean)`.
    pub const BOOLEAN: Self = Self::Scalar(ScalarKind::Boolean);

    /// Whether `value` has this field's top-level runtime type.
    ///
    /// Array element types are not inspected; coercion handles those.
    pub fn matches(&self, value: &Value) -> bool {
        match self {
            Self::Scalar(kind) => kind.matches(value),
            Self::ArrayOf(_) => value.is_array(),
        }
    }

    /// The value substituted when nothing of this type could be recovered.
    pub fn default_value(&self) -> Value {
        match self {
            Self::Scalar(kind) => kind.default_value(),
            Self::ArrayOf(_) => Value::Array(Vec::new()),
        }
    }

    /// Renders the type hint used in schema descriptions, e.g. `string` or `["string"]`.
    pub fn hint(&self) -> String {
        match self {
            Self::Scalar(kind) => kind.name().to_owned(),
            Self::ArrayOf(kind) => format!("[\"{}\"]", kind.name()),
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Scalar(kind) => write!(f, "{kind}"),
            Self::ArrayOf(kind) => write!(f, "array of {kind}"),
        }
    }
}

/// Ordered mapping from field name to declared type.
///
/// Field names are case-sensitive. Order is the order fields are resolved
/// during repair and the key order of the recovered object.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldSchema {
    fields: Vec<(String, FieldType)>,
}

impl FieldSchema {
    /// Create an empty schema.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`FieldSchema::insert`].
    #[must_use]
    pub fn with_field(mut self, name: impl Into<String>, ty: FieldType) -> Self {
        self.insert(name, ty);
        self
    }

    /// Add a field, or retype it in place if the name is already present.
    pub fn insert(&mut self, name: impl Into<String>, ty: FieldType) {
        let name = name.into();
        if let Some(slot) = self.fields.iter_mut().find(|(n, _)| *n == name) {
            slot.1 = ty;
        } else {
            self.fields.push((name, ty));
        }
    }

    /// Declared type of `name`, if present.
    pub fn get(&self, name: &str) -> Option<FieldType> {
        self.fields
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, ty)| *ty)
    }

    /// Fields in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, FieldType)> {
        self.fields.iter().map(|(n, ty)| (n.as_str(), *ty))
    }

    /// Field names in declaration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(n, _)| n.as_str())
    }

    /// Number of declared fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether the schema declares no fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// A repaired object: exactly the schema's keys, in schema order.
pub type RecoveredObject = Map<String, Value>;

/// Where a recovered field's value came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum FieldSource {
    /// The first-pass object had the exact key.
    Exact,
    /// A misspelled key in the first-pass object was accepted.
    Fuzzy {
        /// The key actually present in the response.
        key: String,
        /// Case-insensitive edit distance to the expected name.
        distance: usize,
    },
    /// The value was scanned out of the raw text.
    Regex {
        /// The key name the pattern was built on.
        key: String,
    },
    /// Nothing usable was found; the type default was substituted.
    Default,
}

/// Diagnostics and caller-state effects of a completed repair.
///
/// The repair engine never touches shared state. Instead the report says
/// which pieces of the caller's request state a successful repair should
/// reset, and the caller applies them to its own state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RepairReport {
    /// Provenance of each field, in schema order.
    pub sources: Vec<(String, FieldSource)>,
    /// Whether the extractor produced an object for the first pass.
    pub first_pass_parsed: bool,
    /// The caller should drop any pending "last error" message.
    pub clear_last_error: bool,
    /// The caller should reset its retry counter.
    pub reset_retries: bool,
    /// The caller should stop its progress indicator.
    pub stop_progress: bool,
}

impl RepairReport {
    /// Provenance of a single field.
    pub fn source(&self, field: &str) -> Option<&FieldSource> {
        self.sources
            .iter()
            .find(|(name, _)| name == field)
            .map(|(_, source)| source)
    }

    /// Fields that fell back to their type default.
    pub fn defaulted_fields(&self) -> impl Iterator<Item = &str> {
        self.sources
            .iter()
            .filter(|(_, source)| *source == FieldSource::Default)
            .map(|(name, _)| name.as_str())
    }
}

/// Output of the repair engine.
#[derive(Debug, Clone, PartialEq)]
pub struct Repaired {
    /// The schema-conforming object.
    pub object: RecoveredObject,
    /// How each field was recovered.
    pub report: RepairReport,
}
