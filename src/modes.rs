//! Task modes and the response schema each one expects from the model.
//!
//! The schema is built per request: optional fields (explanation, reasoning)
//! are only present when the user asked for them.

use codemend_recover::{FieldSchema, FieldType, ScalarKind, describe_schema};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A code task the assistant can perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskMode {
    /// Write new code from a description.
    Generator,
    /// Explain what existing code does.
    Explainer,
    /// Review code, score it, and propose an improved version.
    Reviewer,
    /// Add comments to code.
    Commenter,
    /// Translate code to another language.
    Converter,
    /// Rewrite code for performance.
    Optimizer,
    /// Find bugs and produce a fixed version.
    Debugger,
    /// Humorous, harsh critique.
    Roaster,
}

impl TaskMode {
    /// Returns the lowercase mode name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Generator => "generator",
            Self::Explainer => "explainer",
            Self::Reviewer => "reviewer",
            Self::Commenter => "commenter",
            Self::Converter => "converter",
            Self::Optimizer => "optimizer",
            Self::Debugger => "debugger",
            Self::Roaster => "roaster",
        }
    }

    /// Returns all modes.
    pub fn all() -> &'static [TaskMode] {
        &[
            Self::Generator,
            Self::Explainer,
            Self::Reviewer,
            Self::Commenter,
            Self::Converter,
            Self::Optimizer,
            Self::Debugger,
            Self::Roaster,
        ]
    }

    /// Whether the mode offers an optional explanation field.
    pub fn supports_explanation(&self) -> bool {
        matches!(self, Self::Generator | Self::Converter)
    }
}

impl fmt::Display for TaskMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for TaskMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Self::all()
            .iter()
            .copied()
            .find(|mode| mode.name() == wanted)
            .ok_or_else(|| format!("unknown task mode: {s:?}"))
    }
}

/// Per-request options that change the response shape.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TaskOptions {
    /// Generator only: ask for several alternative snippets.
    pub multiple: bool,
    /// Generator/converter only: ask for an explanation alongside the code.
    pub include_explanation: bool,
    /// Ask the model to show its reasoning first.
    pub include_reasoning: bool,
}

/// Field name for the optional reasoning text.
pub const REASONING_FIELD: &str = "reasoning";

/// Field name for the optional explanation text.
pub const EXPLANATION_FIELD: &str = "explanation";

/// Build the response schema for `mode` under `options`.
///
/// `reasoning` comes first so models write it before the answer.
pub fn response_schema(mode: TaskMode, options: &TaskOptions) -> FieldSchema {
    let mut schema = FieldSchema::new();
    if options.include_reasoning {
        schema.insert(REASONING_FIELD, FieldType::STRING);
    }

    match mode {
        TaskMode::Generator => {
            if options.multiple {
                schema.insert("codes", FieldType::ArrayOf(ScalarKind::String));
            } else {
                schema.insert("code", FieldType::STRING);
            }
        }
        TaskMode::Explainer => schema.insert(EXPLANATION_FIELD, FieldType::STRING),
        TaskMode::Reviewer => {
            schema.insert("review", FieldType::STRING);
            schema.insert("score", FieldType::NUMBER);
            schema.insert("improved_code", FieldType::STRING);
        }
        TaskMode::Commenter => {
            schema.insert("commentedCode", FieldType::STRING);
            schema.insert("summary", FieldType::STRING);
        }
        TaskMode::Converter => schema.insert("code", FieldType::STRING),
        TaskMode::Optimizer => {
            schema.insert("optimizedCode", FieldType::STRING);
            schema.insert("summary", FieldType::STRING);
        }
        TaskMode::Debugger => {
            schema.insert("debugReport", FieldType::STRING);
            schema.insert("fixedCode", FieldType::STRING);
        }
        TaskMode::Roaster => schema.insert("roast", FieldType::STRING),
    }

    if options.include_explanation && mode.supports_explanation() {
        schema.insert(EXPLANATION_FIELD, FieldType::STRING);
    }
    schema
}

/// Fields a response must carry, with the right type, to skip repair.
///
/// Optional reasoning and explanation text are never required.
pub fn required_fields(mode: TaskMode, options: &TaskOptions) -> Vec<(String, FieldType)> {
    response_schema(mode, options)
        .iter()
        .filter(|(name, _)| {
            *name != REASONING_FIELD && !(*name == EXPLANATION_FIELD && mode.supports_explanation())
        })
        .map(|(name, ty)| (name.to_owned(), ty))
        .collect()
}

/// The schema for `mode` in the JSON description form used in prompts and
/// by [`codemend_recover::repair_described`].
pub fn schema_description(mode: TaskMode, options: &TaskOptions) -> String {
    describe_schema(&response_schema(mode, options))
}
