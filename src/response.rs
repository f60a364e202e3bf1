//! Response pipeline for task handlers: extract, validate, repair.
//!
//! A model response is first run through the extractor and checked against
//! the mode's required fields. Any extraction or validation failure is
//! turned into a repair attempt; the repaired object is accepted as-is.
//! The caller owns a [`RequestState`] that the pipeline updates the way the
//! UI expects (a "fixing" message while repairing, cleared on success).

use codemend_recover::{
    FieldSchema, RecoverError, RecoveredObject, RepairReport, extract, parse_schema,
    repair_with_config,
};
use serde_json::Value;
use tracing::{debug, error, info, warn};

use crate::config::AppConfig;
use crate::error::{CodemendError, Result};
use crate::modes::{TaskMode, TaskOptions, required_fields, response_schema};

/// Message shown while a malformed response is being repaired.
pub const FIXING_MESSAGE: &str = "Fixing malformed JSON...";

/// Request-scoped UI feedback state, owned by the caller.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestState {
    /// Message describing the most recent failure, if any.
    pub last_error: Option<String>,
    /// How many times the request has been retried.
    pub retries: u32,
    /// Whether a progress indicator is running.
    pub progress_active: bool,
}

impl RequestState {
    /// Mark a request as in flight.
    pub fn begin(&mut self) {
        self.progress_active = true;
    }

    /// Record a failed attempt that will be retried.
    pub fn record_retry(&mut self, message: impl Into<String>) {
        self.retries += 1;
        self.last_error = Some(message.into());
    }

    /// Apply the state effects of a completed repair.
    pub fn apply_repair(&mut self, report: &RepairReport) {
        if report.clear_last_error {
            self.last_error = None;
        }
        if report.reset_retries {
            self.retries = 0;
        }
        if report.stop_progress {
            self.progress_active = false;
        }
    }
}

/// A task response ready for rendering.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskResponse {
    /// Response fields. Repaired responses carry exactly the schema's keys.
    pub fields: RecoveredObject,
    /// Whether the repair engine produced `fields`.
    pub recovered: bool,
    /// Repair diagnostics, present when `recovered` is true.
    pub report: Option<RepairReport>,
}

/// Parses and, when necessary, repairs responses for one task mode.
#[derive(Debug, Clone)]
pub struct ResponseHandler {
    mode: TaskMode,
    options: TaskOptions,
    schema: FieldSchema,
    config: AppConfig,
}

impl ResponseHandler {
    /// Create a handler for `mode` with the schema implied by `options`.
    pub fn new(mode: TaskMode, options: TaskOptions, config: AppConfig) -> Self {
        Self {
            mode,
            options,
            schema: response_schema(mode, &options),
            config,
        }
    }

    /// The task mode this handler serves.
    pub fn mode(&self) -> TaskMode {
        self.mode
    }

    /// The response schema used for repair.
    pub fn schema(&self) -> &FieldSchema {
        &self.schema
    }

    /// Turn a raw model response into renderable fields.
    ///
    /// Responses that extract and validate cleanly are returned untouched.
    /// Otherwise the response is repaired against the mode's schema and
    /// `state` is updated from the repair report.
    ///
    /// # Errors
    ///
    /// Extractor errors that repair cannot help with are returned as-is.
    /// Malformed responses never fail; they are repaired.
    pub fn handle(&self, raw: &str, state: &mut RequestState) -> Result<TaskResponse> {
        let failure = match extract(raw) {
            Ok(value) => match validate(self.mode, &self.options, value) {
                Ok(fields) => {
                    debug!(mode = %self.mode, "response validated");
                    return Ok(TaskResponse {
                        fields,
                        recovered: false,
                        report: None,
                    });
                }
                Err(e) => e,
            },
            Err(e) if e.is_recoverable() => CodemendError::from(e),
            Err(e) => return Err(e.into()),
        };

        warn!(mode = %self.mode, "response rejected, attempting repair: {failure}");
        state.last_error = Some(FIXING_MESSAGE.to_owned());
        Ok(self.repair(raw, state))
    }

    fn repair(&self, raw: &str, state: &mut RequestState) -> TaskResponse {
        let repaired = repair_with_config(raw, &self.schema, &self.config.repair);
        state.apply_repair(&repaired.report);

        let defaulted: Vec<&str> = repaired.report.defaulted_fields().collect();
        if defaulted.is_empty() {
            info!(mode = %self.mode, "response repaired");
        } else {
            info!(mode = %self.mode, ?defaulted, "response repaired with defaults");
        }

        TaskResponse {
            fields: repaired.object,
            recovered: true,
            report: Some(repaired.report),
        }
    }
}

/// Check that `value` is an object carrying every required field of `mode`.
///
/// # Errors
///
/// Returns [`CodemendError::Validation`] naming the first missing or
/// mistyped field.
pub fn validate(mode: TaskMode, options: &TaskOptions, value: Value) -> Result<RecoveredObject> {
    let required = required_fields(mode, options);
    let Value::Object(map) = value else {
        let field = required
            .into_iter()
            .next()
            .map(|(field, _)| field)
            .unwrap_or_default();
        return Err(CodemendError::Validation { mode, field });
    };
    for (field, ty) in required {
        if !map.get(&field).is_some_and(|v| ty.matches(v)) {
            return Err(CodemendError::Validation { mode, field });
        }
    }
    Ok(map)
}

/// Repair `raw` against a caller-supplied schema description.
///
/// Used when a handler builds its schema as text (as prompt templates do).
///
/// # Errors
///
/// Returns [`CodemendError::Unrecoverable`] carrying `raw` if the description
/// cannot be parsed. That is a bug in the caller; it is logged and the user
/// should be offered a full retry rather than another repair.
pub fn recover_with_description(
    raw: &str,
    description: &str,
    config: &AppConfig,
    state: &mut RequestState,
) -> Result<TaskResponse> {
    let schema = parse_schema(description).map_err(|e| unrecoverable(e, raw))?;
    let repaired = repair_with_config(raw, &schema, &config.repair);
    state.apply_repair(&repaired.report);
    Ok(TaskResponse {
        fields: repaired.object,
        recovered: true,
        report: Some(repaired.report),
    })
}

fn unrecoverable(e: RecoverError, raw: &str) -> CodemendError {
    error!("response repair aborted: {e}");
    CodemendError::Unrecoverable {
        message: e.to_string(),
        raw: raw.to_owned(),
    }
}
