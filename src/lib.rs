//! Codemend: response handling for a code assistant.
//!
//! Each task mode (generate, review, debug, ...) asks the model for a JSON
//! object with a fixed set of fields. This crate builds those schemas and
//! validates responses against them. Responses that fail are handed to the
//! recovery core in [`codemend_recover`]:
//! raw text → extract → validate → repair → render
//!
//! # Architecture
//!
//! - **Modes**: task modes and the per-request response schema
//! - **Response**: the extract/validate/repair pipeline and request UI state
//! - **Config**: TOML configuration for repair thresholds and logging

pub mod config;
pub mod error;
pub mod modes;
pub mod response;

pub use codemend_recover::{FieldSchema, FieldType, RepairConfig, RepairReport};
pub use config::AppConfig;
pub use error::{CodemendError, Result};
pub use modes::{TaskMode, TaskOptions};
pub use response::{RequestState, ResponseHandler, TaskResponse};
