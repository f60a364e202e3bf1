//! # codemend-recover
//!
//! Recovery of structured JSON from malformed LLM responses.
//!
//! Two components, used in sequence whenever a response is consumed:
//!
//! - **Extractor** ([`extract()`]): finds and parses the most plausible JSON
//!   value in arbitrary text (strict parse, longest balanced fragment,
//!   fenced ```` ```json ```` block).
//! - **Repair engine** ([`repair()`]): given text and a [`FieldSchema`],
//!   rebuilds an object with exactly the schema's keys, each of the declared
//!   type, using the extractor as a first pass and falling back to fuzzy key
//!   matching and targeted scanning of the raw text.
//!
//! Both are pure and synchronous. Repeated calls with the same input give
//! the same output.

pub mod coerce;
pub mod config;
pub mod error;
pub mod extract;
pub mod fuzzy;
pub mod repair;
pub mod scan;
pub mod schema;
pub mod types;

pub use config::RepairConfig;
pub use error::{RecoverError, Result};
pub use extract::extract;
pub use repair::{repair, repair_described, repair_with_config};
pub use schema::{describe_schema, parse_schema};
pub use types::{
    FieldSchema, FieldSource, FieldType, RecoveredObject, RepairReport, Repaired, ScalarKind,
};
