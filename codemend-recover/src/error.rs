//! Error types for the codemend-recover crate.
//!
//! Extraction failures keep the raw model response so callers can show it
//! to the user or hand it to the repair engine. Schema errors indicate a bug
//! in the calling code, never a bad model response.

/// Errors that can occur while recovering structured output.
#[derive(Debug, thiserror::Error)]
pub enum RecoverError {
    /// No parseable JSON value was found by any extraction strategy.
    #[error("response did not contain a valid JSON value")]
    Extraction {
        /// The raw response text, kept for diagnostic display.
        raw: String,
    },

    /// The schema description handed to the repair engine could not be parsed.
    #[error("schema error: {0}")]
    Schema(String),

    /// Invalid repair configuration.
    #[error("config error: {0}")]
    Config(String),
}

impl RecoverError {
    /// Returns the raw response text carried by an extraction failure.
    pub fn raw_response(&self) -> Option<&str> {
        match self {
            Self::Extraction { raw } => Some(raw),
            Self::Schema(_) | Self::Config(_) => None,
        }
    }

    /// Whether the caller can recover by running the repair engine.
    ///
    /// Schema and config errors are programming errors and must propagate.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Extraction { .. })
    }
}

/// Convenience type alias for codemend-recover results.
pub type Result<T> = std::result::Result<T, RecoverError>;
