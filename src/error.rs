//! Error types for codemend response handling.

use codemend_recover::RecoverError;

use crate::modes::TaskMode;

/// Top-level error type for task response handling.
#[derive(Debug, thiserror::Error)]
pub enum CodemendError {
    /// The response parsed, but a required field is missing or mistyped.
    ///
    /// Caught by the response pipeline and turned into a repair attempt.
    #[error("invalid response format for {mode} mode: missing or invalid \"{field}\" field")]
    Validation {
        /// Mode whose schema was violated.
        mode: TaskMode,
        /// First offending field.
        field: String,
    },

    /// Extraction or schema error from the recovery core.
    #[error(transparent)]
    Recover(#[from] RecoverError),

    /// Repair could not run. Carries the raw response for display next to
    /// a retry option.
    #[error("failed to recover response: {message}")]
    Unrecoverable {
        /// What went wrong.
        message: String,
        /// The raw model response, shown to the user as-is.
        raw: String,
    },

    /// Configuration error.
    #[error("config error: {0}")]
    Config(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl CodemendError {
    /// The raw model response attached to this error, if any.
    pub fn raw_response(&self) -> Option<&str> {
        match self {
            Self::Unrecoverable { raw, .. } => Some(raw),
            Self::Recover(e) => e.raw_response(),
            _ => None,
        }
    }
}

/// Convenience result type.
pub type Result<T> = std::result::Result<T, CodemendError>;
