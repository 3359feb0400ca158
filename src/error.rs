//! Error types.
//!
//! Two layers:
//!
//! - [`FairnessError`]: the taxonomy raised by the normalizer and the threshold
//!   engine. Library callers match on it.
//! - [`AppError`]: what the binary reports. It carries the process exit code and
//!   a user-facing message; every `FairnessError` converts into one.

use thiserror::Error;

/// Errors raised by the cohort normalizer and the threshold engine.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FairnessError {
    /// A required column is absent from the input table.
    #[error("schema error: missing required column `{missing}` (columns present: {})", present.join(", "))]
    Schema { missing: String, present: Vec<String> },

    /// The target approval rate is outside `[0, 1]`.
    #[error("config error: approval rate must be between 0 and 1, got {rate}")]
    Config { rate: f64 },

    /// A cohort member carries a missing or non-numeric risk value.
    #[error("data error: invalid risk data in cohort '{cohort}': {detail}")]
    Data { cohort: String, detail: String },
}

impl FairnessError {
    /// Exit code used by the binary for this error kind.
    pub fn exit_code(&self) -> u8 {
        match self {
            FairnessError::Schema { .. } | FairnessError::Config { .. } => 2,
            FairnessError::Data { .. } => 3,
        }
    }
}

#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }
}

impl From<FairnessError> for AppError {
    fn from(err: FairnessError) -> Self {
        AppError::new(err.exit_code(), err.to_string())
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}
