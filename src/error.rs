//! Error types for the surge pipeline.
//!
//! Upstream fetch failures are deliberately *not* represented here: a failing
//! provider degrades to an empty list inside `ingest` and never aborts scoring.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SurgeError {
    /// A required input is absent or malformed. `field` is a dotted path into
    /// the payload, e.g. `seasonality.is_peak_season` or `events[2].name`.
    #[error("missing or invalid required field: {field}")]
    Validation { field: String },

    /// A field is present but its value is out of range, e.g. a stay whose
    /// `check_out` precedes `check_in`.
    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },

    /// Degenerate numeric input such as a non-positive baseline price.
    #[error("surge computation failed: {0}")]
    Computation(String),
}

impl SurgeError {
    pub fn missing(field: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
        }
    }

    pub fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Payload path of the offending field, for validation errors.
    pub fn field(&self) -> Option<&str> {
        match self {
            Self::Validation { field } | Self::InvalidValue { field, .. } => Some(field.as_str()),
            Self::Computation(_) => None,
        }
    }

    /// Stable machine-readable code used in structured tool errors.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation { .. } | Self::InvalidValue { .. } => "VALIDATION_ERROR",
            Self::Computation(_) => "COMPUTATION_ERROR",
        }
    }
}

pub type Result<T> = std::result::Result<T, SurgeError>;
