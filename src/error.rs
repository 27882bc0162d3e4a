//! Custom error types for bankflow
//!
//! This module defines the error hierarchy for the workflow engine using
//! thiserror for ergonomic error definitions.

use thiserror::Error;

use crate::workflow::submission::SubmissionPhase;
use crate::workflow::validation::ValidationErrors;

/// The main error type for bankflow operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FlowError {
    /// Field-level validation failures for a step's input
    #[error("Validation error: {0}")]
    Validation(ValidationErrors),

    /// A transition was attempted out of order (e.g. advancing past an
    /// incomplete step, or submitting a step that is not current)
    #[error("Out-of-order transition in {operation}: {reason}")]
    OutOfOrderTransition {
        operation: &'static str,
        reason: String,
    },

    /// The referenced step does not exist
    #[error("Unknown step: {0}")]
    UnknownStep(String),

    /// An external side effect (invitation, commit) reported failure
    #[error("Side effect failed: {0}")]
    SideEffectFailure(String),

    /// A submission operation was called in a phase that does not allow it
    #[error("Cannot {operation} while submission is in {phase} phase")]
    InvalidPhase {
        operation: &'static str,
        phase: SubmissionPhase,
    },

    /// Malformed step registry or field mapping
    #[error("Registry error: {0}")]
    Registry(String),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// File I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(String),
}

impl FlowError {
    /// Create an out-of-order transition error
    pub fn out_of_order(operation: &'static str, reason: impl Into<String>) -> Self {
        Self::OutOfOrderTransition {
            operation,
            reason: reason.into(),
        }
    }

    /// Create an unknown step error for an index
    pub fn unknown_index(index: usize, len: usize) -> Self {
        Self::UnknownStep(format!("index {} (workflow has {} steps)", index, len))
    }

    /// Check if this is a validation error
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Check if this is an out-of-order transition
    pub fn is_out_of_order(&self) -> bool {
        matches!(self, Self::OutOfOrderTransition { .. })
    }

    /// Check if this is a side-effect failure
    pub fn is_side_effect_failure(&self) -> bool {
        matches!(self, Self::SideEffectFailure(_))
    }

    /// Field errors carried by a validation failure
    pub fn validation_errors(&self) -> Option<&ValidationErrors> {
        match self {
            Self::Validation(errors) => Some(errors),
            _ => None,
        }
    }
}

impl From<ValidationErrors> for FlowError {
    fn from(errors: ValidationErrors) -> Self {
        Self::Validation(errors)
    }
}

impl From<std::io::Error> for FlowError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<serde_json::Error> for FlowError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err.to_string())
    }
}

/// Result type alias for bankflow operations
pub type FlowResult<T> = Result<T, FlowError>;
