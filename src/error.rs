//! Error types for the financial model

use thiserror::Error;

/// Errors raised by the calculation engine and assumption validation.
///
/// An unreachable break-even is not an error: it is reported as
/// `f64::INFINITY` on [`crate::models::BreakevenResult`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ModelError {
    #[error("division by zero: {field} must be greater than zero")]
    DivisionByZero { field: &'static str },

    #[error("invalid assumption {field}: {reason}")]
    InvalidAssumption { field: &'static str, reason: String },
}

impl ModelError {
    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        ModelError::InvalidAssumption {
            field,
            reason: reason.into(),
        }
    }
}

pub type ModelResult<T> = std::result::Result<T, ModelError>;
