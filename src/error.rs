//! Error taxonomy for the dynamics engine.
//!
//! Every engine failure is local and surfaced as a distinct value. The only
//! silent corrections anywhere in the crate are the clamping of state to its
//! floor after each step and the flooring of the final Lyapunov separation.

use thiserror::Error;

/// Crate-wide result alias
pub type Result<T> = std::result::Result<T, DynamicsError>;

#[derive(Debug, Error)]
pub enum DynamicsError {
    /// A parameter is outside its admissible range
    #[error("invalid parameter `{name}` = {value}: {reason}")]
    InvalidParameter {
        name: &'static str,
        value: f64,
        reason: &'static str,
    },

    /// A numerical estimate is undefined (non-finite exponent, empty sweep, ...)
    #[error("numerically degenerate result: {0}")]
    NumericDegenerate(String),

    /// A configuration document is structurally wrong
    #[error("configuration error: {0}")]
    Config(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl DynamicsError {
    pub(crate) fn invalid(name: &'static str, value: f64, reason: &'static str) -> Self {
        Self::InvalidParameter { name, value, reason }
    }
}

/// Reject anything that is not a finite, strictly positive value.
pub(crate) fn ensure_positive(name: &'static str, value: f64) -> Result<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(DynamicsError::invalid(name, value, "must be finite and > 0"))
    }
}

/// Reject negative or non-finite values; zero is allowed.
pub(crate) fn ensure_non_negative(name: &'static str, value: f64) -> Result<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(DynamicsError::invalid(name, value, "must be finite and >= 0"))
    }
}

pub(crate) fn ensure_finite(name: &'static str, value: f64) -> Result<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(DynamicsError::invalid(name, value, "must be finite"))
    }
}
