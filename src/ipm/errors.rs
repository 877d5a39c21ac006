//! Errors for integral projection models (grid/parameter validation,
//! table interpolation, power iteration, and demographic variance).
//!
//! This module defines [`IPMError`], the single error type shared by the
//! model-side subtree (`ipm::core`, `ipm::kernel`, `ipm::eigen`,
//! `ipm::demvar`, `ipm::analysis`), together with the [`IPMResult`] alias.
//! It implements `Display`/`Error` and converts to `PyErr` when the
//! `python-bindings` feature is enabled.
//!
//! ## Conventions
//! - **Indices are 0-based** (match Rust/NumPy).
//! - Out-of-range *states* and kernel entries are clamped, never reported:
//!   errors are reserved for malformed configuration and numerical failure.
//! - Power iteration is bounded; running out of iterations is reported as
//!   [`IPMError::NoConvergence`] with the last ratio so callers can inspect
//!   how close the iterate came.
#[cfg(feature = "python-bindings")]
use pyo3::{PyErr, exceptions::PyValueError};

/// Crate-wide result alias for IPM operations that may produce [`IPMError`].
pub type IPMResult<T> = Result<T, IPMError>;

/// Unified error type for IPM construction and analysis.
#[derive(Debug, Clone, PartialEq)]
pub enum IPMError {
    // ---- Grid / parameter validation ----
    /// Grid bounds must be finite with `lower < upper` and at least 2 points.
    InvalidGrid { lower: f64, upper: f64, n: usize, reason: &'static str },

    /// A scalar model or option parameter is out of its admissible domain.
    InvalidParam { name: &'static str, value: f64, reason: &'static str },

    /// Two inputs that must share a length (or a square matrix) do not.
    LengthMismatch { expected: usize, actual: usize },

    /// A vector or matrix input holds NaN/±inf.
    NonFiniteValue { index: usize, value: f64 },

    // ---- Interpolation ----
    /// Table abscissae must be finite and strictly increasing.
    InvalidTable { index: usize, reason: &'static str },

    // ---- Power iteration ----
    /// Iteration cap reached before successive ratios agreed within tolerance.
    NoConvergence { iterations: usize, last_ratio: f64 },

    /// The iterate sum collapsed to zero or became non-finite.
    DegenerateIterate { iteration: usize, sum: f64 },

    // ---- Demographic variance ----
    /// Every grid point contribution failed; no aggregate can be formed.
    DemVarFailed { n_points: usize },
}

impl std::error::Error for IPMError {}

impl std::fmt::Display for IPMError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            // ---- Grid / parameter validation ----
            IPMError::InvalidGrid { lower, upper, n, reason } => {
                write!(f, "Invalid state grid [{lower}, {upper}] with n = {n}: {reason}")
            }
            IPMError::InvalidParam { name, value, reason } => {
                write!(f, "Invalid parameter {name} = {value}: {reason}")
            }
            IPMError::LengthMismatch { expected, actual } => {
                write!(f, "Length mismatch: expected {expected}, got {actual}.")
            }
            IPMError::NonFiniteValue { index, value } => {
                write!(f, "Value at index {index} is non-finite: {value}")
            }
            // ---- Interpolation ----
            IPMError::InvalidTable { index, reason } => {
                write!(f, "Invalid interpolation table at index {index}: {reason}")
            }
            // ---- Power iteration ----
            IPMError::NoConvergence { iterations, last_ratio } => {
                write!(
                    f,
                    "Power iteration did not converge after {iterations} iterations (last ratio {last_ratio})."
                )
            }
            IPMError::DegenerateIterate { iteration, sum } => {
                write!(f, "Power iterate degenerated at iteration {iteration} (sum = {sum}).")
            }
            // ---- Demographic variance ----
            IPMError::DemVarFailed { n_points } => {
                write!(f, "Demographic variance failed at all {n_points} grid points.")
            }
        }
    }
}

#[cfg(feature = "python-bindings")]
impl From<IPMError> for PyErr {
    fn from(err: IPMError) -> PyErr {
        PyValueError::new_err(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    // Purpose
    // -------
    // Verify that `NoConvergence` reports both the iteration count and the
    // last ratio in its `Display` message.
    fn no_convergence_display_includes_payload() {
        // Arrange
        let err = IPMError::NoConvergence { iterations: 250, last_ratio: 1.0625 };

        // Act
        let msg = err.to_string();

        // Assert
        assert!(msg.contains("250"), "message should include iterations.\nGot: {msg}");
        assert!(msg.contains("1.0625"), "message should include the last ratio.\nGot: {msg}");
    }

    #[test]
    // Purpose
    // -------
    // Verify that `InvalidGrid` embeds the bounds and the reason.
    fn invalid_grid_display_includes_bounds_and_reason() {
        // Arrange
        let err = IPMError::InvalidGrid { lower: 5.0, upper: 1.0, n: 10, reason: "lower < upper" };

        // Act
        let msg = err.to_string();

        // Assert
        assert!(msg.contains("[5, 1]"), "Got: {msg}");
        assert!(msg.contains("lower < upper"), "Got: {msg}");
    }
}
