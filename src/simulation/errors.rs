//! Errors for Monte Carlo population simulators.
//!
//! [`SimError`] covers invalid simulation settings, thread-pool construction
//! failures, and model-side errors raised while preparing a simulation
//! (interpolating `u`/`v`, building quantile functions). It converts to a
//! Python `ValueError` when the `python-bindings` feature is enabled.
use crate::ipm::errors::IPMError;
#[cfg(feature = "python-bindings")]
use pyo3::{PyErr, exceptions::PyValueError};

pub type SimResult<T> = Result<T, SimError>;

#[derive(Debug, Clone, PartialEq)]
pub enum SimError {
    /// A structural argument is out of range (zero realizations, zero
    /// initial population, ...).
    InvalidArgument { name: &'static str, reason: &'static str },

    /// A numeric simulation parameter is out of range.
    InvalidParam { name: &'static str, value: f64, reason: &'static str },

    /// The dedicated rayon pool could not be built.
    ThreadPool(String),

    /// Error raised by the model side while preparing the run.
    Model(IPMError),
}

impl From<IPMError> for SimError {
    fn from(err: IPMError) -> Self {
        SimError::Model(err)
    }
}

impl std::error::Error for SimError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SimError::Model(err) => Some(err),
            _ => None,
        }
    }
}

impl std::fmt::Display for SimError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SimError::InvalidArgument { name, reason } => {
                write!(f, "Simulation Error: invalid {name}: {reason}")
            }
            SimError::InvalidParam { name, value, reason } => {
                write!(f, "Simulation Error: invalid {name} = {value}: {reason}")
            }
            SimError::ThreadPool(msg) => {
                write!(f, "Simulation Error: failed to build thread pool: {msg}")
            }
            SimError::Model(err) => write!(f, "Simulation Error: {err}"),
        }
    }
}

#[cfg(feature = "python-bindings")]
impl From<SimError> for PyErr {
    fn from(err: SimError) -> PyErr {
        PyValueError::new_err(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    // Purpose
    // -------
    // Model errors keep their message and are exposed as the error source.
    fn model_errors_wrap_and_expose_source() {
        // Arrange
        let inner = IPMError::DemVarFailed { n_points: 3 };

        // Act
        let err: SimError = inner.clone().into();

        // Assert
        assert!(err.to_string().contains(&inner.to_string()));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn invalid_param_display_includes_value() {
        let err = SimError::InvalidParam { name: "delta_t", value: 2.5, reason: "must be in (0, 1]" };
        let msg = err.to_string();
        assert!(msg.contains("delta_t") && msg.contains("2.5"), "Got: {msg}");
    }
}
