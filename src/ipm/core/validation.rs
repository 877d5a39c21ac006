//! IPM validation helpers — reusable checks for grids, scalars, and vectors.
//!
//! Purpose
//! -------
//! Centralize the small input guards used across the IPM stack so that
//! constructors (`StateGrid`, `SizeStructuredModel`, `PowerOptions`,
//! `TableFunction`) and analysis entry points fail fast with structured
//! [`IPMError`] values instead of propagating NaNs through a kernel.
//!
//! Invariants & assumptions
//! ------------------------
//! - Grid bounds are finite with `lower < upper`; grids have at least two
//!   points so that `dx = (upper - lower)/(n - 1)` is defined and positive.
//! - Standard deviations and tolerances are finite and strictly positive.
//! - Vectors handed to the eigen/demvar routines are finite and, where
//!   documented, non-negative.
//!
//! Conventions
//! -----------
//! - Every helper returns [`IPMResult`] and never panics on invalid input.
//! - Helpers that accept a value return it on success so call sites can write
//!   `let sd = validate_positive("growth_sd", sd)?;`.
use crate::ipm::errors::{IPMError, IPMResult};
use ndarray::{ArrayView1, ArrayView2};

/// Validate grid bounds and resolution.
///
/// # Errors
/// [`IPMError::InvalidGrid`] when a bound is non-finite, `lower >= upper`,
/// or `n < 2`.
pub fn validate_grid(lower: f64, upper: f64, n: usize) -> IPMResult<()> {
    if !lower.is_finite() || !upper.is_finite() {
        return Err(IPMError::InvalidGrid { lower, upper, n, reason: "bounds must be finite" });
    }
    if lower >= upper {
        return Err(IPMError::InvalidGrid { lower, upper, n, reason: "lower must be < upper" });
    }
    if n < 2 {
        return Err(IPMError::InvalidGrid { lower, upper, n, reason: "need at least 2 points" });
    }
    Ok(())
}

/// Require a finite scalar.
pub fn validate_finite(name: &'static str, value: f64) -> IPMResult<f64> {
    if !value.is_finite() {
        return Err(IPMError::InvalidParam { name, value, reason: "must be finite" });
    }
    Ok(value)
}

/// Require a finite, strictly positive scalar.
pub fn validate_positive(name: &'static str, value: f64) -> IPMResult<f64> {
    let value = validate_finite(name, value)?;
    if value <= 0.0 {
        return Err(IPMError::InvalidParam { name, value, reason: "must be > 0" });
    }
    Ok(value)
}

/// Require a finite, non-negative scalar.
pub fn validate_non_negative(name: &'static str, value: f64) -> IPMResult<f64> {
    let value = validate_finite(name, value)?;
    if value < 0.0 {
        return Err(IPMError::InvalidParam { name, value, reason: "must be >= 0" });
    }
    Ok(value)
}

/// Require a vector of the expected length with finite entries.
///
/// # Errors
/// - [`IPMError::LengthMismatch`] if `values.len() != expected`.
/// - [`IPMError::NonFiniteValue`] at the first NaN/±inf entry.
pub fn validate_vector(values: ArrayView1<'_, f64>, expected: usize) -> IPMResult<()> {
    if values.len() != expected {
        return Err(IPMError::LengthMismatch { expected, actual: values.len() });
    }
    for (index, &value) in values.iter().enumerate() {
        if !value.is_finite() {
            return Err(IPMError::NonFiniteValue { index, value });
        }
    }
    Ok(())
}

/// Require a square, finite matrix and return its dimension.
///
/// Non-finite entries are reported by their row-major flat index.
pub fn validate_square(matrix: ArrayView2<'_, f64>) -> IPMResult<usize> {
    let (rows, cols) = matrix.dim();
    if rows != cols {
        return Err(IPMError::LengthMismatch { expected: rows, actual: cols });
    }
    if rows == 0 {
        return Err(IPMError::LengthMismatch { expected: 1, actual: 0 });
    }
    for (index, &value) in matrix.iter().enumerate() {
        if !value.is_finite() {
            return Err(IPMError::NonFiniteValue { index, value });
        }
    }
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{array, Array2};

    #[test]
    // Purpose
    // -------
    // Exercise every rejection branch of `validate_grid` plus the success path.
    fn validate_grid_rejects_bad_bounds_and_sizes() {
        // Arrange / Act / Assert
        assert!(validate_grid(0.0, 20.0, 200).is_ok());
        assert!(matches!(validate_grid(f64::NAN, 1.0, 10), Err(IPMError::InvalidGrid { .. })));
        assert!(matches!(validate_grid(1.0, 1.0, 10), Err(IPMError::InvalidGrid { .. })));
        assert!(matches!(validate_grid(0.0, 1.0, 1), Err(IPMError::InvalidGrid { .. })));
    }

    #[test]
    // Purpose
    // -------
    // Ensure scalar guards pass valid values through and reject invalid ones
    // with the parameter name attached.
    fn scalar_guards_return_value_or_named_error() {
        // Arrange / Act
        let ok = validate_positive("sd", 0.5);
        let zero = validate_positive("sd", 0.0);
        let negative = validate_non_negative("var", -1.0);

        // Assert
        assert_eq!(ok, Ok(0.5));
        assert!(matches!(zero, Err(IPMError::InvalidParam { name: "sd", .. })));
        assert!(matches!(negative, Err(IPMError::InvalidParam { name: "var", .. })));
        assert_eq!(validate_non_negative("var", 0.0), Ok(0.0));
    }

    #[test]
    // Purpose
    // -------
    // Verify that `validate_vector` reports length mismatches before
    // finiteness and reports the index of the first non-finite entry.
    fn validate_vector_reports_length_then_first_bad_index() {
        // Arrange
        let v = array![1.0, f64::INFINITY, f64::NAN];

        // Act
        let wrong_len = validate_vector(v.view(), 2);
        let bad_value = validate_vector(v.view(), 3);

        // Assert
        assert_eq!(wrong_len, Err(IPMError::LengthMismatch { expected: 2, actual: 3 }));
        match bad_value {
            Err(IPMError::NonFiniteValue { index, .. }) => assert_eq!(index, 1),
            other => panic!("expected NonFiniteValue, got {other:?}"),
        }
    }

    #[test]
    // Purpose
    // -------
    // Verify that `validate_square` rejects rectangular and empty matrices.
    fn validate_square_rejects_rectangular_and_empty() {
        // Arrange
        let rect = Array2::<f64>::zeros((2, 3));
        let empty = Array2::<f64>::zeros((0, 0));
        let square = Array2::<f64>::eye(3);

        // Act / Assert
        assert!(validate_square(rect.view()).is_err());
        assert!(validate_square(empty.view()).is_err());
        assert_eq!(validate_square(square.view()), Ok(3));
    }
}
