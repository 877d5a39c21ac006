//! State grid — the uniform discretization of the continuous state range.
//!
//! A [`StateGrid`] holds `n` evaluation points spanning `[lower, upper]` at
//! uniform spacing `dx = (upper - lower)/(n - 1)`. It fixes the resolution
//! for the whole pipeline: the kernel is `n × n` on these points, `u`/`v` are
//! length-`n` vectors over them, and simulated states are clamped to the
//! same bounds.
use crate::ipm::{core::validation::validate_grid, errors::IPMResult};
use ndarray::Array1;

/// Uniform grid of state values over `[lower, upper]`.
///
/// Invariants
/// ----------
/// - `lower < upper`, both finite; `n >= 2`.
/// - `dx > 0` and `points[i] = lower + i·dx`, so `points[0] = lower` and
///   `points[n - 1] = upper` (up to rounding).
/// - Immutable after construction.
#[derive(Debug, Clone, PartialEq)]
pub struct StateGrid {
    lower: f64,
    upper: f64,
    dx: f64,
    points: Array1<f64>,
}

impl StateGrid {
    /// Build a validated grid of `n` points on `[lower, upper]`.
    ///
    /// # Errors
    /// [`IPMError::InvalidGrid`](crate::ipm::errors::IPMError::InvalidGrid) if
    /// the bounds are non-finite, out of order, or `n < 2`.
    pub fn new(lower: f64, upper: f64, n: usize) -> IPMResult<Self> {
        validate_grid(lower, upper, n)?;
        let dx = (upper - lower) / (n - 1) as f64;
        let points = Array1::from_iter((0..n).map(|i| lower + i as f64 * dx));
        Ok(StateGrid { lower, upper, dx, points })
    }

    pub fn lower(&self) -> f64 {
        self.lower
    }

    pub fn upper(&self) -> f64 {
        self.upper
    }

    /// Grid spacing.
    pub fn dx(&self) -> f64 {
        self.dx
    }

    /// Number of grid points.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Always `false`; kept for the `len`/`is_empty` pairing.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn points(&self) -> &Array1<f64> {
        &self.points
    }

    /// Clamp a state value into `[lower, upper]`. NaN maps to `lower`.
    #[inline]
    pub fn clamp(&self, x: f64) -> f64 {
        if x.is_nan() { self.lower } else { x.clamp(self.lower, self.upper) }
    }

    /// Same grid bounds at a different resolution (used for quadrature).
    pub fn refine(&self, n: usize) -> IPMResult<Self> {
        StateGrid::new(self.lower, self.upper, n)
    }
}
