//! Function-from-table — piecewise-linear interpolation over a grid.
//!
//! Purpose
//! -------
//! Turn a discrete vector over grid points into a continuous function of the
//! state, and a discrete distribution into an inverse-CDF sampler. The same
//! [`TableFunction`] serves the stable distribution `u(x)`, the reproductive
//! value `v(x)`, and the quantile function inside [`QuantileFunction`].
//!
//! Key behaviors
//! -------------
//! - [`TableFunction::eval`] interpolates linearly between neighbouring
//!   abscissae and extrapolates as a constant beyond either end (the value at
//!   the nearest boundary point).
//! - [`QuantileFunction::from_density`] accumulates non-negative weights into
//!   a CDF, collapses flat stretches, and stores the inverse as a
//!   [`TableFunction`] over `[0, 1]`.
//!
//! Invariants & assumptions
//! ------------------------
//! - Abscissae are finite and strictly increasing; ordinates are finite.
//! - At least two table points.
//! - NaN inputs evaluate to NaN.
use crate::ipm::{
    core::validation::validate_vector,
    errors::{IPMError, IPMResult},
};
use ndarray::{Array1, ArrayView1};
use rand::Rng;

/// Piecewise-linear function through `(xs[i], ys[i])` with constant
/// extrapolation.
#[derive(Debug, Clone, PartialEq)]
pub struct TableFunction {
    xs: Array1<f64>,
    ys: Array1<f64>,
}

impl TableFunction {
    /// Build a table function from abscissae `xs` and ordinates `ys`.
    ///
    /// # Errors
    /// - [`IPMError::LengthMismatch`] if lengths differ or fewer than 2 points.
    /// - [`IPMError::NonFiniteValue`] for NaN/±inf entries.
    /// - [`IPMError::InvalidTable`] if `xs` is not strictly increasing.
    pub fn new(xs: Array1<f64>, ys: Array1<f64>) -> IPMResult<Self> {
        if xs.len() < 2 {
            return Err(IPMError::LengthMismatch { expected: 2, actual: xs.len() });
        }
        validate_vector(xs.view(), xs.len())?;
        validate_vector(ys.view(), xs.len())?;
        for i in 1..xs.len() {
            if xs[i] <= xs[i - 1] {
                return Err(IPMError::InvalidTable { index: i, reason: "abscissae must increase" });
            }
        }
        Ok(TableFunction { xs, ys })
    }

    /// Evaluate at `x`.
    pub fn eval(&self, x: f64) -> f64 {
        if x.is_nan() {
            return f64::NAN;
        }
        let last = self.xs.len() - 1;
        if x <= self.xs[0] {
            return self.ys[0];
        }
        if x >= self.xs[last] {
            return self.ys[last];
        }
        // First index with xs[hi] > x; 1 <= hi <= last here.
        let hi = self.xs.as_slice().map_or_else(
            || self.xs.iter().position(|&t| t > x).unwrap_or(last),
            |xs| xs.partition_point(|&t| t <= x),
        );
        let lo = hi - 1;
        let w = (x - self.xs[lo]) / (self.xs[hi] - self.xs[lo]);
        self.ys[lo] + w * (self.ys[hi] - self.ys[lo])
    }

    /// Evaluate at every entry of `xs`.
    pub fn eval_many(&self, xs: ArrayView1<'_, f64>) -> Array1<f64> {
        xs.mapv(|x| self.eval(x))
    }

    pub fn xs(&self) -> &Array1<f64> {
        &self.xs
    }

    pub fn ys(&self) -> &Array1<f64> {
        &self.ys
    }
}

/// Inverse CDF of a discrete distribution over grid points.
///
/// Sampling draws `U ~ Uniform(0, 1)` and returns `Q(U)`, where `Q` linearly
/// interpolates the cumulative weights. Mass at grid point `x_i` is spread
/// over `(x_{i-1}, x_i]`.
#[derive(Debug, Clone, PartialEq)]
pub struct QuantileFunction {
    inverse: TableFunction,
}

impl QuantileFunction {
    /// Build the quantile function of `weights` placed at `points`.
    ///
    /// Leading zero-weight points collapse onto the last of them; later flat
    /// stretches of the CDF are skipped so the inverse stays single-valued.
    ///
    /// # Errors
    /// - [`IPMError::LengthMismatch`] / [`IPMError::NonFiniteValue`] for
    ///   malformed inputs.
    /// - [`IPMError::InvalidParam`] for a negative weight or zero total mass.
    pub fn from_density(points: ArrayView1<'_, f64>, weights: ArrayView1<'_, f64>) -> IPMResult<Self> {
        validate_vector(points, points.len())?;
        validate_vector(weights, points.len())?;
        if let Some(&w) = weights.iter().find(|&&w| w < 0.0) {
            return Err(IPMError::InvalidParam {
                name: "weights",
                value: w,
                reason: "weights must be non-negative",
            });
        }
        let total: f64 = weights.sum();
        if total <= 0.0 {
            return Err(IPMError::InvalidParam {
                name: "weights",
                value: total,
                reason: "total mass must be > 0",
            });
        }

        let mut cdf = Vec::with_capacity(points.len() + 1);
        let mut xs = Vec::with_capacity(points.len() + 1);
        let mut running = 0.0;
        let leading_zeros = weights.iter().take_while(|&&w| w == 0.0).count();
        // Anchor the inverse at probability 0.
        let anchor = leading_zeros.saturating_sub(1);
        cdf.push(0.0);
        xs.push(points[anchor]);
        for i in leading_zeros..points.len() {
            running += weights[i];
            let c = (running / total).min(1.0);
            if c > cdf[cdf.len() - 1] {
                cdf.push(c);
                xs.push(points[i]);
            }
        }
        let inverse = TableFunction::new(Array1::from(cdf), Array1::from(xs))?;
        Ok(QuantileFunction { inverse })
    }

    /// Quantile at probability `p` (clamped to the table's range).
    pub fn quantile(&self, p: f64) -> f64 {
        self.inverse.eval(p)
    }

    /// One inverse-CDF draw.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        self.inverse.eval(rng.gen::<f64>())
    }

    /// `n` independent inverse-CDF draws.
    pub fn sample_n<R: Rng + ?Sized>(&self, n: usize, rng: &mut R) -> Vec<f64> {
        (0..n).map(|_| self.sample(rng)).collect()
    }
}
