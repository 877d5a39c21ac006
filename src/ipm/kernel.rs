//! Kernel discretizer — midpoint-rule matrix of the IPM kernel.
//!
//! Purpose
//! -------
//! Evaluate the combined survival–growth and fecundity–offspring kernel of a
//! [`VitalRates`] model on a [`StateGrid`] and scale it by the grid spacing,
//! producing the `n × n` projection matrix used by the eigen-analysis and the
//! demographic-variance calculator.
//!
//! Key behaviors
//! -------------
//! - Column `j` (source state `x_j`) holds, for every target `y_i`,
//!   `dx·[ s(x_j, z)·f_s(x_j, y_i, z) + b(x_j, z)·f_b(x_j, y_i, z) ]`.
//! - The survival–growth part `P` and fecundity part `F` are kept separately
//!   alongside `K = P + F`, for sensitivity work on either component.
//! - Survival is clamped to `[0, MAX_SURVIVAL]`; negative or non-finite
//!   entries (from density approximations or degenerate rates) become 0.
//!
//! Invariants & assumptions
//! ------------------------
//! - Every entry of `P`, `F`, and `K` is finite and `>= 0`.
//! - Construction is a pure function of its inputs; the matrices are
//!   read-only afterwards.
use crate::ipm::core::{MAX_SURVIVAL, StateGrid, VitalRates, clamp_survival};
use ndarray::Array2;

/// Discretized IPM kernel with its survival–growth and fecundity components.
#[derive(Debug, Clone, PartialEq)]
pub struct KernelMatrix {
    p: Array2<f64>,
    f: Array2<f64>,
    k: Array2<f64>,
    dx: f64,
}

impl KernelMatrix {
    /// Build the kernel of `model` on `grid` in environment `z`.
    ///
    /// Never fails: invalid values are clamped rather than reported.
    pub fn build<M: VitalRates>(model: &M, grid: &StateGrid, z: Option<f64>) -> KernelMatrix {
        let n = grid.len();
        let dx = grid.dx();
        let xs = grid.points();
        let mut p = Array2::<f64>::zeros((n, n));
        let mut f = Array2::<f64>::zeros((n, n));

        for (j, &x) in xs.iter().enumerate() {
            let s = clamp_survival(model.survival(x, z), MAX_SURVIVAL);
            let b = non_negative(model.fecundity(x, z));
            for (i, &y) in xs.iter().enumerate() {
                p[[i, j]] = non_negative(s * model.growth_density(x, y, z) * dx);
                f[[i, j]] = non_negative(b * model.offspring_density(x, y, z) * dx);
            }
        }
        let k = &p + &f;
        KernelMatrix { p, f, k, dx }
    }

    /// Survival–growth component `P`.
    pub fn p(&self) -> &Array2<f64> {
        &self.p
    }

    /// Fecundity component `F`.
    pub fn f(&self) -> &Array2<f64> {
        &self.f
    }

    /// Full kernel `K = P + F`.
    pub fn k(&self) -> &Array2<f64> {
        &self.k
    }

    pub fn dx(&self) -> f64 {
        self.dx
    }

    /// Matrix dimension `n`.
    pub fn dim(&self) -> usize {
        self.k.nrows()
    }
}

#[inline]
fn non_negative(value: f64) -> f64 {
    if value.is_finite() && value > 0.0 { value } else { 0.0 }
}
