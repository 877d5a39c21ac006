//! Eigen-analysis engine — bounded power iteration for λ, u, and v.
//!
//! Purpose
//! -------
//! Compute the dominant eigenvalue (population growth rate λ), the right
//! eigenvector (stable state distribution `u`), and the left eigenvector
//! (reproductive value `v`) of a non-negative projection matrix by repeated
//! matrix–vector multiplication.
//!
//! Key behaviors
//! -------------
//! - Iterate `N_{t+1} = K·N_t`, `r_t = sum(N_{t+1})/sum(N_t)` and stop once
//!   successive ratios agree under [`PowerOptions`] (`|r_t - r_{t-1}| < tol`
//!   in absolute mode).
//! - The iterate is rescaled to unit sum after every step. The ratio sequence
//!   is unchanged, but the vector can no longer overflow or underflow.
//! - `u = N/sum(N)`; `v` comes from the same iteration on `Kᵀ` and is scaled
//!   so that `sum(u·v) = 1`.
//! - Iteration is capped at `max_iter`; exhausting it returns
//!   [`IPMError::NoConvergence`] instead of looping forever.
//!
//! Invariants & assumptions
//! ------------------------
//! - Convergence relies on a unique dominant eigenvalue of multiplicity one
//!   (Perron–Frobenius for primitive non-negative matrices). Periodic or
//!   reducible kernels may oscillate and hit the iteration cap.
//! - The starting vector must have a finite, nonzero sum; an iterate whose
//!   sum collapses to 0 or becomes non-finite yields
//!   [`IPMError::DegenerateIterate`].
//!
//! Conventions
//! -----------
//! - Matrices follow the kernel layout: `k[[i, j]]` is the transition from
//!   state `j` to state `i`; column sums are per-capita contributions.
//! - Logging (feature `obs_slog`) happens only when `opts.verbose` is set.
use crate::ipm::{
    core::{
        options::PowerOptions,
        validation::{validate_square, validate_vector},
    },
    errors::{IPMError, IPMResult},
};
use ndarray::{Array1, Array2, ArrayView1, ArrayView2};

/// Result of one power-iteration run.
#[derive(Debug, Clone, PartialEq)]
pub struct PowerOutcome {
    /// Converged ratio `r_t` (the dominant eigenvalue).
    pub ratio: f64,
    /// Converged iterate scaled to unit sum.
    pub vector: Array1<f64>,
    /// Number of matrix–vector products performed.
    pub iterations: usize,
}

/// Run power iteration on `mat` from `n0`.
///
/// # Errors
/// - [`IPMError::LengthMismatch`] / [`IPMError::NonFiniteValue`] for a
///   non-square or non-finite matrix, or a start vector of the wrong length.
/// - [`IPMError::DegenerateIterate`] if the start vector or an iterate has
///   zero or non-finite sum.
/// - [`IPMError::NoConvergence`] if `opts.max_iter` products are used up.
pub fn power_iterate(
    mat: ArrayView2<'_, f64>, n0: ArrayView1<'_, f64>, opts: &PowerOptions,
) -> IPMResult<PowerOutcome> {
    let n = validate_square(mat)?;
    validate_vector(n0, n)?;

    let start_sum = n0.sum();
    if !start_sum.is_finite() || start_sum == 0.0 {
        return Err(IPMError::DegenerateIterate { iteration: 0, sum: start_sum });
    }
    let mut current = n0.mapv(|x| x / start_sum);
    let mut prev_ratio = f64::NAN;

    for iteration in 1..=opts.max_iter {
        let next = mat.dot(&current);
        let next_sum = next.sum();
        if !next_sum.is_finite() || next_sum == 0.0 {
            return Err(IPMError::DegenerateIterate { iteration, sum: next_sum });
        }
        // `current` sums to one, so the ratio is just the new sum.
        let ratio = next_sum;
        current = next / next_sum;
        if prev_ratio.is_finite() && opts.mode.converged(prev_ratio, ratio, opts.tol) {
            #[cfg(feature = "obs_slog")]
            if opts.verbose {
                let log = crate::observe::term_logger("eigen");
                slog::info!(log, "power iteration converged";
                    "iterations" => iteration, "ratio" => ratio, "dim" => n);
            }
            return Ok(PowerOutcome { ratio, vector: current, iterations: iteration });
        }
        prev_ratio = ratio;
    }

    #[cfg(feature = "obs_slog")]
    if opts.verbose {
        let log = crate::observe::term_logger("eigen");
        slog::warn!(log, "power iteration hit the iteration cap";
            "max_iter" => opts.max_iter, "last_ratio" => prev_ratio);
    }
    Err(IPMError::NoConvergence { iterations: opts.max_iter, last_ratio: prev_ratio })
}

/// Dominant eigenvalue λ of `mat`, starting from `n0`.
pub fn dominant_eigenvalue(
    mat: ArrayView2<'_, f64>, n0: ArrayView1<'_, f64>, opts: &PowerOptions,
) -> IPMResult<f64> {
    power_iterate(mat, n0, opts).map(|out| out.ratio)
}

/// Stable distribution `u` (right eigenvector, `sum(u) = 1`).
pub fn right_eigenvector(
    mat: ArrayView2<'_, f64>, n0: ArrayView1<'_, f64>, opts: &PowerOptions,
) -> IPMResult<Array1<f64>> {
    power_iterate(mat, n0, opts).map(|out| out.vector)
}

/// Reproductive value `v` (left eigenvector) scaled so that `sum(u·v) = 1`.
///
/// # Errors
/// As [`power_iterate`] on `matᵀ`, plus [`IPMError::DegenerateIterate`] if
/// `sum(w·u)` is zero or non-finite for the raw left iterate `w`.
pub fn left_eigenvector(
    mat: ArrayView2<'_, f64>, u: ArrayView1<'_, f64>, n0: ArrayView1<'_, f64>,
    opts: &PowerOptions,
) -> IPMResult<Array1<f64>> {
    let out = power_iterate(mat.t(), n0, opts)?;
    validate_vector(u, out.vector.len())?;
    scale_to_unit_product(out.vector, u, out.iterations)
}

fn scale_to_unit_product(
    w: Array1<f64>, u: ArrayView1<'_, f64>, iteration: usize,
) -> IPMResult<Array1<f64>> {
    let weighted = w.dot(&u);
    if !weighted.is_finite() || weighted == 0.0 {
        return Err(IPMError::DegenerateIterate { iteration, sum: weighted });
    }
    Ok(w / weighted)
}

/// λ, u, and v of a projection matrix.
///
/// Fields
/// ------
/// - `lambda`: dominant eigenvalue.
/// - `u`: stable distribution, `sum(u) = 1`.
/// - `v`: reproductive value, `sum(u·v) = 1`.
/// - `iterations`: `(right, left)` power-iteration counts.
#[derive(Debug, Clone, PartialEq)]
pub struct EigenAnalysis {
    pub lambda: f64,
    pub u: Array1<f64>,
    pub v: Array1<f64>,
    pub iterations: (usize, usize),
}

impl EigenAnalysis {
    /// Analyse `mat` from the all-ones start vector.
    pub fn compute(mat: ArrayView2<'_, f64>, opts: &PowerOptions) -> IPMResult<Self> {
        let ones = Array1::<f64>::ones(mat.nrows());
        EigenAnalysis::compute_from(mat, ones.view(), opts)
    }

    /// Analyse `mat` from a caller-chosen start vector (used for both the
    /// right and the left iteration).
    pub fn compute_from(
        mat: ArrayView2<'_, f64>, n0: ArrayView1<'_, f64>, opts: &PowerOptions,
    ) -> IPMResult<Self> {
        let right = power_iterate(mat, n0, opts)?;
        let left = power_iterate(mat.t(), n0, opts)?;
        let v = scale_to_unit_product(left.vector, right.vector.view(), left.iterations)?;
        Ok(EigenAnalysis {
            lambda: right.ratio,
            u: right.vector,
            v,
            iterations: (right.iterations, left.iterations),
        })
    }

    /// Sensitivity of λ to each matrix entry: `s_ij = v_i·u_j / sum(v·u)`.
    pub fn sensitivity(&self) -> Array2<f64> {
        let vu = self.v.dot(&self.u);
        let n = self.u.len();
        Array2::from_shape_fn((n, n), |(i, j)| self.v[i] * self.u[j] / vu)
    }

    /// Elasticity of λ to each matrix entry: `e_ij = k_ij·s_ij / λ`.
    ///
    /// Elasticities of the full kernel sum to one.
    pub fn elasticity(&self, mat: ArrayView2<'_, f64>) -> IPMResult<Array2<f64>> {
        let n = validate_square(mat)?;
        if n != self.u.len() {
            return Err(IPMError::LengthMismatch { expected: self.u.len(), actual: n });
        }
        Ok(&mat * &self.sensitivity() / self.lambda)
    }
}
