//! Demographic variance — per-capita variance of reproductive-value change.
//!
//! Purpose
//! -------
//! Combine the vital rates with the stable distribution `u` and reproductive
//! value `v` into the scalar demographic variance that drives size-independent
//! stochastic fluctuations of total reproductive value (and the diffusion
//! approximation in `simulation::diffusion`).
//!
//! Key behaviors
//! -------------
//! - For every grid point `x_i`, integrate over target states `y`:
//!   `meanvs = Σ f_s(y|x_i)·v(y)·dy`, `meanvb = Σ f_b(y|x_i)·v(y)·dy` and
//!   the second moments `starvs`, `starvb` with `v(y)²`.
//! - Aggregate
//!   `Σ_i u(x_i)·[meanvs²·s(1−s) + meanvb²·σ_B + 2·meanvs·meanvb·σ_BS
//!   + s·(starvs − meanvs²) + b·(starvb − meanvb²)]·dx`
//!   with `σ_B = offspring_variance` (Poisson: `b`) and
//!   `σ_BS = survival_fecundity_covariance` (0 by default).
//! - `v(y)` is the piecewise-linear [`TableFunction`] through the grid
//!   values, so the `y`-integral may use a finer quadrature grid
//!   ([`DemVarOptions::quad_points`]).
//! - A grid point whose contribution is non-finite is reported as
//!   [`PointResult::Failed`] and left out of the sum; the caller can inspect
//!   [`DemographicVariance::failures`].
//!
//! Invariants & assumptions
//! ------------------------
//! - `u` is the normalized stable distribution (`sum(u) = 1`); it is turned
//!   into a density `u/dx` before integrating, so `Σ u(x_i)·dx = 1`.
//! - `v` is scaled so that `sum(u·v) = 1`.
//! - Survival is clamped to `[0, MAX_SURVIVAL]` and densities to `>= 0`,
//!   exactly as in the kernel.
use crate::ipm::{
    core::{
        MAX_SURVIVAL, StateGrid, TableFunction, VitalRates, clamp_survival,
        options::DemVarOptions, validation::validate_vector,
    },
    errors::{IPMError, IPMResult},
};
use ndarray::{Array1, ArrayView1};

/// Outcome of one grid point's contribution.
#[derive(Debug, Clone, PartialEq)]
pub enum PointResult {
    /// Bracketed term of the demographic-variance sum at `x`.
    Ok { index: usize, x: f64, contribution: f64 },
    /// The contribution could not be formed at `x`.
    Failed { index: usize, x: f64, reason: &'static str },
}

impl PointResult {
    pub fn index(&self) -> usize {
        match self {
            PointResult::Ok { index, .. } | PointResult::Failed { index, .. } => *index,
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, PointResult::Ok { .. })
    }
}

/// Aggregate demographic variance with per-point diagnostics.
#[derive(Debug, Clone, PartialEq)]
pub struct DemographicVariance {
    /// Sum over the successful grid points.
    pub demvar: f64,
    /// One entry per grid point, in grid order.
    pub points: Vec<PointResult>,
}

impl DemographicVariance {
    /// Grid points whose contribution failed.
    pub fn failures(&self) -> impl Iterator<Item = &PointResult> {
        self.points.iter().filter(|p| !p.is_ok())
    }

    /// `true` when every grid point contributed.
    pub fn is_clean(&self) -> bool {
        self.points.iter().all(PointResult::is_ok)
    }
}

/// Moments of `v` under one transition density.
struct VMoments {
    mean: f64,
    second: f64,
}

fn v_moments<F>(density: F, ys: ArrayView1<'_, f64>, v: &Array1<f64>, dy: f64) -> VMoments
where
    F: Fn(f64) -> f64,
{
    let mut mean = 0.0;
    let mut second = 0.0;
    for (&y, &vy) in ys.iter().zip(v.iter()) {
        let d = density(y);
        let d = if d.is_finite() && d > 0.0 { d } else { 0.0 };
        mean += d * vy;
        second += d * vy * vy;
    }
    VMoments { mean: mean * dy, second: second * dy }
}

/// Compute the demographic variance of `model` on `grid`.
///
/// # Errors
/// - [`IPMError::LengthMismatch`] / [`IPMError::NonFiniteValue`] if `u` or
///   `v` do not match the grid.
/// - [`IPMError::InvalidGrid`] if the requested quadrature grid is invalid.
/// - [`IPMError::DemVarFailed`] if no grid point produced a finite
///   contribution.
pub fn demographic_variance<M: VitalRates>(
    model: &M, grid: &StateGrid, u: ArrayView1<'_, f64>, v: ArrayView1<'_, f64>, z: Option<f64>,
    opts: &DemVarOptions,
) -> IPMResult<DemographicVariance> {
    let n = grid.len();
    validate_vector(u, n)?;
    validate_vector(v, n)?;
    let dx = grid.dx();

    let v_fn = TableFunction::new(grid.points().clone(), v.to_owned())?;
    let quad = match opts.quad_points {
        Some(m) => grid.refine(m)?,
        None => grid.clone(),
    };
    let ys = quad.points().view();
    let v_quad = v_fn.eval_many(ys);
    let dy = quad.dx();

    let mut demvar = 0.0;
    let mut points = Vec::with_capacity(n);
    for (index, &x) in grid.points().iter().enumerate() {
        let s = clamp_survival(model.survival(x, z), MAX_SURVIVAL);
        let b = model.fecundity(x, z);
        let sig_b = model.offspring_variance(x, z);
        let sig_bs = model.survival_fecundity_covariance(x, z);
        if !(b.is_finite() && sig_b.is_finite() && sig_bs.is_finite()) {
            points.push(PointResult::Failed { index, x, reason: "non-finite vital rate" });
            continue;
        }

        let vs = v_moments(|y| model.growth_density(x, y, z), ys, &v_quad, dy);
        let vb = v_moments(|y| model.offspring_density(x, y, z), ys, &v_quad, dy);
        let contribution = vs.mean * vs.mean * s * (1.0 - s)
            + vb.mean * vb.mean * sig_b
            + 2.0 * vs.mean * vb.mean * sig_bs
            + s * (vs.second - vs.mean * vs.mean)
            + b * (vb.second - vb.mean * vb.mean);

        if !contribution.is_finite() {
            points.push(PointResult::Failed { index, x, reason: "non-finite contribution" });
            continue;
        }
        // u/dx is the stable density; the dx of the outer integral cancels it.
        demvar += (u[index] / dx) * contribution * dx;
        points.push(PointResult::Ok { index, x, contribution });
    }

    if points.iter().all(|p| !p.is_ok()) {
        return Err(IPMError::DemVarFailed { n_points: n });
    }
    Ok(DemographicVariance { demvar, points })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ipm::{
        core::PowerOptions, eigen::EigenAnalysis, kernel::KernelMatrix,
        models::SizeStructuredModel,
    };
    use approx::assert_abs_diff_eq;
    use rand::Rng;

    /// Constant rates with flat densities of height `d`; optionally NaN
    /// survival above `nan_above`.
    struct Flat {
        s: f64,
        b: f64,
        d: f64,
        nan_above: f64,
    }

    impl VitalRates for Flat {
        fn survival(&self, _x: f64, _z: Option<f64>) -> f64 {
            self.s
        }
        fn fecundity(&self, x: f64, _z: Option<f64>) -> f64 {
            if x > self.nan_above { f64::NAN } else { self.b }
        }
        fn growth_density(&self, _x: f64, _y: f64, _z: Option<f64>) -> f64 {
            self.d
        }
        fn offspring_density(&self, _x: f64, _y: f64, _z: Option<f64>) -> f64 {
            self.d
        }
        fn sample_growth<R: Rng + ?Sized>(&self, x: f64, _z: Option<f64>, _rng: &mut R) -> f64 {
            x
        }
        fn sample_offspring_state<R: Rng + ?Sized>(
            &self, x: f64, _z: Option<f64>, _rng: &mut R,
        ) -> f64 {
            x
        }
    }

    #[test]
    // Purpose
    // -------
    // Check the aggregate formula on a case with closed form.
    //
    // Given
    // -----
    // - Flat densities normalized so that Σ d·dy = 1 on the grid, v ≡ 1,
    //   s = 0.5, b = 0.3, uniform u.
    //
    // Expect
    // ------
    // - meanvs = meanvb = starvs = starvb = 1, so every bracket equals
    //   s(1−s) + b = 0.55 and so does the u-weighted sum.
    fn flat_model_matches_closed_form() {
        // Arrange
        let grid = StateGrid::new(0.0, 4.0, 9).unwrap();
        let d = 1.0 / (grid.len() as f64 * grid.dx());
        let model = Flat { s: 0.5, b: 0.3, d, nan_above: f64::INFINITY };
        let u = Array1::from_elem(9, 1.0 / 9.0);
        let v = Array1::<f64>::ones(9);

        // Act
        let out =
            demographic_variance(&model, &grid, u.view(), v.view(), None, &DemVarOptions::default())
                .unwrap();

        // Assert
        assert!(out.is_clean());
        assert_abs_diff_eq!(out.demvar, 0.55, epsilon = 1e-12);
    }

    #[test]
    // Purpose
    // -------
    // Points with a non-finite vital rate are reported and skipped; when all
    // points fail the call errors.
    fn failed_points_are_surfaced_not_zeroed() {
        // Arrange
        let grid = StateGrid::new(0.0, 4.0, 9).unwrap();
        let d = 1.0 / (grid.len() as f64 * grid.dx());
        let partial = Flat { s: 0.5, b: 0.3, d, nan_above: 2.0 };
        let total = Flat { s: 0.5, b: 0.3, d, nan_above: -1.0 };
        let u = Array1::from_elem(9, 1.0 / 9.0);
        let v = Array1::<f64>::ones(9);
        let opts = DemVarOptions::default();

        // Act
        let out = demographic_variance(&partial, &grid, u.view(), v.view(), None, &opts).unwrap();
        let err = demographic_variance(&total, &grid, u.view(), v.view(), None, &opts).unwrap_err();

        // Assert
        // Grid points 0, 0.5, ..., 2.0 succeed (5 of 9).
        assert_eq!(out.failures().count(), 4);
        assert!(out.failures().all(|p| p.index() >= 5));
        assert_abs_diff_eq!(out.demvar, 0.55 * 5.0 / 9.0, epsilon = 1e-12);
        assert_eq!(err, IPMError::DemVarFailed { n_points: 9 });
    }

    #[test]
    // Purpose
    // -------
    // For the reference model the demographic variance is positive and
    // finite, and a quadrature grid equal to the state grid reproduces the
    // default exactly.
    fn reference_model_demvar_is_positive_and_quadrature_consistent() {
        // Arrange
        let model = SizeStructuredModel::default();
        let grid = StateGrid::new(0.0, 20.0, 100).unwrap();
        let kernel = KernelMatrix::build(&model, &grid, None);
        let eig = EigenAnalysis::compute(kernel.k().view(), &PowerOptions::default()).unwrap();

        // Act
        let base = demographic_variance(
            &model, &grid, eig.u.view(), eig.v.view(), None, &DemVarOptions::default(),
        )
        .unwrap();
        let same = demographic_variance(
            &model, &grid, eig.u.view(), eig.v.view(), None,
            &DemVarOptions::new(Some(100)).unwrap(),
        )
        .unwrap();
        let fine = demographic_variance(
            &model, &grid, eig.u.view(), eig.v.view(), None,
            &DemVarOptions::new(Some(400)).unwrap(),
        )
        .unwrap();

        // Assert
        assert!(base.is_clean());
        assert!(base.demvar.is_finite() && base.demvar > 0.0);
        assert_abs_diff_eq!(base.demvar, same.demvar, epsilon = 1e-12);
        assert!((fine.demvar - base.demvar).abs() < 0.05 * base.demvar);
    }

    #[test]
    fn mismatched_vectors_are_rejected() {
        let grid = StateGrid::new(0.0, 1.0, 5).unwrap();
        let model = SizeStructuredModel::default();
        let u = Array1::from_elem(4, 0.25);
        let v = Array1::<f64>::ones(5);
        let out =
            demographic_variance(&model, &grid, u.view(), v.view(), None, &DemVarOptions::default());
        assert_eq!(out, Err(IPMError::LengthMismatch { expected: 5, actual: 4 }));
    }
}
