//! Diffusion approximation of log population size.
//!
//! Purpose
//! -------
//! Simulate `n_sim` realizations of the scalar diffusion
//! `dY = mu(Y) dt + sqrt(nu(Y)) dW` with
//! `mu(y) = ln λ − (σ²_e + σ²_d e^{−y}) / (2λ²)` and
//! `nu(y) = (σ²_e + σ²_d e^{−y}) / λ²`, using Euler–Maruyama micro-steps and
//! recording the process at whole time units. The requested step is snapped
//! to `1/round(1/Δt)` so each recorded column is one time unit apart.
//!
//! Invariants & assumptions
//! ------------------------
//! - `y = 0` is absorbing: drift and variance vanish for `y <= 0` and every
//!   micro-step is clamped to `[0, b]` (`b = +∞` when no upper boundary).
//! - Column 0 of every trajectory is the clamped `y0`.
//! - With zero variances each trajectory is `y0 + t·ln λ`, clamped.
use crate::ipm::{analysis::IPMAnalysis, core::validation::validate_non_negative};
use crate::simulation::{
    ensemble::TrajectoryEnsemble,
    errors::{SimError, SimResult},
    options::{DiffusionOpts, EnsembleOpts},
    streams::run_ensemble,
};
use ndarray::Array2;
use rand::Rng;
use rand_distr::StandardNormal;

/// Growth rate and variance components driving the diffusion.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DiffusionParams {
    pub lambda: f64,
    pub demvar: f64,
    pub envvar: f64,
}

impl DiffusionParams {
    /// # Errors
    /// - [`SimError::InvalidParam`] unless `lambda` is finite and `> 0`.
    /// - [`SimError::Model`] wrapping `IPMError::InvalidParam` unless both
    ///   variances are finite and `>= 0`.
    pub fn new(lambda: f64, demvar: f64, envvar: f64) -> SimResult<Self> {
        if !(lambda.is_finite() && lambda > 0.0) {
            return Err(SimError::InvalidParam {
                name: "lambda",
                value: lambda,
                reason: "must be finite and > 0",
            });
        }
        let demvar = validate_non_negative("demvar", demvar)?;
        let envvar = validate_non_negative("envvar", envvar)?;
        Ok(DiffusionParams { lambda, demvar, envvar })
    }

    /// λ and σ²_d from a completed analysis, with environmental variance
    /// `envvar`.
    pub fn from_analysis(analysis: &IPMAnalysis, envvar: f64) -> SimResult<Self> {
        DiffusionParams::new(analysis.lambda(), analysis.demvar.demvar, envvar)
    }

    /// Infinitesimal mean at log-size `y`.
    pub fn drift(&self, y: f64) -> f64 {
        if y <= 0.0 {
            return 0.0;
        }
        self.lambda.ln() - self.total_variance(y) / (2.0 * self.lambda * self.lambda)
    }

    /// Infinitesimal variance at log-size `y`.
    pub fn variance(&self, y: f64) -> f64 {
        if y <= 0.0 {
            return 0.0;
        }
        self.total_variance(y) / (self.lambda * self.lambda)
    }

    fn total_variance(&self, y: f64) -> f64 {
        self.envvar + self.demvar * (-y).exp()
    }
}

/// Run the diffusion ensemble; one row per realization, `t_max + 1` columns.
///
/// # Errors
/// [`SimError::ThreadPool`] if a dedicated pool was requested and could not
/// be built.
pub fn simulate_diffusion(
    params: &DiffusionParams, opts: &DiffusionOpts, ensemble: &EnsembleOpts,
) -> SimResult<TrajectoryEnsemble> {
    let n_times = opts.t_max + 1;
    let upper = opts.upper.unwrap_or(f64::INFINITY);
    let steps = opts.steps_per_unit();
    let dt = opts.step_size();
    let sqrt_dt = dt.sqrt();
    let start = opts.y0.clamp(0.0, upper);

    let mut data = Array2::zeros((ensemble.n_sim, n_times));
    let buffer = data.as_slice_mut().ok_or(SimError::InvalidArgument {
        name: "data",
        reason: "trajectory buffer is not contiguous",
    })?;

    run_ensemble(buffer, n_times, ensemble, |_, rng, row| {
        let mut y = start;
        row[0] = y;
        for cell in row.iter_mut().skip(1) {
            for _ in 0..steps {
                let noise: f64 = rng.sample(StandardNormal);
                y += params.drift(y) * dt + noise * (params.variance(y)).sqrt() * sqrt_dt;
                y = y.clamp(0.0, upper);
            }
            *cell = y;
        }
    })?;

    #[cfg(feature = "obs_slog")]
    if ensemble.verbose {
        let log = crate::observe::term_logger("diffusion");
        let extinct = data.column(opts.t_max).iter().filter(|&&y| y <= 0.0).count();
        slog::info!(log, "diffusion ensemble finished";
            "n_sim" => ensemble.n_sim, "t_max" => opts.t_max,
            "steps_per_unit" => steps, "extinct" => extinct);
    }
    Ok(TrajectoryEnsemble::from_data(data))
}
