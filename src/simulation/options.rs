//! Simulation options — ensemble, diffusion, and structured-population
//! settings.
//!
//! Purpose
//! -------
//! Collect the configuration of the Monte Carlo simulators in plain, validated
//! carriers so simulator entry points take explicit options instead of
//! positional scalars.
//!
//! Key behaviors
//! -------------
//! - [`EnsembleOpts`]: number of realizations, master seed, optional
//!   dedicated thread count, and verbosity. Shared by both simulators.
//! - [`DiffusionOpts`]: initial log-size, horizon, Euler–Maruyama step, and
//!   optional upper boundary on the log scale.
//! - [`StructuredOpts`]: initial population size, horizon, and the
//!   total-reproductive-value cap that stops a realization.
//!
//! Invariants & assumptions
//! ------------------------
//! - `n_sim >= 1`; `n_threads`, when given, is `>= 1`.
//! - `delta_t` lies in `[1e-6, 1]`; the number of micro-steps per recorded
//!   time unit is `round(1/delta_t)` and each micro-step has length
//!   `1/round(1/delta_t)`, so recorded columns are exactly one unit apart.
//! - The upper log-scale boundary, when given, is finite and `> 0`.
//! - `n0 >= 1`; `v_max` is finite and `> 1`.
//!
//! Conventions
//! -----------
//! - Trajectories are recorded at whole time units `0, 1, ..., t_max`, so
//!   every realization yields `t_max + 1` values.
//! - `seed = None` falls back to a fixed crate-wide base seed, so runs are
//!   always reproducible; pass distinct seeds for independent experiments.
use crate::simulation::errors::{SimError, SimResult};

/// Smallest accepted Euler–Maruyama step.
pub const MIN_DELTA_T: f64 = 1e-6;

/// Realization count, seeding, and parallelism shared by both simulators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnsembleOpts {
    pub n_sim: usize,
    pub seed: Option<u64>,
    pub n_threads: Option<usize>,
    pub verbose: bool,
}

impl EnsembleOpts {
    /// # Errors
    /// [`SimError::InvalidArgument`] if `n_sim == 0` or `n_threads == Some(0)`.
    pub fn new(n_sim: usize, seed: Option<u64>, n_threads: Option<usize>) -> SimResult<Self> {
        if n_sim == 0 {
            return Err(SimError::InvalidArgument {
                name: "n_sim",
                reason: "number of realizations must be greater than zero",
            });
        }
        if n_threads == Some(0) {
            return Err(SimError::InvalidArgument {
                name: "n_threads",
                reason: "thread count must be greater than zero",
            });
        }
        Ok(EnsembleOpts { n_sim, seed, n_threads, verbose: false })
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }
}

impl Default for EnsembleOpts {
    /// 100 realizations, seed 42, global rayon pool.
    fn default() -> Self {
        EnsembleOpts { n_sim: 100, seed: Some(42), n_threads: None, verbose: false }
    }
}

/// Diffusion-approximation settings (log population size scale).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DiffusionOpts {
    /// Initial log population size.
    pub y0: f64,
    /// Number of recorded whole time units after the start.
    pub t_max: usize,
    /// Requested Euler–Maruyama micro-step; see [`DiffusionOpts::step_size`].
    pub delta_t: f64,
    /// Optional upper boundary on the log scale.
    pub upper: Option<f64>,
}

impl DiffusionOpts {
    /// # Errors
    /// [`SimError::InvalidParam`] for a non-finite `y0`, `delta_t` outside
    /// `[MIN_DELTA_T, 1]`, or a non-finite / non-positive `upper`.
    pub fn new(y0: f64, t_max: usize, delta_t: f64, upper: Option<f64>) -> SimResult<Self> {
        if !y0.is_finite() {
            return Err(SimError::InvalidParam { name: "y0", value: y0, reason: "must be finite" });
        }
        if !(MIN_DELTA_T..=1.0).contains(&delta_t) {
            return Err(SimError::InvalidParam {
                name: "delta_t",
                value: delta_t,
                reason: "must be in [1e-6, 1]",
            });
        }
        if let Some(b) = upper {
            if !(b.is_finite() && b > 0.0) {
                return Err(SimError::InvalidParam {
                    name: "upper",
                    value: b,
                    reason: "must be finite and > 0",
                });
            }
        }
        Ok(DiffusionOpts { y0, t_max, delta_t, upper })
    }

    /// Micro-steps per recorded time unit.
    pub fn steps_per_unit(&self) -> usize {
        ((1.0 / self.delta_t).round() as usize).max(1)
    }

    /// Length of one micro-step: `delta_t` snapped so that
    /// `steps_per_unit()` steps span exactly one time unit.
    pub fn step_size(&self) -> f64 {
        1.0 / self.steps_per_unit() as f64
    }
}

/// Individual-based simulation settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StructuredOpts {
    /// Initial number of individuals.
    pub n0: usize,
    /// Number of simulated time steps.
    pub t_max: usize,
    /// Total reproductive value above which a realization stops.
    pub v_max: f64,
}

impl StructuredOpts {
    /// # Errors
    /// - [`SimError::InvalidArgument`] if `n0 == 0`.
    /// - [`SimError::InvalidParam`] if `v_max` is non-finite or `<= 1`.
    pub fn new(n0: usize, t_max: usize, v_max: f64) -> SimResult<Self> {
        if n0 == 0 {
            return Err(SimError::InvalidArgument {
                name: "n0",
                reason: "initial population must be non-empty",
            });
        }
        if !(v_max.is_finite() && v_max > 1.0) {
            return Err(SimError::InvalidParam {
                name: "v_max",
                value: v_max,
                reason: "must be finite and > 1",
            });
        }
        Ok(StructuredOpts { n0, t_max, v_max })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ensemble_opts_default_matches_documented_values() {
        let opts = EnsembleOpts::default();
        assert_eq!(opts.n_sim, 100);
        assert_eq!(opts.seed, Some(42));
        assert_eq!(opts.n_threads, None);
    }

    #[test]
    // Purpose
    // -------
    // Exercise every rejection branch of the option constructors.
    fn constructors_reject_out_of_range_settings() {
        assert!(EnsembleOpts::new(0, None, None).is_err());
        assert!(EnsembleOpts::new(5, None, Some(0)).is_err());
        assert!(DiffusionOpts::new(f64::NAN, 10, 0.1, None).is_err());
        assert!(DiffusionOpts::new(1.0, 10, 0.0, None).is_err());
        assert!(DiffusionOpts::new(1.0, 10, 1.5, None).is_err());
        assert!(DiffusionOpts::new(1.0, 10, 1e-300, None).is_err());
        assert!(DiffusionOpts::new(1.0, 10, f64::NAN, None).is_err());
        assert!(DiffusionOpts::new(1.0, 10, 0.1, Some(-2.0)).is_err());
        assert!(StructuredOpts::new(0, 10, 1e6).is_err());
        assert!(StructuredOpts::new(10, 10, 1.0).is_err());
    }

    #[test]
    // Purpose
    // -------
    // Steps per unit round 1/delta_t.
    fn steps_per_unit_rounds_reciprocal_step() {
        assert_eq!(DiffusionOpts::new(1.0, 5, 0.01, None).unwrap().steps_per_unit(), 100);
        assert_eq!(DiffusionOpts::new(1.0, 5, 0.3, None).unwrap().steps_per_unit(), 3);
        assert_eq!(DiffusionOpts::new(1.0, 5, 1.0, None).unwrap().steps_per_unit(), 1);
        assert_eq!(DiffusionOpts::new(1.0, 5, MIN_DELTA_T, None).unwrap().steps_per_unit(), 1_000_000);
    }

    #[test]
    // Purpose
    // -------
    // Snapped micro-steps always tile one time unit exactly.
    fn step_size_tiles_one_time_unit() {
        for dt in [0.3, 0.4, 0.7, 0.01, 1.0] {
            let opts = DiffusionOpts::new(0.0, 1, dt, None).unwrap();
            let span = opts.step_size() * opts.steps_per_unit() as f64;
            assert!((span - 1.0).abs() < 1e-12, "dt = {dt}: span {span}");
        }
        assert_eq!(DiffusionOpts::new(0.0, 1, 0.4, None).unwrap().step_size(), 1.0 / 3.0);
        assert_eq!(DiffusionOpts::new(0.0, 1, 0.7, None).unwrap().step_size(), 1.0);
    }
}
