//! IPM options — configuration for power iteration and demographic variance.
//!
//! Purpose
//! -------
//! Collect the numerical knobs of the model-side pipeline in one place so
//! call sites pass explicit, validated options instead of loose scalars:
//! convergence tolerance, iteration cap, and tolerance mode for power
//! iteration ([`PowerOptions`]), and the quadrature resolution for the
//! demographic-variance integral ([`DemVarOptions`]).
//!
//! Key behaviors
//! -------------
//! - [`PowerOptions::new`] validates `tol > 0` and `max_iter > 0`;
//!   `Default` gives `tol = 1e-6`, `max_iter = 10_000`, absolute tolerance.
//! - [`ToleranceMode`] selects whether successive growth-rate ratios are
//!   compared absolutely (`|r_t - r_{t-1}| < tol`) or relative to the
//!   current ratio (`|r_t - r_{t-1}| < tol·|r_t|`).
//! - [`DemVarOptions`] optionally requests a finer quadrature grid over the
//!   same bounds; by default the state grid itself is used.
//!
//! Conventions
//! -----------
//! - Options are plain data carriers: cheap to clone, `PartialEq`, and never
//!   panic. All validation happens in the constructors.
use crate::ipm::{
    core::validation::validate_positive,
    errors::{IPMError, IPMResult},
};

/// Default absolute convergence tolerance for power iteration.
pub const DEFAULT_TOL: f64 = 1e-6;
/// Default iteration cap for power iteration.
pub const DEFAULT_MAX_ITER: usize = 10_000;

/// How successive growth-rate ratios are compared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ToleranceMode {
    /// `|r_t - r_{t-1}| < tol`.
    #[default]
    Absolute,
    /// `|r_t - r_{t-1}| < tol·|r_t|`; suited to large growth rates.
    Relative,
}

impl ToleranceMode {
    /// Whether two successive ratios have converged under this mode.
    #[inline]
    pub fn converged(&self, prev: f64, curr: f64, tol: f64) -> bool {
        let diff = (curr - prev).abs();
        match self {
            ToleranceMode::Absolute => diff < tol,
            ToleranceMode::Relative => diff < tol * curr.abs(),
        }
    }
}

/// Power-iteration configuration.
///
/// Fields
/// ------
/// - `tol`: convergence tolerance on successive ratios (finite, > 0).
/// - `max_iter`: iteration cap; reaching it yields
///   [`IPMError::NoConvergence`].
/// - `mode`: [`ToleranceMode`].
/// - `verbose`: log convergence summaries (only with the `obs_slog` feature).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PowerOptions {
    pub tol: f64,
    pub max_iter: usize,
    pub mode: ToleranceMode,
    pub verbose: bool,
}

impl PowerOptions {
    /// Construct validated power-iteration options.
    ///
    /// # Errors
    /// [`IPMError::InvalidParam`] if `tol` is non-finite or ≤ 0, or
    /// `max_iter == 0`.
    pub fn new(tol: f64, max_iter: usize, mode: ToleranceMode) -> IPMResult<Self> {
        let tol = validate_positive("tol", tol)?;
        if max_iter == 0 {
            return Err(IPMError::InvalidParam {
                name: "max_iter",
                value: 0.0,
                reason: "must be >= 1",
            });
        }
        Ok(PowerOptions { tol, max_iter, mode, verbose: false })
    }

    /// Same options with logging switched on or off.
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }
}

impl Default for PowerOptions {
    fn default() -> Self {
        PowerOptions {
            tol: DEFAULT_TOL,
            max_iter: DEFAULT_MAX_ITER,
            mode: ToleranceMode::Absolute,
            verbose: false,
        }
    }
}

/// Demographic-variance quadrature configuration.
///
/// `quad_points = None` integrates over the state grid itself; `Some(m)`
/// integrates over `m` uniformly spaced points on the same bounds, with the
/// reproductive value interpolated between grid points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DemVarOptions {
    pub quad_points: Option<usize>,
}

impl DemVarOptions {
    /// # Errors
    /// [`IPMError::InvalidParam`] if `quad_points` is `Some(m)` with `m < 2`.
    pub fn new(quad_points: Option<usize>) -> IPMResult<Self> {
        if let Some(m) = quad_points {
            if m < 2 {
                return Err(IPMError::InvalidParam {
                    name: "quad_points",
                    value: m as f64,
                    reason: "need at least 2 quadrature points",
                });
            }
        }
        Ok(DemVarOptions { quad_points })
    }
}
