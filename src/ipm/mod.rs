//! ipm — integral projection models: discretization and eigen-analysis.
//!
//! Purpose
//! -------
//! Build the discretized kernel of a continuous-state demographic model and
//! derive its asymptotic quantities: growth rate λ, stable distribution `u`,
//! reproductive value `v`, sensitivities, and the demographic variance.
//!
//! Key behaviors
//! -------------
//! - [`KernelMatrix::build`] evaluates a [`VitalRates`] model on a
//!   [`StateGrid`] with survival clamped to `[0, 0.99]` and negative entries
//!   clamped to zero.
//! - [`EigenAnalysis`] runs bounded power iteration on `K` and `Kᵀ`.
//! - [`demographic_variance`] integrates the per-capita variance of
//!   reproductive-value change over the stable distribution, with explicit
//!   per-point failure reporting.
//! - [`IPMAnalysis`] chains the three steps.
//!
//! Invariants & assumptions
//! ------------------------
//! - Kernels are non-negative and (for convergence) primitive.
//! - `sum(u) = 1` and `sum(u·v) = 1` for every successful analysis.
//! - Errors are reported through [`IPMError`]; clamping is used instead of
//!   errors for out-of-range rates and densities.
//!
//! Downstream usage
//! ----------------
//! ```rust
//! use rust_ipm::ipm::prelude::*;
//!
//! let model = SizeStructuredModel::default();
//! let grid = StateGrid::new(0.0, 20.0, 100)?;
//! let analysis = IPMAnalysis::run(
//!     &model, grid, None, &PowerOptions::default(), &DemVarOptions::default(),
//! )?;
//! assert!((analysis.eigen.u.sum() - 1.0).abs() < 1e-9);
//! # Ok::<(), rust_ipm::ipm::IPMError>(())
//! ```
//!
//! Testing notes
//! -------------
//! - Unit tests live beside each module; the end-to-end scenario
//!   (`L = 0, U = 20, n = 200`) is in `tests/integration_ipm_pipeline.rs`.

pub mod analysis;
pub mod core;
pub mod demvar;
pub mod eigen;
pub mod errors;
pub mod kernel;
pub mod models;

// ---- Re-exports (primary surface) -----------------------------------------

pub use self::analysis::IPMAnalysis;
pub use self::core::{
    DemVarOptions, PowerOptions, QuantileFunction, StateGrid, TableFunction, ToleranceMode,
    VitalRates,
};
pub use self::demvar::{DemographicVariance, PointResult, demographic_variance};
pub use self::eigen::{
    EigenAnalysis, dominant_eigenvalue, left_eigenvector, power_iterate, right_eigenvector,
};
pub use self::errors::{IPMError, IPMResult};
pub use self::kernel::KernelMatrix;
pub use self::models::{SizeModelParams, SizeStructuredModel};

// ---- Optional convenience prelude for downstream crates -------------------

pub mod prelude {
    pub use super::analysis::IPMAnalysis;
    pub use super::core::{DemVarOptions, PowerOptions, StateGrid, ToleranceMode, VitalRates};
    pub use super::eigen::EigenAnalysis;
    pub use super::errors::{IPMError, IPMResult};
    pub use super::kernel::KernelMatrix;
    pub use super::models::SizeStructuredModel;
}
