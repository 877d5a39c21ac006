//! simulation — Monte Carlo projections of population size.
//!
//! Purpose
//! -------
//! Turn the quantities produced by `ipm` (λ, σ²_d, `u`, `v`) into stochastic
//! trajectories: a diffusion approximation of log population size and an
//! individual-based simulation of the full structured model.
//!
//! Key behaviors
//! -------------
//! - [`simulate_diffusion`] runs Euler–Maruyama realizations of the
//!   log-size diffusion with an absorbing boundary at 0 and an optional
//!   upper boundary.
//! - [`simulate_structured`] follows individuals through survival, growth,
//!   and reproduction and records total reproductive value per step.
//! - Both return a [`TrajectoryEnsemble`] with per-time quantile bands and
//!   extinction fractions.
//!
//! Invariants & assumptions
//! ------------------------
//! - Realizations are independent; realization `r` draws from a
//!   `ChaCha8Rng` seeded by [`derive_seed`]`(seed, r)`, so results do not
//!   depend on the number of worker threads.
//! - Every trajectory has `t_max + 1` recorded values, starting at time 0.
//!
//! Downstream usage
//! ----------------
//! ```rust
//! use rust_ipm::ipm::prelude::*;
//! use rust_ipm::simulation::prelude::*;
//!
//! let model = SizeStructuredModel::default();
//! let grid = StateGrid::new(0.0, 20.0, 60)?;
//! let analysis = IPMAnalysis::run(
//!     &model, grid, None, &PowerOptions::default(), &DemVarOptions::default(),
//! )?;
//!
//! let params = DiffusionParams::from_analysis(&analysis, 0.01)?;
//! let opts = DiffusionOpts::new(3.0, 20, 0.1, None)?;
//! let paths = simulate_diffusion(&params, &opts, &EnsembleOpts::default())?;
//! assert_eq!(paths.n_times(), 21);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod diffusion;
pub mod ensemble;
pub mod errors;
pub mod options;
pub mod streams;
pub mod structured;

// ---- Re-exports (primary surface) -----------------------------------------

pub use self::diffusion::{DiffusionParams, simulate_diffusion};
pub use self::ensemble::TrajectoryEnsemble;
pub use self::errors::{SimError, SimResult};
pub use self::options::{DiffusionOpts, EnsembleOpts, StructuredOpts};
pub use self::streams::{derive_seed, realization_rng};
pub use self::structured::{simulate_population, simulate_structured};

pub mod prelude {
    pub use super::diffusion::{DiffusionParams, simulate_diffusion};
    pub use super::ensemble::TrajectoryEnsemble;
    pub use super::errors::{SimError, SimResult};
    pub use super::options::{DiffusionOpts, EnsembleOpts, StructuredOpts};
    pub use super::structured::{simulate_population, simulate_structured};
}
