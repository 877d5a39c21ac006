//! core — shared IPM building blocks: grid, vital rates, interpolation,
//! options, and validation.
//!
//! Purpose
//! -------
//! Collect the primitives every other part of the IPM stack builds on: the
//! uniform [`StateGrid`], the [`VitalRates`] trait describing a model, the
//! reusable [`TableFunction`] / [`QuantileFunction`] interpolation layer,
//! numerical options ([`PowerOptions`], [`DemVarOptions`]), and small
//! validation helpers.
//!
//! Invariants & assumptions
//! ------------------------
//! - Grids have `n >= 2` points and positive spacing; all downstream vectors
//!   are indexed by grid point.
//! - Vital-rate outputs are clamped by their consumers (survival to
//!   `[0, 0.99]`, densities to `>= 0`); implementors need not guard them.
//! - Nothing in this module performs I/O or logging.
//!
//! Downstream usage
//! ----------------
//! - `ipm::kernel` evaluates a [`VitalRates`] model on a [`StateGrid`].
//! - `ipm::eigen` consumes [`PowerOptions`].
//! - `ipm::demvar` and the simulators turn `u`/`v` vectors into
//!   [`TableFunction`]s and [`QuantileFunction`]s.

pub mod grid;
pub mod interp;
pub mod options;
pub mod validation;
pub mod vital_rates;

// ---- Re-exports (primary surface) -----------------------------------------

pub use self::grid::StateGrid;
pub use self::interp::{QuantileFunction, TableFunction};
pub use self::options::{DemVarOptions, PowerOptions, ToleranceMode};
pub use self::vital_rates::{VitalRates, clamp_survival};

/// Upper bound applied to survival probabilities everywhere in the crate.
pub const MAX_SURVIVAL: f64 = 0.99;
