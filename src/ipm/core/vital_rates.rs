//! Vital-rate functions — the leaves of the IPM dependency graph.
//!
//! Purpose
//! -------
//! Describe an individual's one-step demography as a function of its
//! continuous state `x` (e.g. body size) and an optional environment value
//! `z`: survival probability, expected offspring number, and the transition
//! densities for surviving adults and for offspring. The same trait carries
//! the sampling hooks the individual-based simulator needs, so a model is
//! written once and used by both the deterministic kernel and the stochastic
//! simulators.
//!
//! Key behaviors
//! -------------
//! - [`VitalRates::survival`], [`VitalRates::fecundity`],
//!   [`VitalRates::growth_density`], [`VitalRates::offspring_density`] feed
//!   the kernel discretizer and the demographic-variance calculator.
//! - [`VitalRates::offspring_variance`] defaults to the fecundity itself
//!   (Poisson offspring counts: variance = mean) and
//!   [`VitalRates::survival_fecundity_covariance`] defaults to zero.
//! - [`VitalRates::sample_growth`], [`VitalRates::sample_offspring_state`]
//!   and [`VitalRates::sample_offspring_count`] drive the structured
//!   simulator; the count defaults to a Poisson draw with mean
//!   `fecundity(x, z)`.
//!
//! Invariants & assumptions
//! ------------------------
//! - Implementations are pure functions of their arguments (plus the RNG for
//!   the sampling hooks). No interior mutability; implementors must be `Sync`
//!   to be shared across parallel realizations.
//! - Raw outputs may leave their natural range (survival above 1, slightly
//!   negative densities from approximations). Consumers clamp; implementors
//!   do not have to.
//!
//! Conventions
//! -----------
//! - Density arguments are ordered `(x, y, z)`: source state `x`, target
//!   state `y`, environment `z`. This matches the kernel layout where column
//!   `j` is the source and row `i` the target.
//! - `z = None` means "no environmental effect".
use rand::Rng;
use rand_distr::{Distribution, Poisson};

/// Demographic rates of an individual with state `x` in environment `z`.
pub trait VitalRates {
    /// Probability of surviving one time step.
    fn survival(&self, x: f64, z: Option<f64>) -> f64;

    /// Expected number of offspring produced in one time step.
    fn fecundity(&self, x: f64, z: Option<f64>) -> f64;

    /// Density of next state `y` for a surviving individual currently at `x`.
    fn growth_density(&self, x: f64, y: f64, z: Option<f64>) -> f64;

    /// Density of an offspring's initial state `y` given parent state `x`.
    fn offspring_density(&self, x: f64, y: f64, z: Option<f64>) -> f64;

    /// Variance of the offspring count. Poisson counts: equals the mean.
    fn offspring_variance(&self, x: f64, z: Option<f64>) -> f64 {
        self.fecundity(x, z)
    }

    /// Covariance between survival and offspring count.
    fn survival_fecundity_covariance(&self, _x: f64, _z: Option<f64>) -> f64 {
        0.0
    }

    /// Draw the next state of a survivor currently at `x`.
    fn sample_growth<R: Rng + ?Sized>(&self, x: f64, z: Option<f64>, rng: &mut R) -> f64;

    /// Draw the initial state of one offspring of a parent at `x`.
    fn sample_offspring_state<R: Rng + ?Sized>(&self, x: f64, z: Option<f64>, rng: &mut R)
    -> f64;

    /// Draw the number of offspring of an individual at `x`.
    ///
    /// Poisson with mean `fecundity(x, z)`; a non-positive or non-finite mean
    /// yields zero offspring.
    fn sample_offspring_count<R: Rng + ?Sized>(
        &self, x: f64, z: Option<f64>, rng: &mut R,
    ) -> usize {
        let mean = self.fecundity(x, z);
        if !(mean.is_finite() && mean > 0.0) {
            return 0;
        }
        match Poisson::new(mean) {
            Ok(dist) => {
                let draw: f64 = dist.sample(rng);
                draw as usize
            }
            Err(_) => 0,
        }
    }
}

/// Clamp a raw survival value into `[0, max]`; NaN maps to 0.
///
/// `max` is below 1 in the kernel and simulators so that every state keeps a
/// nonzero exit probability.
#[inline]
pub fn clamp_survival(s: f64, max: f64) -> f64 {
    if s.is_nan() { 0.0 } else { s.clamp(0.0, max) }
}
