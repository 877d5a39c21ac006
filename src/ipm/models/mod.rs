//! models — concrete vital-rate models.
//!
//! Currently provides [`SizeStructuredModel`], a body-size IPM with logistic
//! survival, log-linear Poisson fecundity, and Gaussian growth and offspring
//! size. Custom models implement [`VitalRates`](crate::ipm::core::VitalRates)
//! directly and plug into the same kernel, eigen, and simulation code.

pub mod size_model;

pub use self::size_model::{SizeModelParams, SizeStructuredModel};
