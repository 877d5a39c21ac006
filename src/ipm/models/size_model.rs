//! Size-structured reference model with logistic survival and Gaussian growth.
//!
//! Vital rates as functions of body size `x` and environment `z`:
//!
//! - survival `s(x, z) = logistic(a_s + b_s·x + e_s·z)`
//! - fecundity `b(x) = exp(a_b + b_b·x)`
//! - growth `y | x ~ Normal(a_g + b_g·x + e_g·z, σ_g)`
//! - offspring size `y ~ Normal(μ_o, σ_o)`, independent of the parent.
//!
//! `z = None` is treated as `z = 0`. Offspring counts are Poisson (the trait
//! default), so the offspring-count variance equals the fecundity.
use crate::ipm::{
    core::{
        validation::{validate_finite, validate_positive},
        vital_rates::VitalRates,
    },
    errors::IPMResult,
};
use rand::Rng;
use rand_distr::StandardNormal;
use statrs::distribution::{Continuous, Normal};

/// Parameters of [`SizeStructuredModel`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SizeModelParams {
    pub surv_intercept: f64,
    pub surv_slope: f64,
    pub fec_intercept: f64,
    pub fec_slope: f64,
    pub growth_intercept: f64,
    pub growth_slope: f64,
    pub growth_sd: f64,
    pub offspring_mean: f64,
    pub offspring_sd: f64,
    /// Additive effect of `z` on the survival linear predictor.
    pub env_survival: f64,
    /// Additive effect of `z` on the mean next size.
    pub env_growth: f64,
}

impl Default for SizeModelParams {
    fn default() -> Self {
        SizeModelParams {
            surv_intercept: -1.0,
            surv_slope: 0.3,
            fec_intercept: -4.0,
            fec_slope: 0.2,
            growth_intercept: 1.5,
            growth_slope: 0.85,
            growth_sd: 1.2,
            offspring_mean: 2.0,
            offspring_sd: 0.8,
            env_survival: 0.5,
            env_growth: 0.5,
        }
    }
}

/// Reference size-structured IPM.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SizeStructuredModel {
    params: SizeModelParams,
}

impl SizeStructuredModel {
    /// Validate parameters and build the model.
    ///
    /// # Errors
    /// [`IPMError::InvalidParam`](crate::ipm::errors::IPMError::InvalidParam)
    /// if any coefficient is non-finite or a standard deviation is ≤ 0.
    pub fn new(params: SizeModelParams) -> IPMResult<Self> {
        validate_finite("surv_intercept", params.surv_intercept)?;
        validate_finite("surv_slope", params.surv_slope)?;
        validate_finite("fec_intercept", params.fec_intercept)?;
        validate_finite("fec_slope", params.fec_slope)?;
        validate_finite("growth_intercept", params.growth_intercept)?;
        validate_finite("growth_slope", params.growth_slope)?;
        validate_positive("growth_sd", params.growth_sd)?;
        validate_finite("offspring_mean", params.offspring_mean)?;
        validate_positive("offspring_sd", params.offspring_sd)?;
        validate_finite("env_survival", params.env_survival)?;
        validate_finite("env_growth", params.env_growth)?;
        Ok(SizeStructuredModel { params })
    }

    pub fn params(&self) -> &SizeModelParams {
        &self.params
    }

    /// Mean next size of a survivor at `x`.
    #[inline]
    pub fn growth_mean(&self, x: f64, z: Option<f64>) -> f64 {
        let p = &self.params;
        p.growth_intercept + p.growth_slope * x + p.env_growth * z.unwrap_or(0.0)
    }
}

impl Default for SizeStructuredModel {
    fn default() -> Self {
        SizeStructuredModel { params: SizeModelParams::default() }
    }
}

#[inline]
fn normal_pdf(mean: f64, sd: f64, y: f64) -> f64 {
    // sd is validated at construction; a non-finite mean has no density.
    Normal::new(mean, sd).map(|d| d.pdf(y)).unwrap_or(0.0)
}

impl VitalRates for SizeStructuredModel {
    fn survival(&self, x: f64, z: Option<f64>) -> f64 {
        let p = &self.params;
        let eta = p.surv_intercept + p.surv_slope * x + p.env_survival * z.unwrap_or(0.0);
        1.0 / (1.0 + (-eta).exp())
    }

    fn fecundity(&self, x: f64, _z: Option<f64>) -> f64 {
        let p = &self.params;
        (p.fec_intercept + p.fec_slope * x).exp()
    }

    fn growth_density(&self, x: f64, y: f64, z: Option<f64>) -> f64 {
        normal_pdf(self.growth_mean(x, z), self.params.growth_sd, y)
    }

    fn offspring_density(&self, _x: f64, y: f64, _z: Option<f64>) -> f64 {
        normal_pdf(self.params.offspring_mean, self.params.offspring_sd, y)
    }

    fn sample_growth<R: Rng + ?Sized>(&self, x: f64, z: Option<f64>, rng: &mut R) -> f64 {
        let eps: f64 = rng.sample(StandardNormal);
        self.growth_mean(x, z) + self.params.growth_sd * eps
    }

    fn sample_offspring_state<R: Rng + ?Sized>(
        &self, _x: f64, _z: Option<f64>, rng: &mut R,
    ) -> f64 {
        let eps: f64 = rng.sample(StandardNormal);
        self.params.offspring_mean + self.params.offspring_sd * eps
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    // Purpose
    // -------
    // Check the closed-form vital rates at a few sizes.
    //
    // Given
    // -----
    // - Default parameters.
    //
    // Expect
    // ------
    // - s(10) = logistic(2), b(10) = exp(-2), growth density peaks at the
    //   mean 10 with value 1/(σ√(2π)).
    fn default_rates_match_closed_forms() {
        // Arrange
        let m = SizeStructuredModel::default();

        // Act / Assert
        assert_abs_diff_eq!(m.survival(10.0, None), 1.0 / (1.0 + (-2.0f64).exp()), epsilon = 1e-12);
        assert_abs_diff_eq!(m.fecundity(10.0, None), (-2.0f64).exp(), epsilon = 1e-12);
        let peak = 1.0 / (1.2 * (2.0 * std::f64::consts::PI).sqrt());
        assert_abs_diff_eq!(m.growth_density(10.0, 10.0, None), peak, epsilon = 1e-12);
    }

    #[test]
    // Purpose
    // -------
    // The environment shifts survival and the growth mean; `None` equals
    // `Some(0.0)`.
    fn environment_shifts_survival_and_growth() {
        let m = SizeStructuredModel::default();
        assert_eq!(m.survival(5.0, None), m.survival(5.0, Some(0.0)));
        assert!(m.survival(5.0, Some(1.0)) > m.survival(5.0, None));
        assert_abs_diff_eq!(m.growth_mean(5.0, Some(2.0)) - m.growth_mean(5.0, None), 1.0);
    }

    #[test]
    // Purpose
    // -------
    // Growth draws should have the model's mean and standard deviation.
    fn growth_samples_match_moments() {
        // Arrange
        let m = SizeStructuredModel::default();
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        let n = 20_000;

        // Act
        let draws: Vec<f64> = (0..n).map(|_| m.sample_growth(4.0, None, &mut rng)).collect();
        let mean = draws.iter().sum::<f64>() / n as f64;
        let var = draws.iter().map(|d| (d - mean).powi(2)).sum::<f64>() / (n - 1) as f64;

        // Assert
        assert!((mean - m.growth_mean(4.0, None)).abs() < 0.05, "mean {mean}");
        assert!((var.sqrt() - 1.2).abs() < 0.05, "sd {}", var.sqrt());
    }

    #[test]
    fn new_rejects_non_positive_sd() {
        let params = SizeModelParams { growth_sd: 0.0, ..SizeModelParams::default() };
        assert!(SizeStructuredModel::new(params).is_err());
        let params = SizeModelParams { offspring_mean: f64::NAN, ..SizeModelParams::default() };
        assert!(SizeStructuredModel::new(params).is_err());
    }
}
