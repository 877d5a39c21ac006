//! Trajectory ensembles produced by the simulators.
//!
//! A [`TrajectoryEnsemble`] stores one realization per row and one recorded
//! whole time unit per column. Summary helpers give per-time quantile bands
//! and the fraction of realizations at or below a threshold (extinction
//! fraction when the threshold is the absorbing level).
use crate::simulation::errors::{SimError, SimResult};
use ndarray::{Array1, Array2, ArrayView1, Axis};

#[derive(Debug, Clone, PartialEq)]
pub struct TrajectoryEnsemble {
    data: Array2<f64>,
}

impl TrajectoryEnsemble {
    pub(crate) fn from_data(data: Array2<f64>) -> Self {
        TrajectoryEnsemble { data }
    }

    pub fn data(&self) -> &Array2<f64> {
        &self.data
    }

    pub fn into_data(self) -> Array2<f64> {
        self.data
    }

    pub fn n_sim(&self) -> usize {
        self.data.nrows()
    }

    pub fn n_times(&self) -> usize {
        self.data.ncols()
    }

    /// Recorded values of realization `r`.
    ///
    /// # Panics
    /// If `r >= n_sim()`.
    pub fn trajectory(&self, r: usize) -> ArrayView1<'_, f64> {
        self.data.row(r)
    }

    /// Last recorded value of every realization.
    pub fn final_values(&self) -> Array1<f64> {
        match self.n_times() {
            0 => Array1::zeros(self.n_sim()),
            n => self.data.column(n - 1).to_owned(),
        }
    }

    /// Per-time quantile bands, one row per probability in `probs`.
    ///
    /// Uses linear interpolation between order statistics (sample quantile
    /// type 7). NaN values are ignored; a column with no finite values yields
    /// NaN.
    ///
    /// # Errors
    /// [`SimError::InvalidParam`] if any probability lies outside `[0, 1]`.
    pub fn quantiles(&self, probs: &[f64]) -> SimResult<Array2<f64>> {
        if let Some(&p) = probs.iter().find(|p| !(0.0..=1.0).contains(*p)) {
            return Err(SimError::InvalidParam {
                name: "probs",
                value: p,
                reason: "quantile probabilities must be in [0, 1]",
            });
        }

        let mut out = Array2::from_elem((probs.len(), self.n_times()), f64::NAN);
        for (t, column) in self.data.axis_iter(Axis(1)).enumerate() {
            let mut sorted: Vec<f64> = column.iter().copied().filter(|x| !x.is_nan()).collect();
            if sorted.is_empty() {
                continue;
            }
            sorted.sort_by(|a, b| a.total_cmp(b));
            for (k, &p) in probs.iter().enumerate() {
                out[[k, t]] = type7_quantile(&sorted, p);
            }
        }
        Ok(out)
    }

    /// Fraction of realizations whose value at time `t` is `<= threshold`.
    ///
    /// # Errors
    /// [`SimError::InvalidArgument`] if `t >= n_times()`.
    pub fn fraction_at_or_below(&self, threshold: f64, t: usize) -> SimResult<f64> {
        if t >= self.n_times() {
            return Err(SimError::InvalidArgument {
                name: "t",
                reason: "time index beyond recorded horizon",
            });
        }
        if self.n_sim() == 0 {
            return Ok(0.0);
        }
        let hits = self.data.column(t).iter().filter(|&&x| x <= threshold).count();
        Ok(hits as f64 / self.n_sim() as f64)
    }
}

/// `sorted` is non-empty and ascending.
fn type7_quantile(sorted: &[f64], p: f64) -> f64 {
    let h = (sorted.len() - 1) as f64 * p;
    let lo = h.floor() as usize;
    let hi = h.ceil() as usize;
    sorted[lo] + (h - lo as f64) * (sorted[hi] - sorted[lo])
}
