//! Individual-based simulation of the structured population.
//!
//! Purpose
//! -------
//! Follow every individual of a finite population through the stochastic
//! version of the model behind the kernel: Poisson offspring with sampled
//! offspring states, Bernoulli survival, and sampled growth of survivors.
//! Each realization records the population's total reproductive value
//! `Σ v(x)` at every time step.
//!
//! Key behaviors
//! -------------
//! - Initial states are `n0` inverse-CDF draws from the stable distribution
//!   `u`; column 0 records their total reproductive value.
//! - One step: (a) offspring counts and states from the parents' current
//!   states, (b) survival with probability clamped to `[0, 0.99]`,
//!   (c) growth of survivors, (d) survivors and offspring are merged and
//!   (e) clamped to `[L, U]`, (f) the new total is recorded.
//! - A realization stops once its total is `<= 1` (quasi-extinction) or
//!   exceeds `v_max`; its remaining columns repeat the last recorded value.
//!
//! Invariants & assumptions
//! ------------------------
//! - `u` and `v` are grid-aligned (same length as the grid); `v` is
//!   interpolated piecewise-linearly between grid points.
//! - Realization `r` draws from its own stream, so ensembles are identical
//!   for any thread count.
use crate::ipm::core::{
    MAX_SURVIVAL, QuantileFunction, StateGrid, TableFunction, VitalRates, clamp_survival,
    validation::validate_vector,
};
use crate::simulation::{
    ensemble::TrajectoryEnsemble,
    errors::{SimError, SimResult},
    options::{EnsembleOpts, StructuredOpts},
    streams::{realization_rng, run_ensemble},
};
use ndarray::{Array2, ArrayView1};
use rand::Rng;

/// Precomputed samplers shared by every realization.
struct Setup<'a, M> {
    model: &'a M,
    grid: &'a StateGrid,
    z: Option<f64>,
    initial: QuantileFunction,
    v_fn: TableFunction,
    opts: &'a StructuredOpts,
}

impl<'a, M: VitalRates> Setup<'a, M> {
    fn new(
        model: &'a M, grid: &'a StateGrid, u: ArrayView1<'_, f64>, v: ArrayView1<'_, f64>,
        z: Option<f64>, opts: &'a StructuredOpts,
    ) -> SimResult<Self> {
        validate_vector(u, grid.len())?;
        validate_vector(v, grid.len())?;
        let initial = QuantileFunction::from_density(grid.points().view(), u)?;
        let v_fn = TableFunction::new(grid.points().clone(), v.to_owned())?;
        Ok(Setup { model, grid, z, initial, v_fn, opts })
    }

    fn total_value(&self, states: &[f64]) -> f64 {
        states.iter().map(|&x| self.v_fn.eval(x)).sum()
    }

    fn stops(&self, total: f64) -> bool {
        total <= 1.0 || total > self.opts.v_max
    }

    /// One time step of the whole population.
    fn step<R: Rng + ?Sized>(&self, states: &[f64], rng: &mut R) -> Vec<f64> {
        let mut offspring = Vec::new();
        for &x in states {
            let count = self.model.sample_offspring_count(x, self.z, rng);
            for _ in 0..count {
                offspring.push(self.model.sample_offspring_state(x, self.z, rng));
            }
        }

        let mut next = Vec::with_capacity(states.len() + offspring.len());
        for &x in states {
            let s = clamp_survival(self.model.survival(x, self.z), MAX_SURVIVAL);
            if rng.gen::<f64>() < s {
                next.push(self.model.sample_growth(x, self.z, rng));
            }
        }
        next.extend(offspring);
        for x in next.iter_mut() {
            *x = self.grid.clamp(*x);
        }
        next
    }

    /// Run one realization, writing totals into `record` (length `t_max + 1`)
    /// and returning the final population states.
    fn run<R: Rng + ?Sized>(&self, rng: &mut R, record: &mut [f64]) -> Vec<f64> {
        let mut states = self.initial.sample_n(self.opts.n0, rng);
        let mut total = self.total_value(&states);
        record[0] = total;

        let mut t = 1;
        while t < record.len() && !self.stops(total) {
            states = self.step(&states, rng);
            total = self.total_value(&states);
            record[t] = total;
            t += 1;
        }
        for cell in record.iter_mut().skip(t) {
            *cell = total;
        }
        states
    }
}

/// Simulate `ensemble.n_sim` realizations; one row per realization,
/// `t_max + 1` columns of total reproductive value.
///
/// # Errors
/// - [`SimError::Model`] if `u` or `v` do not match the grid, contain
///   non-finite values, or `u` has no positive mass.
/// - [`SimError::ThreadPool`] if a dedicated pool could not be built.
pub fn simulate_structured<M: VitalRates + Sync>(
    model: &M, grid: &StateGrid, u: ArrayView1<'_, f64>, v: ArrayView1<'_, f64>, z: Option<f64>,
    opts: &StructuredOpts, ensemble: &EnsembleOpts,
) -> SimResult<TrajectoryEnsemble> {
    let setup = Setup::new(model, grid, u, v, z, opts)?;
    let n_times = opts.t_max + 1;

    let mut data = Array2::zeros((ensemble.n_sim, n_times));
    let buffer = data.as_slice_mut().ok_or(SimError::InvalidArgument {
        name: "data",
        reason: "trajectory buffer is not contiguous",
    })?;
    run_ensemble(buffer, n_times, ensemble, |_, rng, row| {
        setup.run(rng, row);
    })?;

    #[cfg(feature = "obs_slog")]
    if ensemble.verbose {
        let log = crate::observe::term_logger("structured");
        let last = data.column(opts.t_max);
        let extinct = last.iter().filter(|&&x| x <= 1.0).count();
        let capped = last.iter().filter(|&&x| x > opts.v_max).count();
        slog::info!(log, "structured ensemble finished";
            "n_sim" => ensemble.n_sim, "t_max" => opts.t_max,
            "quasi_extinct" => extinct, "above_v_max" => capped);
    }
    Ok(TrajectoryEnsemble::from_data(data))
}

/// Final individual states of realization 0 under `seed`.
///
/// Uses the same stream as row 0 of [`simulate_structured`] with the same
/// seed, so the returned population's total reproductive value equals that
/// row's last column.
///
/// # Errors
/// Same input checks as [`simulate_structured`].
pub fn simulate_population<M: VitalRates>(
    model: &M, grid: &StateGrid, u: ArrayView1<'_, f64>, v: ArrayView1<'_, f64>, z: Option<f64>,
    opts: &StructuredOpts, seed: Option<u64>,
) -> SimResult<Vec<f64>> {
    let setup = Setup::new(model, grid, u, v, z, opts)?;
    let mut rng = realization_rng(seed, 0);
    let mut record = vec![0.0; opts.t_max + 1];
    Ok(setup.run(&mut rng, &mut record))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ipm::errors::IPMError;
    use crate::ipm::models::SizeStructuredModel;
    use approx::assert_abs_diff_eq;
    use ndarray::Array1;

    /// Survivors grow by one unit; offspring counts are fixed.
    struct Toy {
        survival: f64,
        kids: usize,
    }

    impl VitalRates for Toy {
        fn survival(&self, _x: f64, _z: Option<f64>) -> f64 {
            self.survival
        }
        fn fecundity(&self, _x: f64, _z: Option<f64>) -> f64 {
            self.kids as f64
        }
        fn growth_density(&self, _x: f64, _y: f64, _z: Option<f64>) -> f64 {
            1.0
        }
        fn offspring_density(&self, _x: f64, _y: f64, _z: Option<f64>) -> f64 {
            1.0
        }
        fn sample_growth<R: Rng + ?Sized>(&self, x: f64, _z: Option<f64>, _rng: &mut R) -> f64 {
            x + 1.0
        }
        fn sample_offspring_state<R: Rng + ?Sized>(
            &self, _x: f64, _z: Option<f64>, _rng: &mut R,
        ) -> f64 {
            1.0
        }
        fn sample_offspring_count<R: Rng + ?Sized>(
            &self, _x: f64, _z: Option<f64>, _rng: &mut R,
        ) -> usize {
            self.kids
        }
    }

    fn flat(grid: &StateGrid) -> Array1<f64> {
        Array1::ones(grid.len())
    }

    #[test]
    // Purpose
    // -------
    // A population with no survival and no offspring dies in one step and the
    // zero total is carried to the horizon.
    fn extinct_population_pads_with_last_total() {
        // Arrange
        let grid = StateGrid::new(0.0, 5.0, 6).unwrap();
        let model = Toy { survival: 0.0, kids: 0 };
        let opts = StructuredOpts::new(10, 8, 1e6).unwrap();
        let ens = EnsembleOpts::new(4, Some(5), None).unwrap();

        // Act
        let out = simulate_structured(
            &model, &grid, flat(&grid).view(), flat(&grid).view(), None, &opts, &ens,
        )
        .unwrap();

        // Assert
        assert_eq!((out.n_sim(), out.n_times()), (4, 9));
        for r in 0..4 {
            assert_abs_diff_eq!(out.trajectory(r)[0], 10.0, epsilon = 1e-12);
            assert!(out.trajectory(r).iter().skip(1).all(|&x| x == 0.0));
        }
        assert_abs_diff_eq!(out.fraction_at_or_below(1.0, 8).unwrap(), 1.0);
    }

    #[test]
    // Purpose
    // -------
    // A population whose initial total is already at the quasi-extinction
    // level stops at column 0 and carries that positive total, not zero.
    fn quasi_extinct_start_pads_with_initial_total() {
        // Arrange
        let grid = StateGrid::new(0.0, 5.0, 6).unwrap();
        let model = Toy { survival: 0.99, kids: 0 };
        let half = Array1::from_elem(grid.len(), 0.5);
        let opts = StructuredOpts::new(2, 10, 1e6).unwrap();
        let ens = EnsembleOpts::new(5, Some(13), None).unwrap();

        // Act
        let out =
            simulate_structured(&model, &grid, flat(&grid).view(), half.view(), None, &opts, &ens)
                .unwrap();

        // Assert
        for r in 0..out.n_sim() {
            assert!(out.trajectory(r).iter().all(|&x| x == 1.0), "row {r}: {:?}", out.trajectory(r));
        }
    }

    #[test]
    // Purpose
    // -------
    // A run that falls to a positive total at or below 1 mid-way repeats that
    // total, not zero, for the rest of the horizon.
    //
    // Given
    // -----
    // - Three individuals at x = 0; survivors move up one grid point per
    //   step; v decays with x, so the total is at most 3.0, 1.5, 0.6.
    //
    // Expect
    // ------
    // - The stop happens by step 2 at a value in (0, 1].
    // - Every later column equals the value at the stopping step.
    fn mid_run_stop_pads_with_positive_total() {
        // Arrange
        let grid = StateGrid::new(0.0, 5.0, 6).unwrap();
        let model = Toy { survival: 0.99, kids: 0 };
        let mut u = Array1::zeros(grid.len());
        u[0] = 1.0;
        let v = Array1::from(vec![1.0, 0.5, 0.2, 0.05, 0.01, 0.01]);
        let opts = StructuredOpts::new(3, 12, 1e6).unwrap();
        let ens = EnsembleOpts::new(6, Some(17), None).unwrap();

        // Act
        let out = simulate_structured(&model, &grid, u.view(), v.view(), None, &opts, &ens).unwrap();

        // Assert
        for r in 0..out.n_sim() {
            let path = out.trajectory(r);
            assert_abs_diff_eq!(path[0], 3.0, epsilon = 1e-12);
            let hit = path.iter().position(|&x| x <= 1.0).unwrap();
            assert!((1..=2).contains(&hit), "row {r} stopped at {hit}");
            assert!(path[hit] > 0.0 && path[hit] <= 1.0, "row {r}: {}", path[hit]);
            assert!(path.iter().skip(hit).all(|&x| x == path[hit]));
        }
    }

    #[test]
    // Purpose
    // -------
    // Once the total exceeds v_max the realization stops and repeats that
    // total for every remaining column.
    fn capped_population_pads_after_exceeding_v_max() {
        // Arrange
        let grid = StateGrid::new(0.0, 5.0, 6).unwrap();
        let model = Toy { survival: 1.0, kids: 3 };
        let opts = StructuredOpts::new(10, 12, 50.0).unwrap();
        let ens = EnsembleOpts::new(3, Some(7), None).unwrap();

        // Act
        let out = simulate_structured(
            &model, &grid, flat(&grid).view(), flat(&grid).view(), None, &opts, &ens,
        )
        .unwrap();

        // Assert
        for r in 0..out.n_sim() {
            let path = out.trajectory(r);
            let hit = path.iter().position(|&x| x > 50.0).unwrap();
            assert!(hit <= 2, "stopped late at {hit}");
            assert!(path.iter().skip(hit).all(|&x| x == path[hit]));
        }
    }

    #[test]
    // Purpose
    // -------
    // States are clamped to the grid bounds after growth.
    fn population_states_stay_within_grid() {
        let grid = StateGrid::new(0.0, 5.0, 6).unwrap();
        let model = Toy { survival: 1.0, kids: 0 };
        let opts = StructuredOpts::new(20, 10, 1e6).unwrap();

        let states = simulate_population(
            &model, &grid, flat(&grid).view(), flat(&grid).view(), None, &opts, Some(1),
        )
        .unwrap();

        // Survival 1 is clamped to 0.99, so some individuals die over 10 steps.
        assert!(states.len() <= 20);
        assert!(states.iter().all(|&x| (0.0..=5.0).contains(&x)));
    }

    #[test]
    // Purpose
    // -------
    // The reference model gives the same ensemble on one thread and on
    // several, and simulate_population matches row 0.
    fn reference_model_is_reproducible_across_threads() {
        // Arrange
        let model = SizeStructuredModel::default();
        let grid = StateGrid::new(0.0, 20.0, 50).unwrap();
        let u = Array1::from_elem(50, 1.0 / 50.0);
        let v = Array1::from_elem(50, 1.0);
        let opts = StructuredOpts::new(30, 15, 1e4).unwrap();
        let one = EnsembleOpts::new(12, Some(21), Some(1)).unwrap();
        let many = EnsembleOpts::new(12, Some(21), Some(4)).unwrap();

        // Act
        let a = simulate_structured(&model, &grid, u.view(), v.view(), None, &opts, &one).unwrap();
        let b = simulate_structured(&model, &grid, u.view(), v.view(), None, &opts, &many).unwrap();
        let pop =
            simulate_population(&model, &grid, u.view(), v.view(), None, &opts, Some(21)).unwrap();

        // Assert
        assert_eq!(a, b);
        assert_abs_diff_eq!(pop.len() as f64, a.final_values()[0], epsilon = 1e-9);
    }

    #[test]
    fn mismatched_reproductive_value_is_rejected() {
        let grid = StateGrid::new(0.0, 5.0, 6).unwrap();
        let model = Toy { survival: 0.5, kids: 1 };
        let opts = StructuredOpts::new(5, 3, 100.0).unwrap();
        let short = Array1::ones(4);

        let err = simulate_structured(
            &model, &grid, flat(&grid).view(), short.view(), None, &opts, &EnsembleOpts::default(),
        )
        .unwrap_err();

        assert_eq!(err, SimError::Model(IPMError::LengthMismatch { expected: 6, actual: 4 }));
    }
}
