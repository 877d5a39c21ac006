//! Per-realization random streams and the parallel ensemble driver.
//!
//! Every realization `r` owns a `ChaCha8Rng` seeded with
//! `derive_seed(seed, r)` (a SplitMix64 finalizer over the master seed and
//! the realization index). Streams are therefore independent of scheduling:
//! the same seed yields the same ensemble on one thread or many.
use crate::simulation::{
    errors::{SimError, SimResult},
    options::EnsembleOpts,
};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rayon::{ThreadPoolBuilder, prelude::*};

const GOLDEN_GAMMA: u64 = 0x9E37_79B9_7F4A_7C15;
const DEFAULT_BASE_SEED: u64 = 0xDEAD_BEEF_CAFE_BABE;

/// Seed for realization `index` under master seed `seed`.
pub fn derive_seed(seed: Option<u64>, index: u64) -> u64 {
    let base = seed.unwrap_or(DEFAULT_BASE_SEED);
    // SplitMix64
    let mut z = (base ^ index.wrapping_mul(GOLDEN_GAMMA)).wrapping_add(GOLDEN_GAMMA);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

/// Random stream of realization `index`.
pub fn realization_rng(seed: Option<u64>, index: usize) -> ChaCha8Rng {
    ChaCha8Rng::seed_from_u64(derive_seed(seed, index as u64))
}

/// Fill `data` (row-major, `n_sim` rows of `stride` values) by running
/// `fill(index, rng, row)` for every realization in parallel.
///
/// Runs on the global rayon pool, or on a dedicated pool when
/// `opts.n_threads` is set.
///
/// # Errors
/// [`SimError::ThreadPool`] if the dedicated pool cannot be built.
pub(crate) fn run_ensemble<F>(
    data: &mut [f64], stride: usize, opts: &EnsembleOpts, fill: F,
) -> SimResult<()>
where
    F: Fn(usize, &mut ChaCha8Rng, &mut [f64]) + Sync + Send,
{
    let mut simulate = || {
        data.par_chunks_mut(stride).enumerate().for_each(|(index, row)| {
            let mut rng = realization_rng(opts.seed, index);
            fill(index, &mut rng, row);
        });
    };

    match opts.n_threads {
        Some(n) => ThreadPoolBuilder::new()
            .num_threads(n)
            .build()
            .map_err(|e| SimError::ThreadPool(e.to_string()))?
            .install(simulate),
        None => simulate(),
    }
    Ok(())
}
