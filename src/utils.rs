//! Python conversion helpers shared by the PyO3 bindings.
//!
//! Everything here is compiled only with the `python-bindings` feature and
//! turns loosely typed Python arguments into validated Rust option structs.
#[cfg(feature = "python-bindings")]
use pyo3::{
    exceptions::{PyKeyError, PyTypeError},
    prelude::*,
    types::{PyAny, PyDict},
};

#[cfg(feature = "python-bindings")]
use crate::{
    ipm::{
        core::{PowerOptions, ToleranceMode},
        models::{SizeModelParams, SizeStructuredModel},
    },
    simulation::EnsembleOpts,
};

#[cfg(feature = "python-bindings")]
use numpy::{
    IntoPyArray,    // Vec → PyArray
    PyArrayMethods, // .readonly()
    PyReadonlyArray1,
};

/// Accept a contiguous float64 ndarray, anything with `.to_numpy()`, or a
/// plain sequence of floats.
#[cfg(feature = "python-bindings")]
#[inline]
pub fn extract_f64_array<'py>(
    py: Python<'py>, raw: &Bound<'py, PyAny>,
) -> PyResult<PyReadonlyArray1<'py, f64>> {
    if let Ok(arr_ro) = raw.extract::<PyReadonlyArray1<f64>>() {
        if arr_ro.as_slice().is_ok() {
            return Ok(arr_ro);
        }
    }

    if let Ok(obj) = raw.call_method("to_numpy", (false,), None) {
        if let Ok(series_ro) = obj.extract::<PyReadonlyArray1<f64>>() {
            if series_ro.as_slice().is_ok() {
                return Ok(series_ro);
            }
        }
    }

    let vec: Vec<f64> = raw.extract().map_err(|_| {
        PyTypeError::new_err("expected a 1-D numpy.ndarray, pandas.Series, or sequence of float64")
    })?;
    Ok(vec.into_pyarray(py).readonly())
}

/// Build the reference size model from an optional dict of parameter
/// overrides; missing keys keep their defaults.
#[cfg(feature = "python-bindings")]
pub fn build_size_model(params: Option<&Bound<'_, PyDict>>) -> PyResult<SizeStructuredModel> {
    let mut p = SizeModelParams::default();
    if let Some(dict) = params {
        for (key, value) in dict.iter() {
            let key: String = key.extract()?;
            let value: f64 = value.extract()?;
            let slot = match key.as_str() {
                "surv_intercept" => &mut p.surv_intercept,
                "surv_slope" => &mut p.surv_slope,
                "fec_intercept" => &mut p.fec_intercept,
                "fec_slope" => &mut p.fec_slope,
                "growth_intercept" => &mut p.growth_intercept,
                "growth_slope" => &mut p.growth_slope,
                "growth_sd" => &mut p.growth_sd,
                "offspring_mean" => &mut p.offspring_mean,
                "offspring_sd" => &mut p.offspring_sd,
                "env_survival" => &mut p.env_survival,
                "env_growth" => &mut p.env_growth,
                other => {
                    return Err(PyKeyError::new_err(format!("unknown model parameter '{other}'")));
                }
            };
            *slot = value;
        }
    }
    Ok(SizeStructuredModel::new(p)?)
}

#[cfg(feature = "python-bindings")]
pub fn extract_power_options(
    tol: Option<f64>, max_iter: Option<usize>, relative: bool, verbose: bool,
) -> PyResult<PowerOptions> {
    let defaults = PowerOptions::default();
    let mode = if relative { ToleranceMode::Relative } else { ToleranceMode::Absolute };
    let opts = PowerOptions::new(
        tol.unwrap_or(defaults.tol),
        max_iter.unwrap_or(defaults.max_iter),
        mode,
    )?;
    Ok(opts.with_verbose(verbose))
}

#[cfg(feature = "python-bindings")]
pub fn extract_ensemble_options(
    n_sim: usize, seed: Option<u64>, n_threads: Option<usize>, verbose: bool,
) -> PyResult<EnsembleOpts> {
    Ok(EnsembleOpts::new(n_sim, seed, n_threads)?.with_verbose(verbose))
}
