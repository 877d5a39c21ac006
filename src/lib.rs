//! rust_ipm — integral projection models and population simulators with
//! Python bindings.
//!
//! Purpose
//! -------
//! Serve as the crate root for Rust callers and as the PyO3 bridge that exposes
//! the IPM pipeline to Python via the `_rust_ipm` extension module. When the
//! `python-bindings` feature is enabled, this module defines the
//! Python-facing classes and submodules used by the `rust_ipm` package.
//!
//! Key behaviors
//! -------------
//! - Re-export the core Rust modules (`ipm` and `simulation`) as the public
//!   crate surface.
//! - Define the `IPM` `#[pyclass]`, the simulation `#[pyfunction]`s, and the
//!   `#[pymodule]` initializer for the `_rust_ipm` Python extension.
//! - Register the `ipm` and `simulation` submodules under `rust_ipm` so that
//!   dot-notation imports work as expected.
//!
//! Invariants & assumptions
//! ------------------------
//! - All numerical work is implemented in the inner Rust modules; this file
//!   performs only FFI glue, argument conversion, and error mapping.
//! - Python-visible defaults mirror the Rust `Default` impls
//!   (`PowerOptions`, `EnsembleOpts`).
//!
//! Downstream usage
//! ----------------
//! - Native Rust code depends on [`ipm`] and [`simulation`] directly and can
//!   ignore the items guarded by the `python-bindings` feature.
//! - Optional terminal logging of long loops lives in [`observe`] behind the
//!   `obs_slog` feature.
//!
//! Testing notes
//! -------------
//! - Numerical behavior is covered by unit tests in the inner modules and by
//!   `tests/integration_ipm_pipeline.rs`.

pub mod ipm;
pub mod observe;
pub mod simulation;
pub mod utils;

#[cfg(feature = "python-bindings")]
use numpy::{IntoPyArray, PyArray1, PyArray2};

#[cfg(feature = "python-bindings")]
use pyo3::{
    prelude::*,
    types::{PyAny, PyDict},
};

#[cfg(feature = "python-bindings")]
use crate::{
    ipm::{
        analysis::IPMAnalysis, core::DemVarOptions, core::StateGrid, models::SizeStructuredModel,
    },
    simulation::{
        DiffusionOpts, DiffusionParams, StructuredOpts, simulate_diffusion, simulate_structured,
    },
    utils::{build_size_model, extract_ensemble_options, extract_f64_array, extract_power_options},
};

/// IPM — Python-facing wrapper around a full analysis of the reference
/// size-structured model.
///
/// Constructed from Python via
/// `IPM(lower=0.0, upper=20.0, n=200, env=None, params=None, tol=None,
/// max_iter=None, relative=False, quad_points=None, verbose=False)`, where
/// `params` is an optional dict of `SizeModelParams` overrides. The kernel,
/// eigen-analysis, and demographic variance are computed eagerly; accessors
/// return copies as numpy arrays.
#[cfg(feature = "python-bindings")]
#[pyclass(module = "rust_ipm.ipm")]
pub struct IPM {
    model: SizeStructuredModel,
    inner: IPMAnalysis,
}

#[cfg(feature = "python-bindings")]
#[pymethods]
impl IPM {
    #[new]
    #[pyo3(
        signature = (
            lower = 0.0,
            upper = 20.0,
            n = 200,
            env = None,
            params = None,
            tol = None,
            max_iter = None,
            relative = false,
            quad_points = None,
            verbose = false,
        ),
        text_signature = "(lower=0.0, upper=20.0, n=200, env=None, params=None, tol=None, \
                          max_iter=None, relative=False, quad_points=None, verbose=False)"
    )]
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        lower: f64, upper: f64, n: usize, env: Option<f64>, params: Option<&Bound<'_, PyDict>>,
        tol: Option<f64>, max_iter: Option<usize>, relative: bool, quad_points: Option<usize>,
        verbose: bool,
    ) -> PyResult<Self> {
        let model = build_size_model(params)?;
        let grid = StateGrid::new(lower, upper, n)?;
        let power = extract_power_options(tol, max_iter, relative, verbose)?;
        let demvar = DemVarOptions::new(quad_points)?;
        let inner = IPMAnalysis::run(&model, grid, env, &power, &demvar)?;
        Ok(IPM { model, inner })
    }

    /// Dominant eigenvalue λ.
    #[getter]
    pub fn lambda(&self) -> f64 {
        self.inner.lambda()
    }

    /// Demographic variance σ²_d.
    #[getter]
    pub fn demvar(&self) -> f64 {
        self.inner.demvar.demvar
    }

    /// Grid indices whose demographic-variance contribution failed.
    #[getter]
    pub fn demvar_failures(&self) -> Vec<usize> {
        self.inner.demvar.failures().map(|p| p.index()).collect()
    }

    /// Power-iteration counts for (u, v).
    #[getter]
    pub fn iterations(&self) -> (usize, usize) {
        self.inner.eigen.iterations
    }

    #[getter]
    pub fn grid<'py>(&self, py: Python<'py>) -> Bound<'py, PyArray1<f64>> {
        self.inner.grid.points().clone().into_pyarray(py)
    }

    /// Stable distribution (sums to 1).
    #[getter]
    pub fn u<'py>(&self, py: Python<'py>) -> Bound<'py, PyArray1<f64>> {
        self.inner.eigen.u.clone().into_pyarray(py)
    }

    /// Reproductive value (`sum(u·v) = 1`).
    #[getter]
    pub fn v<'py>(&self, py: Python<'py>) -> Bound<'py, PyArray1<f64>> {
        self.inner.eigen.v.clone().into_pyarray(py)
    }

    #[getter]
    pub fn kernel<'py>(&self, py: Python<'py>) -> Bound<'py, PyArray2<f64>> {
        self.inner.kernel.k().clone().into_pyarray(py)
    }

    pub fn sensitivity<'py>(&self, py: Python<'py>) -> Bound<'py, PyArray2<f64>> {
        self.inner.eigen.sensitivity().into_pyarray(py)
    }

    pub fn elasticity<'py>(&self, py: Python<'py>) -> PyResult<Bound<'py, PyArray2<f64>>> {
        let e = self.inner.eigen.elasticity(self.inner.kernel.k().view())?;
        Ok(e.into_pyarray(py))
    }

    /// Reproductive value interpolated at arbitrary states.
    pub fn v_at<'py>(
        &self, py: Python<'py>, states: &Bound<'py, PyAny>,
    ) -> PyResult<Bound<'py, PyArray1<f64>>> {
        let arr = extract_f64_array(py, states)?;
        let v_fn = self.inner.v_function()?;
        Ok(v_fn.eval_many(arr.as_array()).into_pyarray(py))
    }
}

/// Simulate the log-size diffusion; returns an `(n_sim, t_max + 1)` array.
#[cfg(feature = "python-bindings")]
#[pyfunction]
#[pyo3(
    name = "simulate_diffusion",
    signature = (
        lambda_, demvar, envvar, y0, t_max, delta_t = 0.01, upper = None,
        n_sim = 100, seed = Some(42), n_threads = None, verbose = false,
    ),
    text_signature = "(lambda_, demvar, envvar, y0, t_max, /, delta_t=0.01, upper=None, \
                      n_sim=100, seed=42, n_threads=None, verbose=False)"
)]
#[allow(clippy::too_many_arguments)]
fn py_simulate_diffusion<'py>(
    py: Python<'py>, lambda_: f64, demvar: f64, envvar: f64, y0: f64, t_max: usize,
    delta_t: f64, upper: Option<f64>, n_sim: usize, seed: Option<u64>, n_threads: Option<usize>,
    verbose: bool,
) -> PyResult<Bound<'py, PyArray2<f64>>> {
    let params = DiffusionParams::new(lambda_, demvar, envvar)?;
    let opts = DiffusionOpts::new(y0, t_max, delta_t, upper)?;
    let ensemble = extract_ensemble_options(n_sim, seed, n_threads, verbose)?;
    let out = py.allow_threads(|| simulate_diffusion(&params, &opts, &ensemble))?;
    Ok(out.into_data().into_pyarray(py))
}

/// Individual-based simulation of an `IPM`'s model, seeded from its stable
/// distribution; returns total reproductive value per realization and step.
#[cfg(feature = "python-bindings")]
#[pyfunction]
#[pyo3(
    name = "simulate_structured",
    signature = (
        ipm, n0, t_max, v_max = 1e6, n_sim = 100, seed = Some(42), n_threads = None,
        verbose = false,
    ),
    text_signature = "(ipm, n0, t_max, /, v_max=1e6, n_sim=100, seed=42, n_threads=None, \
                      verbose=False)"
)]
#[allow(clippy::too_many_arguments)]
fn py_simulate_structured<'py>(
    py: Python<'py>, ipm: PyRef<'py, IPM>, n0: usize, t_max: usize, v_max: f64, n_sim: usize,
    seed: Option<u64>, n_threads: Option<usize>, verbose: bool,
) -> PyResult<Bound<'py, PyArray2<f64>>> {
    let opts = StructuredOpts::new(n0, t_max, v_max)?;
    let ensemble = extract_ensemble_options(n_sim, seed, n_threads, verbose)?;
    let analysis = &ipm.inner;
    let out = simulate_structured(
        &ipm.model,
        &analysis.grid,
        analysis.eigen.u.view(),
        analysis.eigen.v.view(),
        analysis.env,
        &opts,
        &ensemble,
    )?;
    Ok(out.into_data().into_pyarray(py))
}

/// _rust_ipm — PyO3 module initializer for the Python extension.
///
/// Creates the `ipm` and `simulation` submodules, attaches them to
/// `_rust_ipm`, and registers them in `sys.modules` so they are importable
/// via dotted paths from Python.
#[cfg(feature = "python-bindings")]
#[pymodule]
fn _rust_ipm<'py>(_py: Python<'py>, m: &Bound<'py, PyModule>) -> PyResult<()> {
    let ipm_mod = PyModule::new(_py, "ipm")?;
    let simulation_mod = PyModule::new(_py, "simulation")?;
    ipm_module(_py, m, &ipm_mod)?;
    simulation_module(_py, m, &simulation_mod)?;

    // Manually add submodules into sys.modules to allow for dot notation.
    _py.import("sys")?.getattr("modules")?.set_item("rust_ipm.ipm", ipm_mod)?;

    _py.import("sys")?.getattr("modules")?.set_item("rust_ipm.simulation", simulation_mod)?;
    Ok(())
}

#[cfg(feature = "python-bindings")]
fn ipm_module<'py>(
    _py: Python, rust_ipm: &Bound<'py, PyModule>, m: &Bound<'py, PyModule>,
) -> PyResult<()> {
    m.add_class::<IPM>()?;
    rust_ipm.add_submodule(m)?;
    Ok(())
}

#[cfg(feature = "python-bindings")]
fn simulation_module<'py>(
    _py: Python, rust_ipm: &Bound<'py, PyModule>, m: &Bound<'py, PyModule>,
) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(py_simulate_diffusion, m)?)?;
    m.add_function(wrap_pyfunction!(py_simulate_structured, m)?)?;
    rust_ipm.add_submodule(m)?;
    Ok(())
}
