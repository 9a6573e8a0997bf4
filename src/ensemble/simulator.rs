//! Monte-Carlo ensemble of Euler–Maruyama paths.
//!
//! All N paths share one parameter record and draw independent noise. The
//! step loop updates the whole length-N state vector at once:
//!
//!   B ← max(B + f(B)·dt + g(B)·√dt·Z, floor),   Z ~ N(0, I_N)
//!
//! and then books collapse events (B < crash_threshold). A path's collapse
//! time is the first crossing; later breaches never overwrite it.
//!
//! ## Memory
//!
//! `run` keeps the full `simulations × steps` matrix (a few hundred paths by
//! a few thousand steps at the default sizes). `run_collapse_only` streams
//! the loop and keeps only the O(N + steps) collapse bookkeeping.

use ndarray::{Array1, Array2, ArrayView1, Zip};
use rand::Rng;
use serde::Serialize;
use tracing::debug;

use crate::error::{ensure_non_negative, DynamicsError, Result};
use crate::integrator::{check_initial, rng_from_seed, standard_normal, SdeIntegrator};
use crate::systems::{DiffusionModel, DriftModel};

/// Collapse bookkeeping of an ensemble run
#[derive(Debug, Clone, Serialize)]
pub struct CollapseStats {
    /// Number of paths below the threshold at each step
    pub collapsed_count: Array1<usize>,
    /// First crossing time per path (the horizon if never crossed)
    pub collapse_time: Array1<f64>,
    /// Horizon T
    pub horizon: f64,
    /// Collapse boundary
    pub crash_threshold: f64,
}

impl CollapseStats {
    pub fn simulations(&self) -> usize {
        self.collapse_time.len()
    }

    /// Fraction of paths at or above the threshold, per step
    pub fn survival_curve(&self) -> Array1<f64> {
        let n = self.simulations() as f64;
        self.collapsed_count.mapv(|c| 1.0 - c as f64 / n)
    }

    /// Mean first-crossing time (censored at the horizon)
    pub fn mean_collapse_time(&self) -> f64 {
        self.collapse_time.mean().unwrap_or(self.horizon)
    }

    /// Fraction of paths that crossed the threshold at least once
    pub fn collapsed_fraction(&self) -> f64 {
        let n = self.simulations();
        if n == 0 {
            return 0.0;
        }
        let crossed = self
            .collapse_time
            .iter()
            .filter(|&&t| t < self.horizon)
            .count();
        crossed as f64 / n as f64
    }
}

/// Full output of an ensemble run
#[derive(Debug, Clone, Serialize)]
pub struct EnsembleResult {
    /// Sample times
    pub time: Array1<f64>,
    /// Path matrix [simulations, steps]
    pub paths: Array2<f64>,
    /// Collapse counts and times
    pub collapse: CollapseStats,
}

impl EnsembleResult {
    pub fn simulations(&self) -> usize {
        self.paths.nrows()
    }

    pub fn steps(&self) -> usize {
        self.paths.ncols()
    }

    /// One sampled path
    pub fn path(&self, k: usize) -> ArrayView1<'_, f64> {
        self.paths.row(k)
    }

    /// States at the horizon
    pub fn final_states(&self) -> Array1<f64> {
        self.paths.column(self.steps() - 1).to_owned()
    }

    /// Ensemble mean at each step
    pub fn mean_path(&self) -> Array1<f64> {
        self.paths
            .mean_axis(ndarray::Axis(0))
            .unwrap_or_else(|| Array1::zeros(self.steps()))
    }
}

/// Runs N independent paths of a scalar model in one vectorised loop
#[derive(Debug, Clone, Copy)]
pub struct EnsembleSimulator {
    integrator: SdeIntegrator,
    /// Number of paths N
    simulations: usize,
    /// Collapse boundary
    crash_threshold: f64,
    /// Common initial bandwidth
    initial_state: f64,
}

impl EnsembleSimulator {
    /// Create simulator
    ///
    /// # Arguments
    /// * `integrator` - Step size, horizon and clamping floor
    /// * `simulations` - Number of paths (> 0)
    /// * `crash_threshold` - Collapse boundary (>= 0)
    pub fn new(integrator: SdeIntegrator, simulations: usize, crash_threshold: f64) -> Result<Self> {
        if simulations == 0 {
            return Err(DynamicsError::invalid(
                "simulations",
                0.0,
                "ensemble needs at least one path",
            ));
        }
        ensure_non_negative("crash_threshold", crash_threshold)?;

        Ok(Self {
            integrator,
            simulations,
            crash_threshold,
            initial_state: 1.0,
        })
    }

    /// Start every path from `b0` instead of 1.0
    pub fn with_initial_state(mut self, b0: f64) -> Result<Self> {
        check_initial(b0)?;
        self.initial_state = b0;
        Ok(self)
    }

    pub fn integrator(&self) -> &SdeIntegrator {
        &self.integrator
    }

    pub fn simulations(&self) -> usize {
        self.simulations
    }

    pub fn crash_threshold(&self) -> f64 {
        self.crash_threshold
    }

    /// Run the ensemble, keeping every path
    pub fn run<D, G>(&self, drift: &D, diffusion: &G, seed: Option<u64>) -> Result<EnsembleResult>
    where
        D: DriftModel<State = f64> + ?Sized,
        G: DiffusionModel<f64> + ?Sized,
    {
        let mut rng = rng_from_seed(seed);
        let mut paths = Array2::zeros((self.simulations, self.integrator.steps()));
        let collapse = self.simulate(drift, diffusion, &mut rng, Some(&mut paths));

        Ok(EnsembleResult {
            time: self.integrator.time_grid(),
            paths,
            collapse,
        })
    }

    /// Run the ensemble keeping only collapse bookkeeping
    pub fn run_collapse_only<D, G>(
        &self,
        drift: &D,
        diffusion: &G,
        seed: Option<u64>,
    ) -> Result<CollapseStats>
    where
        D: DriftModel<State = f64> + ?Sized,
        G: DiffusionModel<f64> + ?Sized,
    {
        let mut rng = rng_from_seed(seed);
        Ok(self.simulate(drift, diffusion, &mut rng, None))
    }

    fn simulate<D, G, R>(
        &self,
        drift: &D,
        diffusion: &G,
        rng: &mut R,
        mut sink: Option<&mut Array2<f64>>,
    ) -> CollapseStats
    where
        D: DriftModel<State = f64> + ?Sized,
        G: DiffusionModel<f64> + ?Sized,
        R: Rng + ?Sized,
    {
        let n = self.simulations;
        let steps = self.integrator.steps();
        let dt = self.integrator.dt();
        let sqrt_dt = dt.sqrt();
        let floor = self.integrator.floor();
        let horizon = self.integrator.horizon();
        let threshold = self.crash_threshold;

        let mut state = Array1::from_elem(n, self.initial_state);
        let mut collapsed = Array1::from_elem(n, false);
        let mut collapse_time = Array1::from_elem(n, horizon);
        let mut collapsed_count = Array1::<usize>::zeros(steps);

        let mut book = |i: usize,
                        state: &Array1<f64>,
                        collapsed: &mut Array1<bool>,
                        collapse_time: &mut Array1<f64>| {
            let t = self.integrator.time_at(i);
            let mut below = 0usize;
            Zip::from(state)
                .and(collapsed)
                .and(collapse_time)
                .for_each(|&b, flag, ct| {
                    if b < threshold {
                        below += 1;
                        if !*flag {
                            *flag = true;
                            *ct = t;
                        }
                    }
                });
            collapsed_count[i] = below;
        };

        if let Some(paths) = sink.as_mut() {
            paths.column_mut(0).assign(&state);
        }
        book(0, &state, &mut collapsed, &mut collapse_time);

        for i in 1..steps {
            let t_prev = self.integrator.time_at(i - 1);

            let dw = Array1::from_shape_simple_fn(n, || sqrt_dt * standard_normal(&mut *rng));
            let f = state.mapv(|b| drift.drift(b, t_prev));
            let g = state.mapv(|b| diffusion.diffusion(b, t_prev));

            state = (&state + &(&f * dt) + &(&g * &dw)).mapv_into(|b| b.max(floor));

            if let Some(paths) = sink.as_mut() {
                paths.column_mut(i).assign(&state);
            }
            book(i, &state, &mut collapsed, &mut collapse_time);
        }

        let stats = CollapseStats {
            collapsed_count,
            collapse_time,
            horizon,
            crash_threshold: threshold,
        };
        debug!(
            simulations = n,
            steps,
            collapsed_fraction = stats.collapsed_fraction(),
            mean_collapse_time = stats.mean_collapse_time(),
            "ensemble finished"
        );
        stats
    }
}
