//! Euler–Maruyama integrator for dX = f(X,t)dt + g(X,t)dW
//!
//! The explicit first-order scheme advances each sample as
//!
//!   X[i+1] = max(X[i] + f(X[i], tᵢ)·dt + g(X[i], tᵢ)·√dt·Zᵢ, floor)
//!
//! with Zᵢ ~ N(0, 1) drawn once per step. The run has ⌊T/dt⌋ samples,
//! the first one being the initial condition untouched, and tᵢ = i·dt.

use ndarray::Array1;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::StandardNormal;
use tracing::trace;

use super::trajectory::Trajectory;
use crate::error::{ensure_non_negative, ensure_positive, DynamicsError, Result};
use crate::systems::{DiffusionModel, DriftModel, ModelState};

/// Number of samples ⌊T/dt⌋.
///
/// Ratios that land within rounding error of an integer (50 / 0.02) count
/// as that integer rather than falling one short.
pub fn step_count(horizon: f64, dt: f64) -> usize {
    let raw = horizon / dt;
    let nearest = raw.round();
    if (raw - nearest).abs() <= 1e-9 * nearest.max(1.0) {
        nearest as usize
    } else {
        raw.floor() as usize
    }
}

/// Seeded generator, or an OS-seeded one when no seed is given
pub fn rng_from_seed(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    }
}

/// One standard-normal draw
#[inline]
pub fn standard_normal<R: Rng + ?Sized>(rng: &mut R) -> f64 {
    rng.sample(StandardNormal)
}

/// Explicit stochastic Euler integrator
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SdeIntegrator {
    /// Step size
    dt: f64,
    /// Horizon T
    horizon: f64,
    /// Lower bound every component is clamped to after a step
    floor: f64,
    /// Cached ⌊T/dt⌋
    steps: usize,
}

impl SdeIntegrator {
    /// Create an integrator clamping to zero
    ///
    /// # Arguments
    /// * `dt` - Step size (> 0)
    /// * `horizon` - Simulated time T (> 0, at least one step long)
    pub fn new(dt: f64, horizon: f64) -> Result<Self> {
        ensure_positive("dt", dt)?;
        ensure_positive("horizon", horizon)?;

        let steps = step_count(horizon, dt);
        if steps == 0 {
            return Err(DynamicsError::invalid(
                "horizon",
                horizon,
                "shorter than a single step",
            ));
        }

        Ok(Self {
            dt,
            horizon,
            floor: 0.0,
            steps,
        })
    }

    /// Clamp to `floor` instead of zero (must be >= 0)
    pub fn with_floor(mut self, floor: f64) -> Result<Self> {
        ensure_non_negative("state_floor", floor)?;
        self.floor = floor;
        Ok(self)
    }

    pub fn dt(&self) -> f64 {
        self.dt
    }

    pub fn horizon(&self) -> f64 {
        self.horizon
    }

    pub fn floor(&self) -> f64 {
        self.floor
    }

    /// Samples per run, ⌊T/dt⌋
    pub fn steps(&self) -> usize {
        self.steps
    }

    /// Time of sample `i`
    #[inline]
    pub fn time_at(&self, i: usize) -> f64 {
        i as f64 * self.dt
    }

    /// Sample times 0, dt, 2dt, ...
    pub fn time_grid(&self) -> Array1<f64> {
        Array1::from_iter((0..self.steps).map(|i| self.time_at(i)))
    }

    /// Single Euler–Maruyama step from `state` at time `t` given Z
    #[inline]
    pub fn step<S, D, G>(&self, state: S, t: f64, drift: &D, diffusion: &G, z: f64) -> S
    where
        S: ModelState,
        D: DriftModel<State = S> + ?Sized,
        G: DiffusionModel<S> + ?Sized,
    {
        let dw = self.dt.sqrt() * z;
        state
            .advance(drift.drift(state, t), diffusion.diffusion(state, t), self.dt, dw)
            .clamp_floor(self.floor)
    }

    /// Integrate one path drawing noise from `rng`
    pub fn integrate<D, G, R>(
        &self,
        initial: D::State,
        drift: &D,
        diffusion: &G,
        rng: &mut R,
    ) -> Result<Trajectory<D::State>>
    where
        D: DriftModel + ?Sized,
        G: DiffusionModel<D::State> + ?Sized,
        R: Rng + ?Sized,
    {
        self.integrate_with(initial, drift, diffusion, |_| standard_normal(&mut *rng))
    }

    /// Integrate one path from an explicit seed (OS entropy if `None`)
    pub fn integrate_seeded<D, G>(
        &self,
        initial: D::State,
        drift: &D,
        diffusion: &G,
        seed: Option<u64>,
    ) -> Result<Trajectory<D::State>>
    where
        D: DriftModel + ?Sized,
        G: DiffusionModel<D::State> + ?Sized,
    {
        let mut rng = rng_from_seed(seed);
        self.integrate(initial, drift, diffusion, &mut rng)
    }

    /// Integrate one path along a given sequence of standard-normal draws.
    ///
    /// `noise` must hold one value per step, i.e. `steps() - 1` values.
    pub fn integrate_with_noise<D, G>(
        &self,
        initial: D::State,
        drift: &D,
        diffusion: &G,
        noise: &[f64],
    ) -> Result<Trajectory<D::State>>
    where
        D: DriftModel + ?Sized,
        G: DiffusionModel<D::State> + ?Sized,
    {
        let needed = self.steps - 1;
        if noise.len() != needed {
            return Err(DynamicsError::invalid(
                "noise",
                noise.len() as f64,
                "length must equal the number of steps (samples - 1)",
            ));
        }
        self.integrate_with(initial, drift, diffusion, |i| noise[i])
    }

    fn integrate_with<D, G, F>(
        &self,
        initial: D::State,
        drift: &D,
        diffusion: &G,
        mut next_z: F,
    ) -> Result<Trajectory<D::State>>
    where
        D: DriftModel + ?Sized,
        G: DiffusionModel<D::State> + ?Sized,
        F: FnMut(usize) -> f64,
    {
        check_initial(initial)?;

        let mut trajectory = Trajectory::with_capacity(self.steps);
        let mut state = initial;
        trajectory.push(0.0, state);

        for i in 1..self.steps {
            let t_prev = self.time_at(i - 1);
            state = self.step(state, t_prev, drift, diffusion, next_z(i - 1));
            trajectory.push(self.time_at(i), state);
        }

        trace!(steps = self.steps, dt = self.dt, "integrated path");
        Ok(trajectory)
    }
}

/// Initial conditions must be finite and non-negative
pub(crate) fn check_initial<S: ModelState>(initial: S) -> Result<()> {
    if !initial.is_finite() || initial.clamp_floor(0.0) != initial {
        return Err(DynamicsError::invalid(
            "initial_state",
            initial.primary(),
            "must be finite and non-negative in every component",
        ));
    }
    Ok(())
}
