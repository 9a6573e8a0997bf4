//! Integrator Module: Explicit Stochastic Time Stepping
//!
//! Advances any `DriftModel` / `DiffusionModel` pair with the
//! Euler–Maruyama scheme and records the sampled path.

mod euler_maruyama;
mod trajectory;

pub use euler_maruyama::{rng_from_seed, standard_normal, step_count, SdeIntegrator};
pub(crate) use euler_maruyama::check_initial;
pub use trajectory::Trajectory;
