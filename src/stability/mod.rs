//! Stability Module: Lyapunov Exponents and Potential Landscapes
//!
//! Two complementary views of where the bandwidth model loses its
//! healthy attractor as extraction α grows:
//!
//! ### Lyapunov exponent (dynamic)
//!
//!   λ = lim (1/t) ln(|δ(t)| / |δ(0)|)
//!
//! estimated from twin trajectories under shared noise. The zero crossing
//! of λ(α) marks the stability boundary.
//!
//! ### Potential landscape (static)
//!
//!   V(B) = -∫ f(b) db
//!
//! Minima are stable states; the barrier between the healthy minimum and
//! collapse disappears at the fold point.

mod lyapunov;
mod potential;

pub use lyapunov::{LyapunovEstimate, LyapunovEstimator, LyapunovSweep, SeedPolicy};
pub use potential::{AlphaPotential, PotentialCurve, PotentialLandscape};
