//! Models Module: Drift and Diffusion of Cognitive Bandwidth
//!
//! Implements the deterministic and stochastic ingredients integrated by
//! the engine:
//!
//! - **Bistable**: cubic Allee recovery minus linear extraction
//! - **Logistic**: logistic recovery minus linear extraction
//! - **Two-compartment**: bandwidth B converted into capital K by a policy
//! - **Noise**: multiplicative σ·B and additive σ diffusion

mod traits;
mod bistable;
mod logistic;
mod noise;
mod policy;
mod two_compartment;

pub use traits::{Bifurcating, Controllable, DiffusionModel, DriftModel, ModelState};
pub use bistable::BistableDrift;
pub use logistic::LogisticDrift;
pub use noise::{AdditiveNoise, MultiplicativeNoise};
pub use policy::{ExtractionPolicy, Strategy};
pub use two_compartment::{CompartmentState, SensitivityScan, TwoCompartmentModel};
