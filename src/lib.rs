//! # Negentropy Dynamics
//!
//! Stochastic engine for the erosion and recovery of cognitive bandwidth
//! under algorithmic extraction.
//!
//! ## Model
//!
//! Bandwidth B ≥ 0 follows an Itô SDE
//!
//!   dB = f(B, t; α) dt + g(B, t) dW
//!
//! where α is the extraction intensity. The bistable drift
//!
//!   f(B) = r·B·(1 - B)·(B - θ) - a·α·B
//!
//! has a healthy attractor near B = 1, a threshold near θ and the collapsed
//! state B = 0. Past the fold point α_c = r(1-θ)²/(4a) only collapse
//! remains.
//!
//! ## Analyses
//!
//! 1. **Ensembles**: Monte-Carlo survival and collapse-time statistics,
//!    heatmaps over (α, σ)
//!
//! 2. **Stability**: Lyapunov exponent λ(α) from twin trajectories and the
//!    potential V(B) = -∫ f db
//!
//! 3. **Intervention**: switch from a crisis to a recovery regime with a
//!    periodic control input, compared against a same-seed baseline
//!
//! 4. **Two-compartment extraction**: bandwidth converted into digital
//!    capital K by a policy, with an α sensitivity scan of K(T)
//!
//! Every stochastic run is reproducible from its seed.

pub mod config;
pub mod ensemble;
pub mod error;
pub mod integrator;
pub mod intervention;
pub mod io;
pub mod logging;
pub mod stability;
pub mod systems;

pub use config::{
    BistableConfig, CompartmentConfig, EnsembleConfig, ExperimentConfig, HeatmapConfig,
    InterventionConfig, LinearGrid, LyapunovConfig, PotentialConfig,
};
pub use error::{DynamicsError, Result};
pub use io::save_json;
pub use logging::{init_tracing, InitError};

// Re-exports from integrator
pub use integrator::{SdeIntegrator, Trajectory};

// Re-exports from ensemble
pub use ensemble::{collapse_heatmap, CollapseHeatmap, CollapseStats, EnsembleResult, EnsembleSimulator};

// Re-exports from stability
pub use stability::{
    AlphaPotential, LyapunovEstimate, LyapunovEstimator, LyapunovSweep, PotentialCurve,
    PotentialLandscape, SeedPolicy,
};

// Re-exports from intervention
pub use intervention::{
    ControlSignal, InterventionController, InterventionOutcome, InterventionSummary, Regime,
};

// Re-exports from systems
pub use systems::{
    // Traits
    Bifurcating,
    Controllable,
    DiffusionModel,
    DriftModel,
    ModelState,
    // Scalar drifts
    BistableDrift,
    LogisticDrift,
    // Noise
    AdditiveNoise,
    MultiplicativeNoise,
    // Two-compartment
    CompartmentState,
    ExtractionPolicy,
    SensitivityScan,
    Strategy,
    TwoCompartmentModel,
};
