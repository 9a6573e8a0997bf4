//! Experiment configuration.
//!
//! Every experiment section deserialises from JSON with `serde`. Missing
//! fields take the defaults below, unknown fields are rejected. `validate`
//! is called on load so a bad document fails before any simulation starts.
//!
//! ```json
//! {
//!   "ensemble": { "alpha": 2.0, "simulations": 1000 },
//!   "lyapunov": { "alpha_grid": { "start": 0.05, "end": 1.0, "points": 20 } }
//! }
//! ```

use std::fs;
use std::path::Path;

use ndarray::Array1;
use serde::{Deserialize, Serialize};

use crate::ensemble::EnsembleSimulator;
use crate::error::{ensure_finite, ensure_non_negative, ensure_positive, DynamicsError, Result};
use crate::integrator::SdeIntegrator;
use crate::intervention::{ControlSignal, InterventionController, Regime};
use crate::stability::{LyapunovEstimator, PotentialLandscape, SeedPolicy};
use crate::systems::{
    AdditiveNoise, BistableDrift, CompartmentState, ExtractionPolicy, LogisticDrift,
    MultiplicativeNoise, Strategy, TwoCompartmentModel,
};

/// `points` evenly spaced values from `start` to `end` inclusive
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LinearGrid {
    pub start: f64,
    pub end: f64,
    pub points: usize,
}

impl LinearGrid {
    pub const fn new(start: f64, end: f64, points: usize) -> Self {
        Self { start, end, points }
    }

    pub fn validate(&self, name: &'static str) -> Result<()> {
        ensure_finite(name, self.start)?;
        ensure_finite(name, self.end)?;
        if self.points == 0 {
            return Err(DynamicsError::invalid(name, 0.0, "grid needs at least one point"));
        }
        if self.end < self.start {
            return Err(DynamicsError::invalid(name, self.end, "grid end precedes start"));
        }
        Ok(())
    }

    pub fn values(&self) -> Vec<f64> {
        Array1::linspace(self.start, self.end, self.points).to_vec()
    }
}

/// Coefficients of the bistable drift (α is set per experiment)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BistableConfig {
    pub r: f64,
    pub theta: f64,
    pub attack_coeff: f64,
}

impl Default for BistableConfig {
    fn default() -> Self {
        Self {
            r: 0.8,
            theta: 0.3,
            attack_coeff: 0.5,
        }
    }
}

impl BistableConfig {
    /// Stability-analysis coefficients (r = 0.5, θ = 0.2, a = 1)
    pub fn stability() -> Self {
        Self {
            r: 0.5,
            theta: 0.2,
            attack_coeff: 1.0,
        }
    }

    pub fn model(&self, alpha: f64) -> Result<BistableDrift> {
        BistableDrift::new(self.r, self.theta, alpha, self.attack_coeff)
    }
}

/// Monte-Carlo ensemble at one (α, σ)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EnsembleConfig {
    pub alpha: f64,
    pub sigma: f64,
    pub horizon: f64,
    pub dt: f64,
    pub simulations: usize,
    pub initial_state: f64,
    pub crash_threshold: f64,
    pub model: BistableConfig,
    pub seed: u64,
}

impl Default for EnsembleConfig {
    fn default() -> Self {
        Self {
            alpha: 1.5,
            sigma: 0.08,
            horizon: 80.0,
            dt: 0.02,
            simulations: 400,
            initial_state: 1.0,
            crash_threshold: 0.1,
            model: BistableConfig::default(),
            seed: 123,
        }
    }
}

impl EnsembleConfig {
    pub fn drift(&self) -> Result<BistableDrift> {
        self.model.model(self.alpha)
    }

    pub fn noise(&self) -> Result<MultiplicativeNoise> {
        MultiplicativeNoise::new(self.sigma)
    }

    pub fn simulator(&self) -> Result<EnsembleSimulator> {
        let integrator = SdeIntegrator::new(self.dt, self.horizon)?;
        EnsembleSimulator::new(integrator, self.simulations, self.crash_threshold)?
            .with_initial_state(self.initial_state)
    }

    pub fn validate(&self) -> Result<()> {
        self.drift()?;
        self.noise()?;
        self.simulator()?;
        Ok(())
    }
}

/// Collapse heatmap; drift coefficients and threshold come from the ensemble section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HeatmapConfig {
    pub alpha_grid: LinearGrid,
    pub sigma_grid: LinearGrid,
    pub horizon: f64,
    pub dt: f64,
    pub simulations: usize,
    pub seed: u64,
}

impl Default for HeatmapConfig {
    fn default() -> Self {
        Self {
            alpha_grid: LinearGrid::new(0.2, 3.5, 24),
            sigma_grid: LinearGrid::new(0.0, 0.4, 20),
            horizon: 60.0,
            dt: 0.02,
            simulations: 150,
            seed: 99,
        }
    }
}

impl HeatmapConfig {
    pub fn simulator(&self, ensemble: &EnsembleConfig) -> Result<EnsembleSimulator> {
        let integrator = SdeIntegrator::new(self.dt, self.horizon)?;
        EnsembleSimulator::new(integrator, self.simulations, ensemble.crash_threshold)?
            .with_initial_state(ensemble.initial_state)
    }

    pub fn validate(&self, ensemble: &EnsembleConfig) -> Result<()> {
        self.alpha_grid.validate("alpha_grid")?;
        self.sigma_grid.validate("sigma_grid")?;
        ensure_non_negative("alpha_grid", self.alpha_grid.start)?;
        ensure_non_negative("sigma_grid", self.sigma_grid.start)?;
        self.simulator(ensemble)?;
        Ok(())
    }
}

/// Lyapunov sweep over α
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LyapunovConfig {
    pub alpha_grid: LinearGrid,
    pub sigma: f64,
    pub horizon: f64,
    pub dt: f64,
    pub initial_state: f64,
    pub delta0: f64,
    pub crash_floor: f64,
    pub model: BistableConfig,
    pub seed: u64,
    pub seed_policy: SeedPolicy,
}

impl Default for LyapunovConfig {
    fn default() -> Self {
        Self {
            alpha_grid: LinearGrid::new(0.05, 3.0, 40),
            sigma: 0.05,
            horizon: 60.0,
            dt: 0.01,
            initial_state: 1.0,
            delta0: 1e-5,
            crash_floor: 1e-12,
            model: BistableConfig::stability(),
            seed: 123,
            seed_policy: SeedPolicy::default(),
        }
    }
}

impl LyapunovConfig {
    pub fn estimator(&self) -> Result<LyapunovEstimator> {
        let integrator = SdeIntegrator::new(self.dt, self.horizon)?;
        LyapunovEstimator::new(integrator, self.delta0, self.crash_floor)
    }

    pub fn noise(&self) -> Result<MultiplicativeNoise> {
        MultiplicativeNoise::new(self.sigma)
    }

    pub fn validate(&self) -> Result<()> {
        self.alpha_grid.validate("alpha_grid")?;
        self.model.model(self.alpha_grid.start)?;
        ensure_non_negative("initial_state", self.initial_state)?;
        self.noise()?;
        self.estimator()?;
        Ok(())
    }
}

/// Potential curves at a handful of α values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PotentialConfig {
    pub grid: LinearGrid,
    pub alphas: Vec<f64>,
    pub model: BistableConfig,
}

impl Default for PotentialConfig {
    fn default() -> Self {
        Self {
            grid: LinearGrid::new(0.0, 1.2, 400),
            alphas: vec![0.1, 0.5, 1.0, 2.0],
            model: BistableConfig::stability(),
        }
    }
}

impl PotentialConfig {
    pub fn landscape(&self) -> Result<PotentialLandscape> {
        PotentialLandscape::uniform(self.grid.start, self.grid.end, self.grid.points)
    }

    pub fn validate(&self) -> Result<()> {
        self.landscape()?;
        for &alpha in &self.alphas {
            self.model.model(alpha)?;
        }
        Ok(())
    }
}

/// Crisis → recovery switch on the logistic drift
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct InterventionConfig {
    pub r: f64,
    pub crisis: Regime,
    pub recovery: Regime,
    pub control: ControlSignal,
    pub horizon: f64,
    pub dt: f64,
    pub t_intervention: f64,
    pub initial_state: f64,
    pub state_floor: f64,
    pub seed: u64,
}

impl Default for InterventionConfig {
    fn default() -> Self {
        Self {
            r: 0.5,
            crisis: Regime { alpha: 0.8, sigma: 0.45 },
            recovery: Regime { alpha: 0.8, sigma: 0.15 },
            control: ControlSignal {
                amplitude: 0.08,
                frequency: 0.5,
            },
            horizon: 100.0,
            dt: 0.01,
            t_intervention: 40.0,
            initial_state: 1.0,
            state_floor: 0.01,
            seed: 42,
        }
    }
}

impl InterventionConfig {
    pub fn controller(&self) -> Result<InterventionController<LogisticDrift>> {
        let integrator = SdeIntegrator::new(self.dt, self.horizon)?.with_floor(self.state_floor)?;
        InterventionController::new(
            integrator,
            LogisticDrift::new(self.r, self.crisis.alpha)?,
            self.crisis,
            self.recovery,
            self.control,
            self.t_intervention,
        )?
        .with_initial_state(self.initial_state)
    }

    pub fn validate(&self) -> Result<()> {
        self.controller().map(|_| ())
    }
}

/// Two-compartment bandwidth / capital model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CompartmentConfig {
    pub r: f64,
    pub k_cap: f64,
    pub epsilon: f64,
    pub delta: f64,
    pub alpha: f64,
    pub beta: f64,
    pub strategy: Strategy,
    pub initial_b: f64,
    pub initial_k: f64,
    pub horizon: f64,
    pub num_points: usize,
    pub sensitivity_grid: LinearGrid,
    pub sde_dt: f64,
    pub sde_sigma: f64,
    pub seed: u64,
}

impl Default for CompartmentConfig {
    fn default() -> Self {
        Self {
            r: 0.8,
            k_cap: 1.0,
            epsilon: 0.5,
            delta: 0.15,
            alpha: 1.5,
            beta: 0.8,
            strategy: Strategy::Adaptive,
            initial_b: 1.0,
            initial_k: 0.1,
            horizon: 50.0,
            num_points: 1000,
            sensitivity_grid: LinearGrid::new(0.1, 5.0, 40),
            sde_dt: 0.02,
            sde_sigma: 0.05,
            seed: 42,
        }
    }
}

impl CompartmentConfig {
    pub fn model(&self) -> Result<TwoCompartmentModel> {
        ensure_finite("beta", self.beta)?;
        TwoCompartmentModel::new(
            self.r,
            self.k_cap,
            self.epsilon,
            self.delta,
            self.alpha,
            ExtractionPolicy::from_strategy(self.strategy, self.beta),
        )
    }

    pub fn initial_state(&self) -> CompartmentState {
        CompartmentState::new(self.initial_b, self.initial_k)
    }

    pub fn sde_integrator(&self) -> Result<SdeIntegrator> {
        SdeIntegrator::new(self.sde_dt, self.horizon)
    }

    pub fn noise(&self) -> Result<AdditiveNoise> {
        AdditiveNoise::new(self.sde_sigma)
    }

    pub fn validate(&self) -> Result<()> {
        self.model()?;
        ensure_non_negative("initial_b", self.initial_b)?;
        ensure_non_negative("initial_k", self.initial_k)?;
        ensure_positive("horizon", self.horizon)?;
        if self.num_points < 2 {
            return Err(DynamicsError::invalid(
                "num_points",
                self.num_points as f64,
                "need at least two output points",
            ));
        }
        self.sensitivity_grid.validate("sensitivity_grid")?;
        ensure_non_negative("sensitivity_grid", self.sensitivity_grid.start)?;
        self.sde_integrator()?;
        self.noise()?;
        Ok(())
    }
}

/// All experiment sections
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExperimentConfig {
    pub ensemble: EnsembleConfig,
    pub heatmap: HeatmapConfig,
    pub lyapunov: LyapunovConfig,
    pub potential: PotentialConfig,
    pub intervention: InterventionConfig,
    pub compartment: CompartmentConfig,
}

impl ExperimentConfig {
    pub fn from_json_str(raw: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let raw = fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    /// Load from `path`, or fall back to defaults
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => Self::from_json_file(p),
            None => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> Result<()> {
        self.ensemble.validate()?;
        self.heatmap.validate(&self.ensemble)?;
        self.lyapunov.validate()?;
        self.potential.validate()?;
        self.intervention.validate()?;
        self.compartment.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        ExperimentConfig::default().validate().unwrap();
    }

    #[test]
    fn test_linear_grid_values() {
        let grid = LinearGrid::new(0.05, 3.0, 40);
        let values = grid.values();
        assert_eq!(values.len(), 40);
        assert!((values[0] - 0.05).abs() < 1e-15);
        assert!((values[39] - 3.0).abs() < 1e-12);

        assert_eq!(LinearGrid::new(2.0, 2.0, 1).values(), vec![2.0]);
        assert!(LinearGrid::new(1.0, 0.0, 5).validate("grid").is_err());
        assert!(LinearGrid::new(0.0, 1.0, 0).validate("grid").is_err());
    }

    #[test]
    fn test_partial_document_keeps_defaults() {
        let config = ExperimentConfig::from_json_str(
            r#"{ "ensemble": { "alpha": 2.0, "simulations": 50 },
                 "compartment": { "strategy": "periodic" } }"#,
        )
        .unwrap();

        assert_eq!(config.ensemble.alpha, 2.0);
        assert_eq!(config.ensemble.simulations, 50);
        assert_eq!(config.ensemble.sigma, 0.08);
        assert_eq!(config.compartment.strategy, Strategy::Periodic);
        assert_eq!(config.lyapunov, LyapunovConfig::default());
    }

    #[test]
    fn test_unknown_field_rejected() {
        let err = ExperimentConfig::from_json_str(r#"{ "ensemble": { "alhpa": 2.0 } }"#);
        assert!(matches!(err, Err(DynamicsError::Json(_))));
    }

    #[test]
    fn test_out_of_range_rejected() {
        let err = ExperimentConfig::from_json_str(r#"{ "ensemble": { "dt": -0.1 } }"#);
        assert!(matches!(err, Err(DynamicsError::InvalidParameter { name: "dt", .. })));

        let err = ExperimentConfig::from_json_str(r#"{ "intervention": { "t_intervention": 500.0 } }"#);
        assert!(matches!(
            err,
            Err(DynamicsError::InvalidParameter { name: "t_intervention", .. })
        ));
    }

    #[test]
    fn test_seed_policy_from_json() {
        let config = ExperimentConfig::from_json_str(
            r#"{ "lyapunov": { "seed_policy": { "kind": "fixed" } } }"#,
        )
        .unwrap();
        assert_eq!(config.lyapunov.seed_policy, SeedPolicy::Fixed);
    }

    #[test]
    fn test_builders_use_section_values() {
        let config = ExperimentConfig::default();
        let simulator = config.ensemble.simulator().unwrap();
        assert_eq!(simulator.simulations(), 400);
        assert_eq!(simulator.integrator().steps(), 4000);

        let heat_sim = config.heatmap.simulator(&config.ensemble).unwrap();
        assert_eq!(heat_sim.simulations(), 150);
        assert_eq!(heat_sim.crash_threshold(), 0.1);

        let model = config.compartment.model().unwrap();
        assert_eq!(model.policy.strategy(), Strategy::Adaptive);
        assert_eq!(config.compartment.initial_state(), CompartmentState::new(1.0, 0.1));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = ExperimentConfig::from_json_file("/nonexistent/negentropy.json");
        assert!(matches!(err, Err(DynamicsError::Io(_))));
    }
}
