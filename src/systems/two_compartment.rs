//! Two-Compartment Extraction Model: Bandwidth vs. Digital Capital
//!
//! The algorithm converts the user's bandwidth B into accumulated capital K
//! at an intensity I chosen by an extraction policy:
//!
//!   I     = policy(B, K, t)
//!   dB/dt = r·B·(1 - B/K_cap) - α·I·B
//!   dK/dt = ε·α·I·B - δ·K
//!
//! where:
//! - r: recovery rate, K_cap: bandwidth carrying capacity
//! - α: penetration rate of the algorithm (control parameter)
//! - ε: conversion efficiency of extracted bandwidth into capital
//! - δ: capital depreciation
//!
//! ## Exploitation Optimum
//!
//! K_final is non-monotone in α: too little extraction yields no capital,
//! too much exhausts B. `sensitivity_scan` locates the peak on a grid.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::policy::{ExtractionPolicy, Strategy};
use super::traits::{Controllable, DriftModel, ModelState};
use crate::error::{ensure_finite, ensure_non_negative, ensure_positive, DynamicsError, Result};
use crate::integrator::{check_initial, Trajectory};

/// Largest internal step of the deterministic solver
const MAX_RK4_STEP: f64 = 0.01;

/// State of the two-compartment system
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CompartmentState {
    /// Cognitive bandwidth B
    pub b: f64,
    /// Accumulated capital K
    pub k: f64,
}

impl CompartmentState {
    pub fn new(b: f64, k: f64) -> Self {
        Self { b, k }
    }

    #[inline]
    fn offset(self, deriv: Self, h: f64) -> Self {
        Self {
            b: self.b + deriv.b * h,
            k: self.k + deriv.k * h,
        }
    }
}

impl ModelState for CompartmentState {
    #[inline]
    fn advance(self, drift: Self, diffusion: Self, dt: f64, dw: f64) -> Self {
        Self {
            b: self.b + drift.b * dt + diffusion.b * dw,
            k: self.k + drift.k * dt + diffusion.k * dw,
        }
    }

    #[inline]
    fn clamp_floor(self, floor: f64) -> Self {
        Self {
            b: self.b.max(floor),
            k: self.k.max(floor),
        }
    }

    #[inline]
    fn primary(&self) -> f64 {
        self.b
    }

    #[inline]
    fn perturbed(self, delta: f64) -> Self {
        Self { b: self.b + delta, k: self.k }
    }

    #[inline]
    fn is_finite(&self) -> bool {
        self.b.is_finite() && self.k.is_finite()
    }
}

/// Two-compartment extraction system
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TwoCompartmentModel {
    /// Recovery rate r
    pub r: f64,
    /// Carrying capacity of B
    pub k_cap: f64,
    /// Conversion efficiency ε
    pub epsilon: f64,
    /// Capital depreciation δ
    pub delta: f64,
    /// Penetration rate α
    pub alpha: f64,
    /// Noise-injection policy
    pub policy: ExtractionPolicy,
}

impl Default for TwoCompartmentModel {
    fn default() -> Self {
        Self {
            r: 0.5,
            k_cap: 1.0,
            epsilon: 0.8,
            delta: 0.1,
            alpha: 1.2,
            policy: ExtractionPolicy::from_strategy(Strategy::Adaptive, 0.05),
        }
    }
}

/// Final capital at each sampled α
#[derive(Debug, Clone, Serialize)]
pub struct SensitivityScan {
    /// (α, K_final) pairs in grid order
    pub points: Vec<(f64, f64)>,
}

impl SensitivityScan {
    /// Grid point with the largest final capital
    pub fn peak(&self) -> Option<(f64, f64)> {
        self.points
            .iter()
            .copied()
            .filter(|(_, k)| k.is_finite())
            .fold(None, |best: Option<(f64, f64)>, p| match best {
                Some(b) if b.1 >= p.1 => Some(b),
                _ => Some(p),
            })
    }
}

impl TwoCompartmentModel {
    /// Create model, validating coefficient ranges
    pub fn new(
        r: f64,
        k_cap: f64,
        epsilon: f64,
        delta: f64,
        alpha: f64,
        policy: ExtractionPolicy,
    ) -> Result<Self> {
        ensure_finite("r", r)?;
        ensure_positive("k_cap", k_cap)?;
        ensure_non_negative("epsilon", epsilon)?;
        ensure_non_negative("delta", delta)?;
        ensure_non_negative("alpha", alpha)?;
        Ok(Self {
            r,
            k_cap,
            epsilon,
            delta,
            alpha,
            policy,
        })
    }

    /// Right-hand side (dB/dt, dK/dt).
    ///
    /// The policy sees the raw state; the rates use the state clamped at zero.
    pub fn derivatives(&self, state: CompartmentState, t: f64) -> CompartmentState {
        let intensity = self.policy.compute_intensity(state.b, state.k, t);
        let b = state.b.max(0.0);
        let k = state.k.max(0.0);

        let extracted = self.alpha * intensity * b;
        CompartmentState {
            b: self.r * b * (1.0 - b / self.k_cap) - extracted,
            k: self.epsilon * extracted - self.delta * k,
        }
    }

    /// RK4 integration step
    fn rk4_step(&self, y: CompartmentState, t: f64, h: f64) -> CompartmentState {
        let k1 = self.derivatives(y, t);
        let k2 = self.derivatives(y.offset(k1, h / 2.0), t + h / 2.0);
        let k3 = self.derivatives(y.offset(k2, h / 2.0), t + h / 2.0);
        let k4 = self.derivatives(y.offset(k3, h), t + h);

        CompartmentState {
            b: y.b + (k1.b + 2.0 * k2.b + 2.0 * k3.b + k4.b) * (h / 6.0),
            k: y.k + (k1.k + 2.0 * k2.k + 2.0 * k3.k + k4.k) * (h / 6.0),
        }
        .clamp_floor(0.0)
    }

    /// Noise-free trajectory sampled at `num_points` evenly spaced times
    /// in [0, horizon], both endpoints included.
    ///
    /// Between samples the solver takes RK4 sub-steps no longer than 0.01.
    pub fn solve_deterministic(
        &self,
        initial: CompartmentState,
        horizon: f64,
        num_points: usize,
    ) -> Result<Trajectory<CompartmentState>> {
        ensure_positive("horizon", horizon)?;
        if num_points < 2 {
            return Err(DynamicsError::invalid(
                "num_points",
                num_points as f64,
                "need at least two output points",
            ));
        }
        check_initial(initial)?;

        let spacing = horizon / (num_points - 1) as f64;
        let substeps = (spacing / MAX_RK4_STEP).ceil().max(1.0) as usize;
        let h = spacing / substeps as f64;

        let mut trajectory = Trajectory::with_capacity(num_points);
        let mut y = initial;
        trajectory.push(0.0, y);

        for i in 1..num_points {
            let t_start = (i - 1) as f64 * spacing;
            for s in 0..substeps {
                y = self.rk4_step(y, t_start + s as f64 * h, h);
            }
            trajectory.push(i as f64 * spacing, y);
        }

        debug!(
            strategy = %self.policy.strategy(),
            alpha = self.alpha,
            b_final = y.b,
            k_final = y.k,
            "deterministic solve finished"
        );
        Ok(trajectory)
    }

    /// Final capital K(T) for each α in `alphas`
    pub fn sensitivity_scan(
        &self,
        initial: CompartmentState,
        horizon: f64,
        num_points: usize,
        alphas: &[f64],
    ) -> Result<SensitivityScan> {
        let mut points = Vec::with_capacity(alphas.len());
        for &alpha in alphas {
            ensure_non_negative("alpha", alpha)?;
            let model = self.with_parameter(alpha);
            let trajectory = model.solve_deterministic(initial, horizon, num_points)?;
            let k_final = trajectory.final_state().map_or(f64::NAN, |s| s.k);
            points.push((alpha, k_final));
        }

        let scan = SensitivityScan { points };
        if let Some((alpha, k)) = scan.peak() {
            info!(peak_alpha = alpha, peak_k = k, "sensitivity scan finished");
        }
        Ok(scan)
    }
}

impl DriftModel for TwoCompartmentModel {
    type State = CompartmentState;

    fn drift(&self, state: CompartmentState, t: f64) -> CompartmentState {
        self.derivatives(state, t)
    }
}

impl Controllable for TwoCompartmentModel {
    type Parameter = f64;

    fn set_parameter(&mut self, alpha: f64) {
        self.alpha = alpha;
    }

    fn get_parameter(&self) -> f64 {
        self.alpha
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn experiment_model(strategy: Strategy) -> TwoCompartmentModel {
        TwoCompartmentModel::new(
            0.8,
            1.0,
            0.5,
            0.15,
            1.5,
            ExtractionPolicy::from_strategy(strategy, 0.8),
        )
        .unwrap()
    }

    #[test]
    fn test_derivatives_constant_policy() {
        let model = experiment_model(Strategy::Constant);
        let d = model.derivatives(CompartmentState::new(0.5, 0.2), 0.0);
        // dB = 0.8·0.5·0.5 - 1.5·0.2·0.5 = 0.2 - 0.15
        assert!((d.b - 0.05).abs() < 1e-12, "dB = {}", d.b);
        // dK = 0.5·0.15 - 0.15·0.2 = 0.075 - 0.03
        assert!((d.k - 0.045).abs() < 1e-12, "dK = {}", d.k);
    }

    #[test]
    fn test_derivatives_clamp_negative_inputs() {
        let model = experiment_model(Strategy::Constant);
        let d = model.derivatives(CompartmentState::new(-0.1, -0.5), 0.0);
        assert_eq!(d.b, 0.0);
        assert_eq!(d.k, 0.0);
    }

    #[test]
    fn test_deterministic_grid() {
        let model = experiment_model(Strategy::Adaptive);
        let y0 = CompartmentState::new(1.0, 0.1);
        let traj = model.solve_deterministic(y0, 50.0, 1000).unwrap();

        assert_eq!(traj.len(), 1000);
        assert_eq!(traj.initial(), Some(y0));
        assert!((traj.time[999] - 50.0).abs() < 1e-9);
        assert!(traj.states.iter().all(|s| s.b >= 0.0 && s.k >= 0.0));
    }

    #[test]
    fn test_capital_accumulates_from_extraction() {
        let model = experiment_model(Strategy::Constant);
        let y0 = CompartmentState::new(1.0, 0.0);
        let traj = model.solve_deterministic(y0, 5.0, 50).unwrap();
        let k_final = traj.final_state().unwrap().k;
        assert!(k_final > 0.0, "Expected capital growth, got K = {}", k_final);
    }

    #[test]
    fn test_rk4_matches_closed_form_decay() {
        // No recovery, constant intensity: B decays at rate α·I
        let model = TwoCompartmentModel::new(
            0.0,
            1.0,
            0.0,
            0.0,
            1.0,
            ExtractionPolicy::Constant { base: 0.5 },
        )
        .unwrap();
        let traj = model
            .solve_deterministic(CompartmentState::new(1.0, 0.0), 4.0, 5)
            .unwrap();
        let b_final = traj.final_state().unwrap().b;
        let exact = (-0.5_f64 * 4.0).exp();
        assert!((b_final - exact).abs() < 1e-8, "RK4 {} vs exact {}", b_final, exact);
    }

    #[test]
    fn test_sensitivity_peak_is_interior() {
        let model = experiment_model(Strategy::Constant);
        let alphas: Vec<f64> = (0..20).map(|i| 0.1 + i as f64 * 0.5).collect();
        let scan = model
            .sensitivity_scan(CompartmentState::new(1.0, 0.1), 50.0, 200, &alphas)
            .unwrap();

        assert_eq!(scan.points.len(), alphas.len());
        let (peak_alpha, peak_k) = scan.peak().unwrap();
        assert!(peak_k > 0.0);
        assert!(
            peak_alpha > alphas[0] && peak_alpha < alphas[alphas.len() - 1],
            "Expected interior optimum, got alpha = {}",
            peak_alpha
        );
    }

    #[test]
    fn test_invalid_solver_arguments() {
        let model = TwoCompartmentModel::default();
        let y0 = CompartmentState::new(1.0, 0.1);
        assert!(model.solve_deterministic(y0, 10.0, 1).is_err());
        assert!(model.solve_deterministic(y0, 0.0, 10).is_err());
        assert!(model
            .solve_deterministic(CompartmentState::new(1.0, -0.1), 10.0, 10)
            .is_err());
        assert!(TwoCompartmentModel::new(0.5, 0.0, 0.8, 0.1, 1.2, model.policy).is_err());
    }
}
