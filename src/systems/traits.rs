//! Model Traits: Standardized API for the Stochastic Engine
//!
//! Every model the engine integrates is split into two pure functions of
//! the current state and time:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     dX = f(X,t)dt + g(X,t)dW                │
//! ├─────────────────────────────────────────────────────────────┤
//! │  DriftModel::drift()          - deterministic rate f(X,t)   │
//! │  DiffusionModel::diffusion()  - noise scale g(X,t)          │
//! │  ModelState                   - arithmetic + clamping of X  │
//! │  Controllable                 - extraction intensity knob   │
//! │  Bifurcating                  - analytic critical point     │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! The scalar bistable model and the two-compartment model both sit behind
//! `DriftModel`; only the associated `State` differs.

use std::fmt::Debug;

/// State vector of a model (scalar `B`, or the `(B, K)` pair)
pub trait ModelState: Copy + Debug + PartialEq {
    /// Euler–Maruyama increment: `self + drift·dt + diffusion·dW`
    fn advance(self, drift: Self, diffusion: Self, dt: f64, dw: f64) -> Self;

    /// Clamp every component to at least `floor`
    fn clamp_floor(self, floor: f64) -> Self;

    /// The observed component `B`
    fn primary(&self) -> f64;

    /// Copy of the state with `delta` added to the observed component
    fn perturbed(self, delta: f64) -> Self;

    /// All components finite
    fn is_finite(&self) -> bool;
}

impl ModelState for f64 {
    #[inline]
    fn advance(self, drift: f64, diffusion: f64, dt: f64, dw: f64) -> f64 {
        self + drift * dt + diffusion * dw
    }

    #[inline]
    fn clamp_floor(self, floor: f64) -> f64 {
        self.max(floor)
    }

    #[inline]
    fn primary(&self) -> f64 {
        *self
    }

    #[inline]
    fn perturbed(self, delta: f64) -> f64 {
        self + delta
    }

    #[inline]
    fn is_finite(&self) -> bool {
        f64::is_finite(*self)
    }
}

/// Deterministic part of the dynamics
pub trait DriftModel {
    type State: ModelState;

    /// Rate of change at `state`, time `t`
    fn drift(&self, state: Self::State, t: f64) -> Self::State;
}

/// Stochastic part of the dynamics (scale of the Wiener increment)
pub trait DiffusionModel<S: ModelState> {
    fn diffusion(&self, state: S, t: f64) -> S;
}

/// Models with a controllable extraction parameter
pub trait Controllable {
    /// Parameter type (extraction intensity α for every model in this crate)
    type Parameter: Copy;

    /// Set control parameter
    fn set_parameter(&mut self, param: Self::Parameter);

    /// Get current parameter value
    fn get_parameter(&self) -> Self::Parameter;

    /// Copy of the model at a different parameter value.
    ///
    /// Parameter records are never mutated during a run; sweeps build a
    /// fresh record per grid point through this method.
    fn with_parameter(&self, param: Self::Parameter) -> Self
    where
        Self: Clone,
    {
        let mut model = self.clone();
        model.set_parameter(param);
        model
    }
}

/// Models exhibiting a bifurcation in their control parameter
pub trait Bifurcating: DriftModel + Controllable {
    /// Theoretical critical parameter value (if known)
    fn critical_parameter(&self) -> Option<f64> {
        None
    }

    /// Name of the bifurcation type
    fn bifurcation_type(&self) -> &'static str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalar_advance() {
        let next = 1.0_f64.advance(-0.5, 0.2, 0.1, 0.3);
        assert!((next - (1.0 - 0.05 + 0.06)).abs() < 1e-15);
    }

    #[test]
    fn test_scalar_clamp_and_perturb() {
        assert_eq!((-0.3_f64).clamp_floor(0.0), 0.0);
        assert_eq!(0.4_f64.clamp_floor(0.01), 0.4);
        assert_eq!(1.0_f64.perturbed(1e-5), 1.0 + 1e-5);
        assert!(!f64::NAN.primary().is_finite());
    }
}
