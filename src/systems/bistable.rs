//! Bistable Allee Model: Cognitive Bandwidth under Extraction
//!
//! The observed bandwidth B follows a cubic recovery term with an Allee
//! threshold θ, minus linear extraction by the feed algorithm:
//!
//!   dB/dt = r·B·(1 - B)·(B - θ) - α·a·B
//!
//! where:
//! - r: intrinsic recovery rate
//! - θ: Allee / collapse threshold
//! - α: extraction (algorithm) intensity, the control parameter
//! - a: extraction scaling (`attack_coeff`)
//!
//! ## Saddle-Node Bifurcation
//!
//! Non-trivial equilibria solve B² - (1+θ)B + θ + α·a/r = 0. They exist
//! while the discriminant (1-θ)² - 4α·a/r is non-negative:
//!
//! - α < α_c: stable high state, unstable barrier near θ, stable collapse at 0
//! - α > α_c: only the collapsed state B = 0 survives
//!
//! with α_c = r·(1-θ)² / (4a).

use serde::{Deserialize, Serialize};

use super::traits::{Bifurcating, Controllable, DriftModel};
use crate::error::{ensure_finite, ensure_non_negative, Result};

/// Bistable drift with Allee threshold and linear extraction
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BistableDrift {
    /// Intrinsic recovery rate r
    pub r: f64,
    /// Allee threshold θ
    pub theta: f64,
    /// Extraction intensity α
    pub alpha: f64,
    /// Extraction scaling a
    pub attack_coeff: f64,
}

impl Default for BistableDrift {
    fn default() -> Self {
        Self {
            r: 0.8,
            theta: 0.3,
            alpha: 1.0,
            attack_coeff: 0.5,
        }
    }
}

impl BistableDrift {
    /// Create a drift model, rejecting non-finite coefficients and a
    /// negative extraction intensity.
    pub fn new(r: f64, theta: f64, alpha: f64, attack_coeff: f64) -> Result<Self> {
        ensure_finite("r", r)?;
        ensure_finite("theta", theta)?;
        ensure_non_negative("alpha", alpha)?;
        ensure_non_negative("attack_coeff", attack_coeff)?;
        Ok(Self { r, theta, alpha, attack_coeff })
    }

    /// Rate of change at bandwidth `b`
    #[inline]
    pub fn rate(&self, b: f64) -> f64 {
        let recovery = self.r * b * (1.0 - b) * (b - self.theta);
        let extraction = self.alpha * self.attack_coeff * b;
        recovery - extraction
    }

    /// Non-negative equilibria in ascending order.
    ///
    /// B = 0 is always an equilibrium; the two interior roots appear only
    /// below the fold point.
    pub fn equilibria(&self) -> Vec<f64> {
        let mut roots = vec![0.0];
        if self.r <= 0.0 {
            return roots;
        }

        let disc = (1.0 - self.theta).powi(2) - 4.0 * self.alpha * self.attack_coeff / self.r;
        if disc < 0.0 {
            return roots;
        }

        let sqrt_disc = disc.sqrt();
        let centre = 1.0 + self.theta;
        for b in [(centre - sqrt_disc) / 2.0, (centre + sqrt_disc) / 2.0] {
            if b > 0.0 && roots.iter().all(|&x| (x - b).abs() > 1e-12) {
                roots.push(b);
            }
        }
        roots
    }
}

impl DriftModel for BistableDrift {
    type State = f64;

    #[inline]
    fn drift(&self, b: f64, _t: f64) -> f64 {
        self.rate(b)
    }
}

impl Controllable for BistableDrift {
    type Parameter = f64;

    fn set_parameter(&mut self, alpha: f64) {
        self.alpha = alpha;
    }

    fn get_parameter(&self) -> f64 {
        self.alpha
    }
}

impl Bifurcating for BistableDrift {
    fn critical_parameter(&self) -> Option<f64> {
        if self.r <= 0.0 || self.attack_coeff <= 0.0 {
            return None;
        }
        Some(self.r * (1.0 - self.theta).powi(2) / (4.0 * self.attack_coeff))
    }

    fn bifurcation_type(&self) -> &'static str {
        "saddle-node (fold)"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_drift_value() {
        let model = BistableDrift::new(0.8, 0.3, 1.0, 0.5).unwrap();
        let rate = model.rate(0.5);
        assert!((rate - (-0.21)).abs() < 1e-12, "Expected -0.21, got {}", rate);
    }

    #[test]
    fn test_collapsed_state_is_fixed_point() {
        let model = BistableDrift::default();
        assert_eq!(model.drift(0.0, 0.0), 0.0);
    }

    #[test]
    fn test_equilibria_below_fold() {
        // No extraction: roots at 0, θ, 1
        let model = BistableDrift::new(0.8, 0.3, 0.0, 0.5).unwrap();
        let eq = model.equilibria();
        assert_eq!(eq.len(), 3);
        assert!((eq[1] - 0.3).abs() < 1e-12);
        assert!((eq[2] - 1.0).abs() < 1e-12);
        for b in eq {
            assert!(model.rate(b).abs() < 1e-12, "rate({}) = {}", b, model.rate(b));
        }
    }

    #[test]
    fn test_equilibria_above_fold() {
        let model = BistableDrift::default();
        let alpha_c = model.critical_parameter().unwrap();
        let collapsed = model.with_parameter(alpha_c * 1.5);
        assert_eq!(collapsed.equilibria(), vec![0.0]);

        let bistable = model.with_parameter(alpha_c * 0.5);
        assert_eq!(bistable.equilibria().len(), 3);
    }

    #[test]
    fn test_fold_point() {
        let model = BistableDrift::default();
        let alpha_c = model.critical_parameter().unwrap();
        // r(1-θ)²/(4a) = 0.8 · 0.49 / 2
        assert!((alpha_c - 0.196).abs() < 1e-12, "alpha_c = {}", alpha_c);
        assert_eq!(model.bifurcation_type(), "saddle-node (fold)");
    }

    #[test]
    fn test_negative_alpha_rejected() {
        assert!(BistableDrift::new(0.8, 0.3, -1.0, 0.5).is_err());
        assert!(BistableDrift::new(f64::NAN, 0.3, 1.0, 0.5).is_err());
    }
}
