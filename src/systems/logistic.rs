//! Logistic Extraction Model
//!
//!   dB/dt = r·B·(1 - B) - α·B
//!
//! Logistic recovery without an Allee threshold. The intervention scenario
//! runs on this drift. A transcritical bifurcation at α = r exchanges
//! stability between B* = 1 - α/r and the collapsed state B = 0.

use serde::{Deserialize, Serialize};

use super::traits::{Bifurcating, Controllable, DriftModel};
use crate::error::{ensure_finite, ensure_non_negative, Result};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LogisticDrift {
    /// Intrinsic recovery rate r
    pub r: f64,
    /// Extraction intensity α
    pub alpha: f64,
}

impl Default for LogisticDrift {
    fn default() -> Self {
        Self { r: 0.5, alpha: 0.8 }
    }
}

impl LogisticDrift {
    pub fn new(r: f64, alpha: f64) -> Result<Self> {
        ensure_finite("r", r)?;
        ensure_non_negative("alpha", alpha)?;
        Ok(Self { r, alpha })
    }

    #[inline]
    pub fn rate(&self, b: f64) -> f64 {
        self.r * b * (1.0 - b) - self.alpha * b
    }

    /// Interior equilibrium 1 - α/r, if it is positive
    pub fn carrying_state(&self) -> Option<f64> {
        if self.r <= 0.0 {
            return None;
        }
        let b = 1.0 - self.alpha / self.r;
        (b > 0.0).then_some(b)
    }
}

impl DriftModel for LogisticDrift {
    type State = f64;

    #[inline]
    fn drift(&self, b: f64, _t: f64) -> f64 {
        self.rate(b)
    }
}

impl Controllable for LogisticDrift {
    type Parameter = f64;

    fn set_parameter(&mut self, alpha: f64) {
        self.alpha = alpha;
    }

    fn get_parameter(&self) -> f64 {
        self.alpha
    }
}

impl Bifurcating for LogisticDrift {
    fn critical_parameter(&self) -> Option<f64> {
        (self.r > 0.0).then_some(self.r)
    }

    fn bifurcation_type(&self) -> &'static str {
        "transcritical"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_logistic_rate() {
        let model = LogisticDrift::new(0.5, 0.8).unwrap();
        // 0.5·0.5·0.5 - 0.8·0.5
        assert!((model.rate(0.5) - (0.125 - 0.4)).abs() < 1e-15);
    }

    #[test]
    fn test_carrying_state() {
        let weak = LogisticDrift::new(1.0, 0.25).unwrap();
        let b = weak.carrying_state().unwrap();
        assert!((b - 0.75).abs() < 1e-15);
        assert!(weak.rate(b).abs() < 1e-15);

        // Crisis parameters extract faster than recovery
        assert_eq!(LogisticDrift::default().carrying_state(), None);
        assert_eq!(LogisticDrift::default().critical_parameter(), Some(0.5));
    }
}
