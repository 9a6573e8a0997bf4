//! Extraction policies: how hard the algorithm pushes at time t.
//!
//! A policy maps the current `(B, K, t)` to an extraction intensity `I`:
//!
//! - **Constant**: I = base
//! - **Periodic**: I = base + amplitude·sin²(t)
//! - **Adaptive**: I = base + β·K·intent(B), where intent is 1 while the
//!   user still has bandwidth to harvest (B > cutoff) and drops otherwise

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::DynamicsError;

/// Baseline noise-injection intensity shared by every policy
pub const BASE_INTENSITY: f64 = 0.2;
/// Amplitude of the periodic policy
pub const PERIODIC_AMPLITUDE: f64 = 0.3;
/// Bandwidth above which the adaptive policy extracts at full intent
pub const ADAPTIVE_CUTOFF: f64 = 0.3;
/// Intent of the adaptive policy once bandwidth is depleted
pub const ADAPTIVE_LOW_INTENT: f64 = 0.2;

/// Policy selector as it appears in configuration (`strategy`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    Constant,
    Periodic,
    #[default]
    Adaptive,
}

impl FromStr for Strategy {
    type Err = DynamicsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "constant" => Ok(Self::Constant),
            "periodic" => Ok(Self::Periodic),
            "adaptive" => Ok(Self::Adaptive),
            other => Err(DynamicsError::Config(format!(
                "unknown strategy `{}` (expected constant|periodic|adaptive)",
                other
            ))),
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Constant => "constant",
            Self::Periodic => "periodic",
            Self::Adaptive => "adaptive",
        };
        f.write_str(name)
    }
}

/// Extraction policy with its coefficients resolved
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ExtractionPolicy {
    Constant { base: f64 },
    Periodic { base: f64, amplitude: f64 },
    Adaptive { base: f64, beta: f64 },
}

impl ExtractionPolicy {
    /// Build the policy for a strategy; `beta` only matters for `Adaptive`
    pub fn from_strategy(strategy: Strategy, beta: f64) -> Self {
        match strategy {
            Strategy::Constant => Self::Constant { base: BASE_INTENSITY },
            Strategy::Periodic => Self::Periodic {
                base: BASE_INTENSITY,
                amplitude: PERIODIC_AMPLITUDE,
            },
            Strategy::Adaptive => Self::Adaptive { base: BASE_INTENSITY, beta },
        }
    }

    pub fn strategy(&self) -> Strategy {
        match self {
            Self::Constant { .. } => Strategy::Constant,
            Self::Periodic { .. } => Strategy::Periodic,
            Self::Adaptive { .. } => Strategy::Adaptive,
        }
    }

    /// Extraction intensity I(B, K, t)
    pub fn compute_intensity(&self, b: f64, k: f64, t: f64) -> f64 {
        match *self {
            Self::Constant { base } => base,
            Self::Periodic { base, amplitude } => base + amplitude * t.sin().powi(2),
            Self::Adaptive { base, beta } => {
                let intent = if b > ADAPTIVE_CUTOFF { 1.0 } else { ADAPTIVE_LOW_INTENT };
                base + beta * k * intent
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::FRAC_PI_2;

    #[test]
    fn test_constant_ignores_state() {
        let policy = ExtractionPolicy::from_strategy(Strategy::Constant, 0.8);
        assert_eq!(policy.compute_intensity(0.9, 5.0, 3.0), 0.2);
        assert_eq!(policy.compute_intensity(0.0, 0.0, 0.0), 0.2);
    }

    #[test]
    fn test_periodic_peaks_at_half_pi() {
        let policy = ExtractionPolicy::from_strategy(Strategy::Periodic, 0.0);
        assert!((policy.compute_intensity(1.0, 0.0, 0.0) - 0.2).abs() < 1e-15);
        assert!((policy.compute_intensity(1.0, 0.0, FRAC_PI_2) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_adaptive_intent_switch() {
        let policy = ExtractionPolicy::from_strategy(Strategy::Adaptive, 0.8);
        let high = policy.compute_intensity(0.5, 1.0, 0.0);
        let low = policy.compute_intensity(0.3, 1.0, 0.0);
        assert!((high - 1.0).abs() < 1e-12, "high = {}", high);
        assert!((low - 0.36).abs() < 1e-12, "low = {}", low);
    }

    #[test]
    fn test_strategy_parsing() {
        assert_eq!("Periodic".parse::<Strategy>().unwrap(), Strategy::Periodic);
        assert_eq!(" adaptive ".parse::<Strategy>().unwrap(), Strategy::Adaptive);
        assert!("greedy".parse::<Strategy>().is_err());
        assert_eq!(Strategy::Constant.to_string(), "constant");
    }

    #[test]
    fn test_strategy_serde_lowercase() {
        let json = serde_json::to_string(&Strategy::Periodic).unwrap();
        assert_eq!(json, "\"periodic\"");
        let parsed: Strategy = serde_json::from_str("\"constant\"").unwrap();
        assert_eq!(parsed, Strategy::Constant);
    }
}
