//! Diffusion coefficients.
//!
//! - **Multiplicative**: g(B) = σ·B, noise vanishes at the collapsed state
//! - **Additive**: g = σ on B only; the capital compartment K stays noise-free

use serde::{Deserialize, Serialize};

use super::traits::DiffusionModel;
use super::two_compartment::CompartmentState;
use crate::error::{ensure_non_negative, Result};

/// Multiplicative (geometric) noise σ·B
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MultiplicativeNoise {
    pub sigma: f64,
}

impl MultiplicativeNoise {
    pub fn new(sigma: f64) -> Result<Self> {
        ensure_non_negative("sigma", sigma)?;
        Ok(Self { sigma })
    }
}

impl DiffusionModel<f64> for MultiplicativeNoise {
    #[inline]
    fn diffusion(&self, b: f64, _t: f64) -> f64 {
        self.sigma * b
    }
}

/// State-independent noise σ on the observed component
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AdditiveNoise {
    pub sigma: f64,
}

impl AdditiveNoise {
    pub fn new(sigma: f64) -> Result<Self> {
        ensure_non_negative("sigma", sigma)?;
        Ok(Self { sigma })
    }
}

impl DiffusionModel<f64> for AdditiveNoise {
    #[inline]
    fn diffusion(&self, _b: f64, _t: f64) -> f64 {
        self.sigma
    }
}

impl DiffusionModel<CompartmentState> for AdditiveNoise {
    #[inline]
    fn diffusion(&self, _state: CompartmentState, _t: f64) -> CompartmentState {
        CompartmentState { b: self.sigma, k: 0.0 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_negative_sigma_rejected() {
        assert!(MultiplicativeNoise::new(-0.1).is_err());
        assert!(AdditiveNoise::new(-0.1).is_err());
        assert!(MultiplicativeNoise::new(0.0).is_ok());
    }

    #[test]
    fn test_multiplicative_vanishes_at_zero() {
        let noise = MultiplicativeNoise { sigma: 0.3 };
        assert_eq!(noise.diffusion(0.0, 1.0), 0.0);
        assert!((noise.diffusion(0.5, 1.0) - 0.15).abs() < 1e-15);
    }

    #[test]
    fn test_additive_leaves_capital_noise_free() {
        let noise = AdditiveNoise { sigma: 0.05 };
        let g = noise.diffusion(CompartmentState { b: 0.7, k: 2.0 }, 0.0);
        assert_eq!(g.b, 0.05);
        assert_eq!(g.k, 0.0);
    }
}
