//! Largest Lyapunov exponent by twin-trajectory perturbation.
//!
//! Two copies of the system start δ₀ apart in the observed component and
//! are stepped under the same Wiener increment each step. After the
//! horizon T the exponent is
//!
//!   λ = (1/T) · ln(max(|B₂(T) - B₁(T)|, floor) / δ₀)
//!
//! - **λ < 0**: perturbations decay, the regime is contracting
//! - **λ > 0**: perturbations grow, the regime is divergent
//!
//! Drawing separate noise for each twin would measure the noise amplitude,
//! not the dynamics, so exactly one draw feeds both.
//!
//! The stability boundary of a sweep is the grid point with the smallest
//! |λ|, a grid search whose error is bounded by the grid spacing.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{ensure_positive, DynamicsError, Result};
use crate::integrator::{check_initial, rng_from_seed, standard_normal, SdeIntegrator};
use crate::systems::{Controllable, DiffusionModel, DriftModel, ModelState};

/// How each sweep point derives its seed from the base seed
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SeedPolicy {
    /// Same seed at every grid point
    Fixed,
    /// base + trunc(α · scale)
    OffsetByParameter { scale: f64 },
}

impl Default for SeedPolicy {
    fn default() -> Self {
        Self::OffsetByParameter { scale: 1000.0 }
    }
}

impl SeedPolicy {
    pub fn seed_for(&self, base: u64, param: f64) -> u64 {
        match *self {
            Self::Fixed => base,
            Self::OffsetByParameter { scale } => {
                let offset = (param * scale).trunc() as i64;
                base.wrapping_add_signed(offset)
            }
        }
    }
}

/// Exponent at one parameter point
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LyapunovEstimate {
    pub alpha: f64,
    pub lambda: f64,
}

/// Ordered (α, λ) pairs of a sweep
#[derive(Debug, Clone, Serialize)]
pub struct LyapunovSweep {
    pub points: Vec<LyapunovEstimate>,
}

impl LyapunovSweep {
    pub fn alphas(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.alpha).collect()
    }

    pub fn lambdas(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.lambda).collect()
    }

    /// Grid point with the smallest |λ| (first one on ties)
    pub fn stability_boundary(&self) -> Option<LyapunovEstimate> {
        self.points.iter().copied().fold(None, |best, p| match best {
            Some(b) if b.lambda.abs() <= p.lambda.abs() => Some(b),
            _ => Some(p),
        })
    }
}

/// Twin-trajectory Lyapunov estimator
#[derive(Debug, Clone, Copy)]
pub struct LyapunovEstimator {
    integrator: SdeIntegrator,
    /// Initial separation δ₀
    delta0: f64,
    /// Lower bound on the final separation
    crash_floor: f64,
}

impl LyapunovEstimator {
    /// Create estimator
    ///
    /// # Arguments
    /// * `integrator` - Step size and horizon T
    /// * `delta0` - Initial separation (e.g. 1e-5)
    /// * `crash_floor` - Floor on |δ(T)| keeping the logarithm finite (e.g. 1e-12)
    pub fn new(integrator: SdeIntegrator, delta0: f64, crash_floor: f64) -> Result<Self> {
        ensure_positive("delta0", delta0)?;
        ensure_positive("crash_floor", crash_floor)?;
        Ok(Self {
            integrator,
            delta0,
            crash_floor,
        })
    }

    pub fn delta0(&self) -> f64 {
        self.delta0
    }

    pub fn crash_floor(&self) -> f64 {
        self.crash_floor
    }

    /// Exponent of one twin pair started at `initial` and `initial + δ₀`
    pub fn estimate<D, G>(
        &self,
        initial: D::State,
        drift: &D,
        diffusion: &G,
        seed: Option<u64>,
    ) -> Result<f64>
    where
        D: DriftModel + ?Sized,
        G: DiffusionModel<D::State> + ?Sized,
    {
        check_initial(initial)?;
        let mut rng = rng_from_seed(seed);

        let mut first = initial;
        let mut second = initial.perturbed(self.delta0);

        for i in 0..self.integrator.steps() {
            let t = self.integrator.time_at(i);
            let z = standard_normal(&mut rng);
            first = self.integrator.step(first, t, drift, diffusion, z);
            second = self.integrator.step(second, t, drift, diffusion, z);
        }

        let separation = (second.primary() - first.primary()).abs();
        if !separation.is_finite() {
            return Err(DynamicsError::NumericDegenerate(format!(
                "final twin separation is {}",
                separation
            )));
        }
        if separation < self.crash_floor {
            debug!(separation, floor = self.crash_floor, "separation floored");
        }

        let lambda = (separation.max(self.crash_floor) / self.delta0).ln() / self.integrator.horizon();
        if !lambda.is_finite() {
            return Err(DynamicsError::NumericDegenerate(format!(
                "lyapunov exponent is {}",
                lambda
            )));
        }
        Ok(lambda)
    }

    /// Independent estimates over an α grid, one derived seed per point
    pub fn sweep<M, G>(
        &self,
        initial: M::State,
        model: &M,
        diffusion: &G,
        alphas: &[f64],
        base_seed: u64,
        seed_policy: SeedPolicy,
    ) -> Result<LyapunovSweep>
    where
        M: DriftModel + Controllable<Parameter = f64> + Clone,
        G: DiffusionModel<M::State> + ?Sized,
    {
        if alphas.is_empty() {
            return Err(DynamicsError::Config("lyapunov sweep grid is empty".into()));
        }

        let mut points = Vec::with_capacity(alphas.len());
        for &alpha in alphas {
            let point_model = model.with_parameter(alpha);
            let seed = seed_policy.seed_for(base_seed, alpha);
            let lambda = self.estimate(initial, &point_model, diffusion, Some(seed))?;
            debug!(alpha, lambda, seed, "lyapunov point");
            points.push(LyapunovEstimate { alpha, lambda });
        }

        let sweep = LyapunovSweep { points };
        if let Some(boundary) = sweep.stability_boundary() {
            info!(
                points = alphas.len(),
                boundary_alpha = boundary.alpha,
                boundary_lambda = boundary.lambda,
                "lyapunov sweep finished"
            );
        }
        Ok(sweep)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::systems::{BistableDrift, MultiplicativeNoise};

    fn estimator(horizon: f64) -> LyapunovEstimator {
        let integrator = SdeIntegrator::new(0.01, horizon).unwrap();
        LyapunovEstimator::new(integrator, 1e-5, 1e-12).unwrap()
    }

    fn stability_model(alpha: f64) -> BistableDrift {
        BistableDrift::new(0.5, 0.2, alpha, 1.0).unwrap()
    }

    #[test]
    fn test_divergent_drift_positive() {
        // Twins straddle the unstable threshold θ with no noise
        let est = estimator(50.0);
        let quiet = MultiplicativeNoise::new(0.0).unwrap();
        let lambda = est.estimate(0.2, &stability_model(0.0), &quiet, Some(1)).unwrap();
        assert!(lambda > 0.0, "Expected divergence, got lambda = {}", lambda);
    }

    #[test]
    fn test_contracting_drift_negative() {
        let est = estimator(50.0);
        let quiet = MultiplicativeNoise::new(0.0).unwrap();
        let lambda = est.estimate(1.0, &stability_model(3.0), &quiet, Some(1)).unwrap();
        assert!(lambda < 0.0, "Expected contraction, got lambda = {}", lambda);
    }

    #[test]
    fn test_shared_noise_keeps_stable_regime_negative() {
        let est = estimator(50.0);
        let noise = MultiplicativeNoise::new(0.05).unwrap();
        for seed in [1, 2, 3] {
            let lambda = est.estimate(1.0, &stability_model(0.05), &noise, Some(seed)).unwrap();
            assert!(lambda < 0.0, "seed {}: lambda = {}", seed, lambda);
        }
    }

    #[test]
    fn test_floor_bounds_exponent() {
        // Both twins collapse onto B = 0: separation underflows to the floor
        let est = estimator(50.0);
        let quiet = MultiplicativeNoise::new(0.0).unwrap();
        let lambda = est.estimate(1.0, &stability_model(10.0), &quiet, Some(1)).unwrap();
        let floored = (1e-12_f64 / 1e-5).ln() / 50.0;
        assert!(lambda >= floored - 1e-12, "lambda {} below floor {}", lambda, floored);
    }

    #[test]
    fn test_estimate_reproducible() {
        let est = estimator(20.0);
        let noise = MultiplicativeNoise::new(0.1).unwrap();
        let model = stability_model(0.5);
        let a = est.estimate(1.0, &model, &noise, Some(77)).unwrap();
        let b = est.estimate(1.0, &model, &noise, Some(77)).unwrap();
        assert_eq!(a.to_bits(), b.to_bits());
    }

    #[test]
    fn test_seed_policy() {
        let policy = SeedPolicy::default();
        assert_eq!(policy.seed_for(123, 0.5), 623);
        assert_eq!(policy.seed_for(123, 0.0505), 173);
        assert_eq!(SeedPolicy::Fixed.seed_for(123, 2.0), 123);
        assert_eq!(policy.seed_for(5, -0.004), 1);
    }

    #[test]
    fn test_sweep_boundary_near_fold() {
        let est = estimator(60.0);
        let quiet = MultiplicativeNoise::new(0.0).unwrap();
        let alphas: Vec<f64> = (0..=40).map(|i| i as f64 * 0.025).collect();

        let sweep = est
            .sweep(1.0, &stability_model(0.0), &quiet, &alphas, 123, SeedPolicy::default())
            .unwrap();
        assert_eq!(sweep.points.len(), alphas.len());
        assert!(sweep.lambdas()[0] < 0.0);
        assert!(sweep.lambdas()[40] < 0.0);

        let boundary = sweep.stability_boundary().unwrap();
        assert!(
            boundary.alpha > 0.02 && boundary.alpha < 0.35,
            "Expected boundary near the fold, got alpha = {}",
            boundary.alpha
        );
    }

    #[test]
    fn test_boundary_is_argmin_abs() {
        let sweep = LyapunovSweep {
            points: vec![
                LyapunovEstimate { alpha: 0.1, lambda: -0.4 },
                LyapunovEstimate { alpha: 0.2, lambda: 0.05 },
                LyapunovEstimate { alpha: 0.3, lambda: -0.05 },
                LyapunovEstimate { alpha: 0.4, lambda: 0.3 },
            ],
        };
        assert_eq!(sweep.stability_boundary().unwrap().alpha, 0.2);
        assert!(LyapunovSweep { points: vec![] }.stability_boundary().is_none());
    }

    #[test]
    fn test_invalid_arguments() {
        let integrator = SdeIntegrator::new(0.01, 1.0).unwrap();
        assert!(LyapunovEstimator::new(integrator, 0.0, 1e-12).is_err());
        assert!(LyapunovEstimator::new(integrator, 1e-5, -1.0).is_err());

        let est = estimator(1.0);
        let quiet = MultiplicativeNoise::new(0.0).unwrap();
        assert!(est
            .sweep(1.0, &stability_model(0.0), &quiet, &[], 1, SeedPolicy::Fixed)
            .is_err());
    }
}
