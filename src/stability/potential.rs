//! Potential landscape V(B) = -∫ f(b) db.
//!
//! On a uniform grid with spacing ΔB the integral is a cumulative sum:
//!
//!   V[i] = -ΔB · Σ_{j ≤ i} f(B_j)
//!
//! Local minima of V are stable states, local maxima are the barriers a
//! path must cross to collapse. Purely deterministic.

use ndarray::Array1;
use serde::Serialize;

use crate::error::{ensure_finite, DynamicsError, Result};
use crate::systems::{Controllable, DriftModel};

/// Sampled (B, V) curve
#[derive(Debug, Clone, Serialize)]
pub struct PotentialCurve {
    pub b: Array1<f64>,
    pub v: Array1<f64>,
}

impl PotentialCurve {
    /// (B, V) pairs in grid order
    pub fn points(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.b.iter().copied().zip(self.v.iter().copied())
    }

    /// Interior grid points where V has a local minimum (stable states)
    pub fn local_minima(&self) -> Vec<f64> {
        self.interior_extrema(|prev, cur, next| cur < prev && cur <= next)
    }

    /// Interior grid points where V has a local maximum (barriers)
    pub fn local_maxima(&self) -> Vec<f64> {
        self.interior_extrema(|prev, cur, next| cur > prev && cur >= next)
    }

    fn interior_extrema<F>(&self, is_extremum: F) -> Vec<f64>
    where
        F: Fn(f64, f64, f64) -> bool,
    {
        let n = self.v.len();
        if n < 3 {
            return Vec::new();
        }
        (1..n - 1)
            .filter(|&i| is_extremum(self.v[i - 1], self.v[i], self.v[i + 1]))
            .map(|i| self.b[i])
            .collect()
    }
}

/// Potential curve at one α
#[derive(Debug, Clone, Serialize)]
pub struct AlphaPotential {
    pub alpha: f64,
    pub curve: PotentialCurve,
}

/// Uniform state grid the potential is evaluated on
#[derive(Debug, Clone)]
pub struct PotentialLandscape {
    grid: Array1<f64>,
    spacing: f64,
}

impl PotentialLandscape {
    /// `points` evenly spaced values from `start` to `end` inclusive
    pub fn uniform(start: f64, end: f64, points: usize) -> Result<Self> {
        ensure_finite("grid_start", start)?;
        ensure_finite("grid_end", end)?;
        if end <= start {
            return Err(DynamicsError::invalid("grid_end", end, "must exceed grid_start"));
        }
        if points < 2 {
            return Err(DynamicsError::invalid(
                "grid_points",
                points as f64,
                "need at least two grid points",
            ));
        }

        let grid = Array1::linspace(start, end, points);
        let spacing = grid[1] - grid[0];
        Ok(Self { grid, spacing })
    }

    pub fn grid(&self) -> &Array1<f64> {
        &self.grid
    }

    pub fn spacing(&self) -> f64 {
        self.spacing
    }

    /// Potential of one drift model
    pub fn curve<D>(&self, drift: &D) -> PotentialCurve
    where
        D: DriftModel<State = f64> + ?Sized,
    {
        let mut acc = 0.0;
        let v = self.grid.mapv(|b| {
            acc += drift.drift(b, 0.0);
            -acc * self.spacing
        });

        PotentialCurve {
            b: self.grid.clone(),
            v,
        }
    }

    /// One curve per α
    pub fn curves<M>(&self, model: &M, alphas: &[f64]) -> Vec<AlphaPotential>
    where
        M: DriftModel<State = f64> + Controllable<Parameter = f64> + Clone,
    {
        alphas
            .iter()
            .map(|&alpha| AlphaPotential {
                alpha,
                curve: self.curve(&model.with_parameter(alpha)),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::systems::BistableDrift;

    fn landscape() -> PotentialLandscape {
        PotentialLandscape::uniform(0.0, 1.2, 400).unwrap()
    }

    #[test]
    fn test_cumulative_sum() {
        let land = PotentialLandscape::uniform(0.0, 1.0, 3).unwrap();
        let model = BistableDrift::new(0.8, 0.3, 1.0, 0.5).unwrap();
        let curve = land.curve(&model);

        let f0 = model.rate(0.0);
        let f1 = model.rate(0.5);
        assert_eq!(curve.v[0], -f0 * 0.5);
        assert!((curve.v[1] - (-(f0 + f1) * 0.5)).abs() < 1e-15);
    }

    #[test]
    fn test_sign_consistency_with_drift() {
        let land = landscape();
        for alpha in [0.0, 0.05, 0.5, 2.0] {
            let model = BistableDrift::new(0.5, 0.2, alpha, 1.0).unwrap();
            let curve = land.curve(&model);
            for i in 1..curve.v.len() {
                let f = model.rate(curve.b[i]);
                let dv = curve.v[i] - curve.v[i - 1];
                if f > 0.0 {
                    assert!(dv < 0.0, "alpha {}: V rising where drift > 0 at B = {}", alpha, curve.b[i]);
                } else if f < 0.0 {
                    assert!(dv > 0.0, "alpha {}: V falling where drift < 0 at B = {}", alpha, curve.b[i]);
                }
            }
        }
    }

    #[test]
    fn test_extrema_match_equilibria() {
        let land = landscape();
        let model = BistableDrift::new(0.5, 0.2, 0.0, 1.0).unwrap();
        let curve = land.curve(&model);
        let tol = 2.0 * land.spacing();

        let minima = curve.local_minima();
        let maxima = curve.local_maxima();
        assert_eq!(minima.len(), 1, "minima: {:?}", minima);
        assert_eq!(maxima.len(), 1, "maxima: {:?}", maxima);
        assert!((minima[0] - 1.0).abs() < tol, "stable state at {}", minima[0]);
        assert!((maxima[0] - 0.2).abs() < tol, "barrier at {}", maxima[0]);
    }

    #[test]
    fn test_barrier_vanishes_above_fold() {
        let land = landscape();
        let curves = land.curves(&BistableDrift::new(0.5, 0.2, 0.0, 1.0).unwrap(), &[0.1, 0.5, 1.0, 2.0]);
        assert_eq!(curves.len(), 4);
        for entry in curves {
            assert!(entry.curve.local_minima().is_empty(), "alpha {}", entry.alpha);
            assert!(entry.curve.local_maxima().is_empty(), "alpha {}", entry.alpha);
        }
    }

    #[test]
    fn test_invalid_grid() {
        assert!(PotentialLandscape::uniform(1.0, 0.0, 10).is_err());
        assert!(PotentialLandscape::uniform(0.0, 1.0, 1).is_err());
        assert!(PotentialLandscape::uniform(f64::NAN, 1.0, 10).is_err());
    }
}
