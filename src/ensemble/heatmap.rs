//! Collapse heatmap over the (α, σ) plane.
//!
//! Each cell runs a full ensemble in collapse-only mode and stores the
//! mean collapse time. Cells are seeded from a master generator so the
//! whole map is reproducible from one seed.

use ndarray::Array2;
use rand::Rng;
use serde::Serialize;
use tracing::info;

use super::simulator::EnsembleSimulator;
use crate::error::{DynamicsError, Result};
use crate::integrator::rng_from_seed;
use crate::systems::{Controllable, DriftModel, MultiplicativeNoise};

/// Upper bound (exclusive) of per-cell sub-seeds
const SUB_SEED_RANGE: u64 = 1_000_000_000;

/// Mean collapse time on a σ × α grid
#[derive(Debug, Clone, Serialize)]
pub struct CollapseHeatmap {
    pub alpha_grid: Vec<f64>,
    pub sigma_grid: Vec<f64>,
    /// [sigma, alpha] mean collapse times
    pub mean_collapse_time: Array2<f64>,
}

impl CollapseHeatmap {
    /// Cell with the earliest mean collapse, as (α, σ, T_crash)
    pub fn fastest_collapse(&self) -> Option<(f64, f64, f64)> {
        self.mean_collapse_time
            .indexed_iter()
            .min_by(|a, b| a.1.total_cmp(b.1))
            .map(|((i, j), &t)| (self.alpha_grid[j], self.sigma_grid[i], t))
    }
}

/// Sweep α and σ with multiplicative noise σ·B
pub fn collapse_heatmap<M>(
    simulator: &EnsembleSimulator,
    model: &M,
    alpha_grid: &[f64],
    sigma_grid: &[f64],
    seed: u64,
) -> Result<CollapseHeatmap>
where
    M: DriftModel<State = f64> + Controllable<Parameter = f64> + Clone,
{
    if alpha_grid.is_empty() || sigma_grid.is_empty() {
        return Err(DynamicsError::Config("heatmap grids must not be empty".into()));
    }

    let mut master = rng_from_seed(Some(seed));
    let mut heat = Array2::zeros((sigma_grid.len(), alpha_grid.len()));

    for (i, &sigma) in sigma_grid.iter().enumerate() {
        let noise = MultiplicativeNoise::new(sigma)?;
        for (j, &alpha) in alpha_grid.iter().enumerate() {
            let sub_seed = master.random_range(0..SUB_SEED_RANGE);
            let cell_model = model.with_parameter(alpha);
            let stats = simulator.run_collapse_only(&cell_model, &noise, Some(sub_seed))?;
            heat[[i, j]] = stats.mean_collapse_time();
        }
    }

    let map = CollapseHeatmap {
        alpha_grid: alpha_grid.to_vec(),
        sigma_grid: sigma_grid.to_vec(),
        mean_collapse_time: heat,
    };
    if let Some((alpha, sigma, t)) = map.fastest_collapse() {
        info!(
            cells = alpha_grid.len() * sigma_grid.len(),
            fastest_alpha = alpha,
            fastest_sigma = sigma,
            fastest_t_crash = t,
            "collapse heatmap finished"
        );
    }
    Ok(map)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::integrator::SdeIntegrator;
    use crate::systems::BistableDrift;

    fn small_simulator() -> EnsembleSimulator {
        let integrator = SdeIntegrator::new(0.05, 30.0).unwrap();
        EnsembleSimulator::new(integrator, 40, 0.1).unwrap()
    }

    #[test]
    fn test_heatmap_shape_and_bounds() {
        let sim = small_simulator();
        let model = BistableDrift::default();
        let alphas = [0.0, 0.5, 1.5];
        let sigmas = [0.0, 0.2];

        let map = collapse_heatmap(&sim, &model, &alphas, &sigmas, 99).unwrap();
        assert_eq!(map.mean_collapse_time.dim(), (2, 3));
        assert!(map
            .mean_collapse_time
            .iter()
            .all(|&t| (0.0..=30.0).contains(&t)));
    }

    #[test]
    fn test_extraction_accelerates_collapse() {
        let sim = small_simulator();
        let model = BistableDrift::default();
        let map = collapse_heatmap(&sim, &model, &[0.0, 2.0], &[0.05], 7).unwrap();

        let healthy = map.mean_collapse_time[[0, 0]];
        let extracted = map.mean_collapse_time[[0, 1]];
        assert_eq!(healthy, 30.0, "no extraction should never collapse");
        assert!(extracted < 10.0, "Expected fast collapse, got {}", extracted);
        assert_eq!(map.fastest_collapse().unwrap().0, 2.0);
    }

    #[test]
    fn test_heatmap_reproducible() {
        let sim = small_simulator();
        let model = BistableDrift::default();
        let a = collapse_heatmap(&sim, &model, &[0.3, 0.6], &[0.3], 5).unwrap();
        let b = collapse_heatmap(&sim, &model, &[0.3, 0.6], &[0.3], 5).unwrap();
        assert_eq!(a.mean_collapse_time, b.mean_collapse_time);
    }

    #[test]
    fn test_empty_grid_rejected() {
        let sim = small_simulator();
        assert!(collapse_heatmap(&sim, &BistableDrift::default(), &[], &[0.1], 1).is_err());
    }
}
