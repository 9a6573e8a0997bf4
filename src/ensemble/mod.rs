//! Ensemble Module: Monte-Carlo Collapse Statistics
//!
//! Runs many independent stochastic paths of a scalar model and tracks
//! collapse events, i.e. crossings of B below `crash_threshold`:
//!
//! - **Per-step count** of collapsed paths → survival curve
//! - **Per-path first crossing** → collapse time distribution
//! - **Heatmap** of mean collapse time over (α, σ)

mod heatmap;
mod simulator;

pub use heatmap::{collapse_heatmap, CollapseHeatmap};
pub use simulator::{CollapseStats, EnsembleResult, EnsembleSimulator};
