//! Stochastic Collapse Ensemble
//!
//! Monte-Carlo study of the bistable bandwidth model under extraction α and
//! multiplicative noise σ·B.
//!
//! ## Protocol
//!
//! 1. Run N paths from B(0) = 1 and book first crossings of the threshold
//! 2. Report the survival curve and collapse-time statistics
//! 3. Compare α against the deterministic fold point α_c
//! 4. Sweep (α, σ) and map the mean collapse time

use std::path::PathBuf;

use clap::{Parser, ValueHint};
use negentropy_dynamics::{
    collapse_heatmap, init_tracing, save_json, Bifurcating, CollapseHeatmap, CollapseStats,
    EnsembleConfig, ExperimentConfig,
};
use ndarray::Array1;
use serde::Serialize;

#[derive(Parser)]
#[command(author, version, about = "Monte-Carlo collapse statistics of the bistable bandwidth model")]
struct Cli {
    /// JSON experiment configuration (defaults when omitted)
    #[arg(long, value_hint = ValueHint::FilePath)]
    config: Option<PathBuf>,

    /// Write the ensemble summary and heatmap as JSON
    #[arg(long, value_hint = ValueHint::FilePath)]
    output: Option<PathBuf>,

    /// Override the ensemble seed
    #[arg(long)]
    seed: Option<u64>,

    /// Skip the (α, σ) heatmap sweep
    #[arg(long)]
    skip_heatmap: bool,
}

#[derive(Serialize)]
struct Report<'a> {
    config: &'a EnsembleConfig,
    time: Array1<f64>,
    mean_path: Array1<f64>,
    survival: Array1<f64>,
    collapse: &'a CollapseStats,
    heatmap: Option<CollapseHeatmap>,
}

fn main() -> anyhow::Result<()> {
    init_tracing()?;
    let cli = Cli::parse();

    let mut config = ExperimentConfig::load(cli.config.as_deref())?;
    if let Some(seed) = cli.seed {
        config.ensemble.seed = seed;
    }
    let ens = &config.ensemble;

    println!("═══════════════════════════════════════════════════════════════");
    println!("  Stochastic Collapse Ensemble: Euler–Maruyama Monte-Carlo");
    println!("═══════════════════════════════════════════════════════════════\n");

    println!("System Parameters:");
    println!("  r = {:.2}, θ = {:.2}, a = {:.2}", ens.model.r, ens.model.theta, ens.model.attack_coeff);
    println!("  α = {:.3}, σ = {:.3}", ens.alpha, ens.sigma);
    println!("  T = {:.1}, dt = {:.3}, N = {}", ens.horizon, ens.dt, ens.simulations);
    println!("  Crash threshold = {:.2}, seed = {}", ens.crash_threshold, ens.seed);
    println!();

    let drift = ens.drift()?;
    let noise = ens.noise()?;
    let simulator = ens.simulator()?;

    match drift.critical_parameter() {
        Some(alpha_c) => println!(
            "Fold point ({}): α_c = {:.4}  →  α {} α_c\n",
            drift.bifurcation_type(),
            alpha_c,
            if ens.alpha > alpha_c { ">" } else { "≤" }
        ),
        None => println!("No fold point for these coefficients\n"),
    }

    println!("Running ensemble...");
    let result = simulator.run(&drift, &noise, Some(ens.seed))?;
    let survival = result.collapse.survival_curve();
    let steps = result.steps();

    println!("\nSurvival Curve:");
    println!("  {:>8}  {:>10}  {:>10}", "t", "survival", "mean B");
    let mean_path = result.mean_path();
    for k in 0..=8 {
        let i = (k * (steps - 1)) / 8;
        println!(
            "  {:>8.2}  {:>10.4}  {:>10.4}",
            result.time[i], survival[i], mean_path[i]
        );
    }

    println!("\nCollapse Statistics:");
    println!("  Collapsed fraction  = {:.3}", result.collapse.collapsed_fraction());
    println!("  Mean collapse time  = {:.3}", result.collapse.mean_collapse_time());
    let finals = result.final_states();
    println!(
        "  Final B: mean = {:.4}, min = {:.4}, max = {:.4}",
        finals.mean().unwrap_or(f64::NAN),
        finals.iter().copied().fold(f64::INFINITY, f64::min),
        finals.iter().copied().fold(f64::NEG_INFINITY, f64::max)
    );

    let heatmap = if cli.skip_heatmap {
        None
    } else {
        let heat_cfg = &config.heatmap;
        println!("\n═══════════════════════════════════════════════════════════════");
        println!("  Collapse Heatmap: mean T_crash over (α, σ)");
        println!("═══════════════════════════════════════════════════════════════\n");
        println!(
            "  α ∈ [{:.2}, {:.2}] × {}, σ ∈ [{:.2}, {:.2}] × {}, N = {}",
            heat_cfg.alpha_grid.start,
            heat_cfg.alpha_grid.end,
            heat_cfg.alpha_grid.points,
            heat_cfg.sigma_grid.start,
            heat_cfg.sigma_grid.end,
            heat_cfg.sigma_grid.points,
            heat_cfg.simulations
        );

        let heat_sim = heat_cfg.simulator(ens)?;
        let heat = collapse_heatmap(
            &heat_sim,
            &drift,
            &heat_cfg.alpha_grid.values(),
            &heat_cfg.sigma_grid.values(),
            heat_cfg.seed,
        )?;

        println!("\n  σ \\ α    first α   mid α    last α");
        let cols = heat.alpha_grid.len();
        for (i, sigma) in heat.sigma_grid.iter().enumerate() {
            let row = heat.mean_collapse_time.row(i);
            println!(
                "  {:>6.3}  {:>8.2}  {:>8.2}  {:>8.2}",
                sigma,
                row[0],
                row[cols / 2],
                row[cols - 1]
            );
        }
        if let Some((alpha, sigma, t)) = heat.fastest_collapse() {
            println!("\n  Fastest collapse: α = {:.3}, σ = {:.3}, T_crash = {:.3}", alpha, sigma, t);
        }
        Some(heat)
    };

    if let Some(path) = cli.output.as_ref() {
        let report = Report {
            config: ens,
            time: result.time.clone(),
            mean_path,
            survival,
            collapse: &result.collapse,
            heatmap,
        };
        save_json(&report, path)?;
        println!("\nReport saved: {}", path.display());
    }

    Ok(())
}
