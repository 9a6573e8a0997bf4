//! Stability Scan: Potential Landscapes and Lyapunov Exponents
//!
//! ## Protocol
//!
//! 1. Integrate the drift into V(B) for a few α values and list the
//!    stable states and barriers
//! 2. Sweep α with twin trajectories under shared noise to get λ(α)
//! 3. Locate the grid point with |λ| minimal (stability boundary) and
//!    compare it with the analytic fold point

use std::path::PathBuf;

use clap::{Parser, ValueHint};
use negentropy_dynamics::{
    init_tracing, save_json, AlphaPotential, Bifurcating, ExperimentConfig, LyapunovSweep,
};
use serde::Serialize;

#[derive(Parser)]
#[command(author, version, about = "Potential landscape and Lyapunov sweep of the bistable bandwidth model")]
struct Cli {
    /// JSON experiment configuration (defaults when omitted)
    #[arg(long, value_hint = ValueHint::FilePath)]
    config: Option<PathBuf>,

    /// Write potential curves and the Lyapunov sweep as JSON
    #[arg(long, value_hint = ValueHint::FilePath)]
    output: Option<PathBuf>,

    /// Override the Lyapunov base seed
    #[arg(long)]
    seed: Option<u64>,
}

#[derive(Serialize)]
struct Report {
    potentials: Vec<AlphaPotential>,
    lyapunov: LyapunovSweep,
    fold_point: Option<f64>,
}

fn main() -> anyhow::Result<()> {
    init_tracing()?;
    let cli = Cli::parse();

    let mut config = ExperimentConfig::load(cli.config.as_deref())?;
    if let Some(seed) = cli.seed {
        config.lyapunov.seed = seed;
    }

    println!("═══════════════════════════════════════════════════════════════");
    println!("  Stability Scan: Potential Landscape + Lyapunov Exponent");
    println!("═══════════════════════════════════════════════════════════════\n");

    // Potential landscape
    let pot = &config.potential;
    let landscape = pot.landscape()?;
    let base = pot.model.model(0.0)?;
    let potentials = landscape.curves(&base, &pot.alphas);

    println!("Potential V(B) = -∫ f(b) db on [{:.2}, {:.2}] ({} points)", pot.grid.start, pot.grid.end, pot.grid.points);
    for entry in &potentials {
        let minima = entry.curve.local_minima();
        let maxima = entry.curve.local_maxima();
        println!(
            "  α = {:.2}: minima {:?}, barriers {:?}, V(end) = {:.4}",
            entry.alpha,
            minima.iter().map(|b| (b * 1000.0).round() / 1000.0).collect::<Vec<_>>(),
            maxima.iter().map(|b| (b * 1000.0).round() / 1000.0).collect::<Vec<_>>(),
            entry.curve.v.last().copied().unwrap_or(f64::NAN)
        );
    }
    println!();

    // Lyapunov sweep
    let lya = &config.lyapunov;
    let estimator = lya.estimator()?;
    let model = lya.model.model(0.0)?;
    let noise = lya.noise()?;
    let alphas = lya.alpha_grid.values();

    println!("Lyapunov Sweep:");
    println!("  σ = {:.3}, T = {:.1}, dt = {:.3}, δ₀ = {:.1e}", lya.sigma, lya.horizon, lya.dt, lya.delta0);
    println!("  α ∈ [{:.2}, {:.2}] × {}, base seed = {}", lya.alpha_grid.start, lya.alpha_grid.end, alphas.len(), lya.seed);
    println!();

    let sweep = estimator.sweep(lya.initial_state, &model, &noise, &alphas, lya.seed, lya.seed_policy)?;

    println!("  {:>8}  {:>12}", "α", "λ");
    for point in &sweep.points {
        let marker = if point.lambda > 0.0 { "  divergent" } else { "" };
        println!("  {:>8.3}  {:>12.4e}{}", point.alpha, point.lambda, marker);
    }

    let fold_point = model.critical_parameter();
    println!("\n═══════════════════════════════════════════════════════════════");
    println!("  RESULTS");
    println!("═══════════════════════════════════════════════════════════════\n");
    if let Some(boundary) = sweep.stability_boundary() {
        println!("  λ ≈ 0 crossing:  α ≈ {:.3}, λ ≈ {:.3e}", boundary.alpha, boundary.lambda);
    }
    match fold_point {
        Some(alpha_c) => println!("  Fold point ({}):  α_c = {:.4}", model.bifurcation_type(), alpha_c),
        None => println!("  No analytic fold point"),
    }

    if let Some(path) = cli.output.as_ref() {
        let report = Report {
            potentials,
            lyapunov: sweep,
            fold_point,
        };
        save_json(&report, path)?;
        println!("\nReport saved: {}", path.display());
    }

    Ok(())
}
