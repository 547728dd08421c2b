//! `softmux` command-line harness.
//!
//! Runs one seeded simulation, prints the final estimates and selection
//! counts, and writes the running-average chart.
//!
//! Run:
//! `cargo run -- --backends 5 --steps 1000 --temperature 25 --seed 7`

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use rand::Rng;
use tracing::info;

use softmux::chart::{render_average_latency, ChartConfig};
use softmux::{Report, Simulation, SimulationConfig, SoftmaxConfig};

/// Softmax backend selection against simulated drifting backends.
#[derive(Parser, Debug)]
#[command(name = "softmux", version)]
struct Cli {
    /// Number of backends (K).
    #[arg(short = 'k', long, env = "SOFTMUX_BACKENDS", default_value_t = 5)]
    backends: usize,

    /// Number of requests to simulate (N).
    #[arg(short = 'n', long, env = "SOFTMUX_STEPS", default_value_t = 1000)]
    steps: usize,

    /// Softmax temperature (> 0).
    #[arg(short = 't', long, env = "SOFTMUX_TEMPERATURE", default_value_t = 25.0)]
    temperature: f64,

    /// RNG seed. If omitted, one is drawn from the OS and logged.
    #[arg(long, env = "SOFTMUX_SEED")]
    seed: Option<u64>,

    /// Where to write the running-average chart (SVG).
    #[arg(long, env = "SOFTMUX_CHART", default_value = "softmax_analysis.svg")]
    chart: PathBuf,

    /// Skip writing the chart.
    #[arg(long)]
    no_chart: bool,

    /// Print the full report as JSON instead of the table.
    #[arg(long)]
    json: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn print_report(report: &Report) {
    println!("Final latency estimates:");
    for (i, (est, count)) in report.estimates.iter().zip(&report.counts).enumerate() {
        println!("  backend {i}: {est:8.2}  (selected {count} times)");
    }
    if let Some(avg) = report.final_average {
        println!("Average latency over {} requests: {avg:.2}", report.steps);
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let seed = cli.seed.unwrap_or_else(|| rand::rng().random());
    info!(seed, "using seed");

    let cfg = SimulationConfig {
        backends: cli.backends,
        steps: cli.steps,
        seed,
        policy: SoftmaxConfig {
            temperature: cli.temperature,
            ..SoftmaxConfig::default()
        },
        ..SimulationConfig::default()
    };
    let mut sim = Simulation::new(&cfg).context("invalid simulation parameters")?;
    sim.run_configured();
    let report = sim.report();

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }

    if !cli.no_chart {
        render_average_latency(
            &cli.chart,
            &report.running_averages,
            &ChartConfig::for_temperature(cli.temperature),
        )
        .with_context(|| format!("writing chart to {}", cli.chart.display()))?;
        info!(path = %cli.chart.display(), "chart written");
    }
    Ok(())
}
