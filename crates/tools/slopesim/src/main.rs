mod config;
mod course_gen;
mod run;

use std::path::PathBuf;
use std::time::Instant;

use anyhow::Context;
use clap::Parser;
use downhill_physics::SolverKind;
use tracing_subscriber::EnvFilter;

use crate::config::SimConfig;
use crate::run::SolverSwitch;

#[derive(Parser)]
#[command(name = "slopesim")]
#[command(about = "Headless downhill physics simulator", long_about = None)]
struct Cli {
    /// Configuration file; built-in defaults are used when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Integration method: euler, rk23 or rk45
    #[arg(short, long)]
    solver: Option<SolverKind>,

    /// Number of ticks to run
    #[arg(short, long)]
    ticks: Option<u32>,

    /// Seed for course generation
    #[arg(long)]
    seed: Option<u32>,

    /// Tick length in seconds
    #[arg(long)]
    dt: Option<f32>,

    /// Switch to another solver halfway through the run
    #[arg(long)]
    switch_to: Option<SolverKind>,

    /// Log per-contact events
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    let mut config = match &cli.config {
        Some(path) => SimConfig::load(path)?,
        None => SimConfig::default(),
    };
    apply_overrides(&mut config, &cli);
    config
        .physics
        .validate()
        .context("invalid physics configuration")?;
    anyhow::ensure!(
        config.run.dt.is_finite() && config.run.dt > 0.0,
        "tick length must be positive, got {}",
        config.run.dt
    );

    let started = Instant::now();
    let course = course_gen::generate(&config.course, &config.quadtree)?;
    tracing::info!(
        "[slopesim] generated '{}' ({}x{} cells, {} obstacles, {} leaves) in {:.1}ms",
        course.name(),
        course.field().width(),
        course.field().depth(),
        course.obstacles().len(),
        course.tree().leaf_count(),
        started.elapsed().as_secs_f64() * 1000.0
    );

    let mut stepper = run::start_at_top(&course, config.physics.clone())
        .context("failed to place the player")?;
    let switch = cli.switch_to.map(|kind| SolverSwitch {
        at_tick: config.run.ticks / 2,
        kind,
    });

    let started = Instant::now();
    let summary = run::run(&mut stepper, &config.run, switch);
    tracing::info!(
        "[slopesim] ran {} ticks in {:.1}ms",
        summary.ticks,
        started.elapsed().as_secs_f64() * 1000.0
    );

    println!("{summary}");
    Ok(())
}

fn apply_overrides(config: &mut SimConfig, cli: &Cli) {
    if let Some(kind) = cli.solver {
        config.physics.solver.kind = kind;
    }
    if let Some(ticks) = cli.ticks {
        config.run.ticks = ticks;
    }
    if let Some(seed) = cli.seed {
        config.course.seed = seed;
        config.run.seed = seed as u64;
    }
    if let Some(dt) = cli.dt {
        config.run.dt = dt;
    }
}
