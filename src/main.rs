//! Flies a glider with an online UCT pilot (or the hand-tuned heuristic one)
//! and writes the trajectory as CSV.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, ValueEnum};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use soar::config::Settings;
use soar::glider::GliderModel;
use soar::pilot::{HeuristicPilot, UctPilot};
use soar::simulation::{Simulation, Summary};
use tracing::{info, warn};

#[derive(Clone, Copy, Debug, ValueEnum)]
enum PilotKind {
    /// Online UCT planning at every step.
    Uct,
    /// Derivative pitch control with wing levelling.
    Heuristic,
}

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// TOML settings file. Command line flags take precedence over it.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Number of search iterations per planning call.
    #[arg(long)]
    budget: Option<u32>,
    /// Rollout horizon, in steps.
    #[arg(long)]
    horizon: Option<u32>,
    /// Number of outer control steps.
    #[arg(long)]
    steps: Option<u32>,
    /// Seed of the planner random generator.
    #[arg(long, default_value_t = 0)]
    seed: u64,
    #[arg(long, value_enum, default_value_t = PilotKind::Uct)]
    pilot: PilotKind,
    /// Default log filter, `RUST_LOG` overrides it.
    #[arg(long, default_value = "info")]
    log_level: String,
    /// Trajectory output file, standard output if missing.
    #[arg(long)]
    output: Option<PathBuf>,
}

impl Args {
    fn settings(&self) -> anyhow::Result<Settings> {
        let mut settings = match &self.config {
            Some(path) => Settings::from_file(path)?,
            None => Settings::default(),
        };
        if let Some(budget) = self.budget {
            settings.planner.budget = budget;
        }
        if let Some(horizon) = self.horizon {
            settings.planner.horizon = horizon;
        }
        if let Some(steps) = self.steps {
            settings.simulation.steps = steps;
        }
        settings.validate()?;
        Ok(settings)
    }
}

fn init_tracing(level: &str) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    // Standard output carries the trajectory.
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();
}

fn fly(args: &Args, settings: Settings, output: &mut impl Write) -> anyhow::Result<Summary> {
    let model = GliderModel::new(
        &settings.glider,
        settings.zone,
        settings.planner.angle_rate_magnitude,
    );
    let simulation = Simulation::new(model.clone(), settings.simulation);
    match args.pilot {
        PilotKind::Uct => {
            let rng = ChaCha8Rng::seed_from_u64(args.seed);
            let mut pilot = UctPilot::new(model, settings.planner, rng);
            simulation.run(&mut pilot, output)
        },
        PilotKind::Heuristic => {
            let mut pilot = HeuristicPilot::new(settings.planner.angle_rate_magnitude);
            simulation.run(&mut pilot, output)
        },
    }
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_tracing(&args.log_level);
    info!(version = %soar::version(), "soar starting");
    if soar::is_dirty_build() {
        warn!("built with uncommitted changes");
    }

    let settings = args.settings()?;
    info!(
        pilot = ?args.pilot,
        budget = settings.planner.budget,
        horizon = settings.planner.horizon,
        seed = args.seed,
        "settings loaded"
    );

    let summary = match &args.output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            fly(&args, settings, &mut BufWriter::new(file))?
        },
        None => fly(&args, settings, &mut io::stdout().lock())?,
    };
    info!(
        steps = summary.steps,
        recoveries = summary.recoveries,
        outcome = ?summary.outcome,
        "done"
    );
    Ok(())
}
