mod app;
mod view;

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, ValueEnum};
use tracing_subscriber::EnvFilter;
use weber_core::{Gender, Player};
use weber_experiment::{ExperimentConfig, JsonLinesSink};

use app::App;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum GenderArg {
    Male,
    Female,
}

impl From<GenderArg> for Gender {
    fn from(g: GenderArg) -> Self {
        match g {
            GenderArg::Male => Gender::Male,
            GenderArg::Female => Gender::Female,
        }
    }
}

/// Numerosity discrimination assessment
#[derive(Parser, Debug)]
#[command(name = "weber", version, about)]
struct Args {
    /// JSON file overriding the default session parameters
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long)]
    subject_id: u32,

    #[arg(long, value_enum)]
    gender: GenderArg,

    #[arg(long)]
    age: u32,

    /// Trial records are appended here, one JSON object per line
    #[arg(long, default_value = "trials.jsonl")]
    output: PathBuf,

    /// Fixed seed for block order, stimuli and key orientation
    #[arg(long)]
    seed: Option<u64>,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => ExperimentConfig::from_json_path(path)?,
        None => ExperimentConfig::default(),
    };
    if args.seed.is_some() {
        config.seed = args.seed;
    }
    config.validate()?;

    let player = Player::new(args.subject_id.to_string(), args.gender.into(), args.age);
    let sink = JsonLinesSink::append(&args.output)
        .with_context(|| format!("opening {}", args.output.display()))?;

    tracing::info!(
        subject = args.subject_id,
        output = %args.output.display(),
        seed = ?config.seed,
        "starting session"
    );

    App::new(config, player, sink)?.run()
}
