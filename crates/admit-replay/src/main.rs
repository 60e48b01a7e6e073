//! admit-replay - Entry Point
//!
//! Replays a JSON-lines scenario of orders, cancels and gateway events
//! through the pre-trade checks and prints every decision.

use std::path::Path;

use admit_engine::RiskSettings;
use admit_replay::{read_scenario, AppConfig, Replayer};
use anyhow::Result;
use clap::Parser;
use tracing::info;

const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

/// Pre-trade risk check replay
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Scenario file (JSON lines)
    scenario: String,

    /// Configuration file path (can also be set via ADMIT_CONFIG env var)
    #[arg(short, long)]
    config: Option<String>,

    /// Rule settings file, overriding `settings_path` from the config
    #[arg(short, long)]
    settings: Option<String>,

    /// Write the final rule parameters to this file (TOML or JSON)
    #[arg(long)]
    save_settings: Option<String>,

    /// Print decisions as JSON lines
    #[arg(long)]
    json: bool,

    /// Print Prometheus metrics after the snapshot
    #[arg(long)]
    metrics: bool,
}

fn load_config(path: Option<String>) -> Result<AppConfig> {
    // CLI arg > ADMIT_CONFIG env var > default path if present
    match path.or_else(|| std::env::var("ADMIT_CONFIG").ok()) {
        Some(path) => Ok(AppConfig::from_file(&path)?),
        None if Path::new(DEFAULT_CONFIG_PATH).exists() => {
            Ok(AppConfig::from_file(DEFAULT_CONFIG_PATH)?)
        }
        None => Ok(AppConfig::default()),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = load_config(args.config)?;
    admit_telemetry::init_logging(config.telemetry.log_level.as_deref())?;

    info!("Starting admit-replay v{}", env!("CARGO_PKG_VERSION"));

    let settings = match args.settings.as_ref().or(config.settings_path.as_ref()) {
        Some(path) => {
            info!(settings_path = %path, "Loading rule settings");
            RiskSettings::load(path)?
        }
        None => RiskSettings::new(),
    };

    let steps = read_scenario(&args.scenario)?;
    info!(scenario = %args.scenario, steps = steps.len(), "Scenario loaded");

    let start_ms = config
        .start_ms
        .or_else(|| steps.first().map(|s| s.at_ms))
        .unwrap_or(0);

    let mut replayer = Replayer::new(&config, &settings, start_ms)?;
    let mut denied = 0usize;
    for step in &steps {
        let decision = replayer.step(step).await?;
        if decision.is_denied() {
            denied += 1;
        }
        if args.json {
            println!("{}", serde_json::to_string(&decision)?);
        } else {
            println!("{}", decision);
        }
    }

    let (snapshot, final_settings) = replayer.finish().await?;
    println!("{}", snapshot.to_json_pretty()?);

    if let Some(path) = &args.save_settings {
        final_settings.save(path)?;
    }

    if args.metrics {
        println!("{}", admit_telemetry::encode_metrics()?);
    }

    info!(steps = steps.len(), denied, "Replay finished");
    Ok(())
}
