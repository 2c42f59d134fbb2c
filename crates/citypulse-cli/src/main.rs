//! # citypulse-cli
//!
//! Command-line interface for the CityPulse anomaly and forecast engines.

use citypulse_anomaly::AnomalyEngine;
use citypulse_core::{CityConfig, Reading};
use citypulse_forecast::ForecastEngine;
use clap::{Parser, Subcommand};
use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;
use std::sync::Arc;

type CliResult<T> = std::result::Result<T, String>;

#[derive(Parser)]
#[command(name = "citypulse")]
#[command(about = "Urban sensing anomaly detection and forecasting CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Score one sensor reading for anomalies
    Detect {
        /// JSON file holding a single reading
        #[arg(short, long)]
        input: PathBuf,

        /// Directory holding trained model artifacts
        #[arg(long, default_value = "models")]
        model_dir: PathBuf,
    },

    /// Forecast expected conditions for a node (or all nodes)
    Forecast {
        /// Node id; omit to forecast every configured node
        #[arg(short, long)]
        node: Option<String>,

        /// Forecast horizon in minutes
        #[arg(long, default_value = "60")]
        horizon: u32,
    },

    /// Fit the outlier model on synthesized baseline samples and persist it
    Train {
        /// Directory to write model artifacts into
        #[arg(long, default_value = "models")]
        model_dir: PathBuf,
    },
}

fn load_reading(path: &PathBuf) -> CliResult<Reading> {
    let file = File::open(path).map_err(|e| format!("Failed to open file: {}", e))?;
    serde_json::from_reader(BufReader::new(file))
        .map_err(|e| format!("Failed to parse reading: {}", e))
}

fn run(cli: Cli) -> CliResult<()> {
    let config = Arc::new(CityConfig::mohali());

    match cli.command {
        Commands::Detect { input, model_dir } => {
            let reading = load_reading(&input)?;
            let engine = AnomalyEngine::new(config, model_dir)
                .map_err(|e| format!("Failed to load model artifacts: {}", e))?;
            let verdict = engine
                .detect(&reading)
                .map_err(|e| format!("Detection failed: {}", e))?;
            println!("{}", serde_json::to_string_pretty(&verdict).unwrap());
        }
        Commands::Forecast { node, horizon } => {
            let engine = ForecastEngine::new(config);
            let json = match node {
                Some(node_id) => {
                    serde_json::to_string_pretty(&engine.predict_node(&node_id, horizon))
                }
                None => serde_json::to_string_pretty(&engine.predict_all(horizon)),
            };
            println!("{}", json.unwrap());
        }
        Commands::Train { model_dir } => {
            let engine = AnomalyEngine::new(config, &model_dir)
                .map_err(|e| format!("Failed to load model artifacts: {}", e))?;
            engine
                .train()
                .map_err(|e| format!("Training failed: {}", e))?;
            println!("Model artifacts written to {}", model_dir.display());
        }
    }

    Ok(())
}

fn main() {
    let cli = Cli::parse();
    if let Err(message) = run(cli) {
        eprintln!("error: {}", message);
        std::process::exit(1);
    }
}
