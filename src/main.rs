//! # Wave Front Application Entry Point
//!
//! This binary exposes the calibration engine in two ways: a one-shot
//! `profile` command that prints a single wave-front profile (ASCII chart or
//! JSON), and a `serve` command that runs the HTTP API.

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use wave_front_lib::accounting::CallLedger;
use wave_front_lib::config::Config;
use wave_front_lib::logging::init_logging;
use wave_front_lib::profile::WaveFrontService;
use wave_front_lib::renderer::draw_ascii;
use wave_front_lib::server::{self, validate_coordinate, AppState};
use wave_front_lib::sources::ledger_for;

#[derive(Parser, Debug)]
#[command(name = "wave-front")]
#[command(about = "Calibrated offshore wave-height profiles for the Chilean coast")]
struct Cli {
    /// Path to the configuration file [default: ./wave-config.toml]
    #[arg(long)]
    config: Option<PathBuf>,

    /// Debug-level logging for this crate
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Compute one profile and print it
    Profile {
        #[arg(long, allow_negative_numbers = true)]
        lat: f64,
        #[arg(long, allow_negative_numbers = true)]
        lon: f64,
        /// Print JSON instead of the ASCII chart
        #[arg(long)]
        json: bool,
    },
    /// Run the HTTP API
    Serve {
        /// Overrides `server.bind` from the configuration file
        #[arg(long)]
        bind: Option<SocketAddr>,
    },
}

/// Main application entry point.
fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = match &cli.config {
        Some(path) => Config::load_from_path(path),
        None => Config::load(),
    };

    // Create Tokio runtime for async operations
    let rt = tokio::runtime::Runtime::new()?;

    // Counters live for the lifetime of this process
    let ledger = Arc::new(ledger_for(&config.sources));
    let service = WaveFrontService::from_config(&config, ledger.clone())
        .context("building HTTP client for wave sources")?;

    match cli.command {
        Command::Profile { lat, lon, json } => {
            let point = validate_coordinate(lat, lon)?;
            let profile = rt.block_on(service.profile(point.latitude, point.longitude));

            if json {
                println!("{}", serde_json::to_string_pretty(&profile)?);
            } else {
                draw_ascii(&profile);
            }
        }
        Command::Serve { bind } => {
            let addr = match bind {
                Some(addr) => addr,
                None => config
                    .server
                    .bind
                    .parse()
                    .with_context(|| format!("invalid server.bind '{}'", config.server.bind))?,
            };
            info!(distances = ?service.distances(), "Starting wave front API");

            let state = AppState {
                service: Arc::new(service),
                ledger,
            };
            rt.block_on(server::serve(addr, state))?;
        }
    }

    Ok(())
}
