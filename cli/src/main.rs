//! Resultline CLI
//!
//! Drives a result handler with a simulated algorithm so the reporting
//! pipeline can be exercised end to end from a terminal.
//!
//! # Usage
//!
//! ```bash
//! resultctl --help
//! resultctl run --start 2024-01-01T00:00:00Z --end 2024-03-01T00:00:00Z
//! resultctl run --live --duration-secs 10
//! resultctl config
//! ```

#![deny(unsafe_code)]

mod simulation;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use reporting::config::HandlerConfig;
use reporting::policy::RunDescriptorInput;
use reporting::sink::TracingSink;
use reporting::ResultHandler;
use simulation::SimulationSettings;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Resultline CLI - run the results reporting pipeline against a simulated algorithm
#[derive(Parser)]
#[command(name = "resultctl")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Emit logs as JSON
    #[arg(long, env = "RESULTS_LOG_JSON")]
    json: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a simulated algorithm through the result handler
    Run {
        /// Backtest start (RFC 3339)
        #[arg(long, requires = "end", conflicts_with = "live")]
        start: Option<DateTime<Utc>>,

        /// Backtest end (RFC 3339)
        #[arg(long, requires = "start", conflicts_with = "live")]
        end: Option<DateTime<Utc>>,

        /// Run in live mode instead of a backtest
        #[arg(long)]
        live: bool,

        /// Length of a live run in seconds
        #[arg(long, default_value_t = 5)]
        duration_secs: u64,

        /// Print the final report as JSON
        #[arg(long)]
        print_report: bool,
    },
    /// Show the effective handler configuration
    Config,
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    if cli.json {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    let config = HandlerConfig::from_env().context("invalid handler configuration")?;

    match cli.command {
        Some(Commands::Run {
            start,
            end,
            live,
            duration_secs,
            print_report,
        }) => {
            let input = match (start, end, live) {
                (None, None, false) => {
                    let (start, end) = simulation::trailing_days(30);
                    RunDescriptorInput {
                        start: Some(start),
                        end: Some(end),
                        live: false,
                    }
                }
                (start, end, live) => RunDescriptorInput { start, end, live },
            };
            let settings = SimulationSettings {
                live_duration: std::time::Duration::from_secs(duration_secs),
                ..SimulationSettings::default()
            };
            run(input, config, &settings, print_report)?;
        }
        Some(Commands::Config) => {
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
        None => {
            println!("Resultline CLI v{}", env!("CARGO_PKG_VERSION"));
            println!("Use --help for usage information");
        }
    }

    Ok(())
}

fn run(
    input: RunDescriptorInput,
    config: HandlerConfig,
    settings: &SimulationSettings,
    print_report: bool,
) -> Result<()> {
    let handler = Arc::new(ResultHandler::from_input(
        input,
        config,
        Arc::new(TracingSink),
    )?);
    handler.start()?;

    let summary = simulation::run(&handler, settings);
    let statistics = simulation::statistics(&summary, settings.starting_cash);
    let banner = BTreeMap::from([("Mode".to_string(), handler.policy().descriptor().mode().to_string())]);
    let report = handler.send_final_result(statistics, banner);

    handler.shutdown();
    tracing::info!(
        steps = summary.steps,
        samples = summary.equity_samples,
        orders = summary.orders,
        "Simulation finished"
    );

    if print_report {
        println!("{}", serde_json::to_string_pretty(&report)?);
    }
    Ok(())
}
