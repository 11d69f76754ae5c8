//! ceprace CLI entry point.
//!
//! Parses the flags, wires tracing, builds the default provider set, runs
//! one race, and prints the outcome. The slower provider is given its
//! bounded drain window after the answer is printed, matching the
//! coordinator's answer-then-cleanup ordering.

mod output;

use std::process::ExitCode;
use std::time::Duration;

use anyhow::Context;
use ceprace_core::{RaceConfig, RaceCoordinator, default_providers};
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Resolve a Brazilian postal code by racing two lookup services and
/// printing whichever answers first.
#[derive(Debug, Parser)]
#[command(name = "ceprace", version)]
struct Cli {
    /// Postal code (CEP) to resolve
    cep: String,

    /// How long to wait for the first provider answer
    #[arg(long, value_parser = humantime::parse_duration, default_value = "1s")]
    deadline: Duration,

    /// How long to wait for the slower provider after the race is decided
    #[arg(long, value_parser = humantime::parse_duration, default_value = "100ms")]
    drain_grace: Duration,

    /// Print the winning result as JSON instead of the text block
    #[arg(long)]
    json: bool,
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ceprace=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    init_tracing();

    let client = reqwest::Client::new();
    let coordinator = RaceCoordinator::new(
        default_providers(&client),
        RaceConfig {
            deadline: cli.deadline,
            drain_grace: cli.drain_grace,
        },
    );

    let resolution = coordinator.resolve(&cli.cep).await;
    let code = match &resolution.outcome {
        Ok(resolved) => {
            if cli.json {
                let rendered =
                    output::render_json(resolved).context("serializing result")?;
                println!("{rendered}");
            } else {
                print!("{}", output::render_block(resolved));
            }
            ExitCode::SUCCESS
        }
        Err(err) if err.is_timeout() => {
            println!("demorou demais :(");
            ExitCode::FAILURE
        }
        Err(err) => {
            println!("erro: {err}");
            ExitCode::FAILURE
        }
    };

    resolution.settled().await;
    Ok(code)
}
