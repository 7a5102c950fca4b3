// src/main.rs

use std::process;

use chrono::Local;
use clap::Parser;
use color_eyre::eyre::{Result, WrapErr};
use serde::Serialize;
use tracing::{debug, info};

use vanguard_posture::config::Cli;
use vanguard_posture::logging::initialize_logging;
use vanguard_posture::{Analyzer, AnalysisFailure, AnalyzerConfig, Target};

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    initialize_logging(cli.log_level.into()).wrap_err("Failed to initialize logging")?;
    debug!(?cli, "Parsed command line.");

    let target = match Target::parse(&cli.target, cli.port) {
        Ok(target) => target,
        Err(e) => {
            let requested = Target { host: cli.target.clone(), port: cli.port };
            print_report(&AnalysisFailure::new(e, &requested, Local::now()), cli.compact)?;
            process::exit(1);
        }
    };

    let analyzer = Analyzer::live(AnalyzerConfig::from(&cli)).wrap_err("Failed to build HTTP clients")?;

    match analyzer.analyze(&target).await {
        Ok(result) => {
            info!(%target, score = result.security_score, "Printing report.");
            print_report(&result, cli.compact)
        }
        Err(failure) => {
            print_report(&failure, cli.compact)?;
            process::exit(1);
        }
    }
}

/// Writes the report to stdout as JSON.
fn print_report<T: Serialize>(report: &T, compact: bool) -> Result<()> {
    let json = if compact {
        serde_json::to_string(report)
    } else {
        serde_json::to_string_pretty(report)
    }
    .wrap_err("Failed to serialize report")?;
    println!("{}", json);
    Ok(())
}
