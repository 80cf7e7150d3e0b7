mod api;
mod cli;
mod config;
mod error;
mod models;

use clap::Parser;
use cli::{format_result, App, Cli};
use colored::*;
use config::Config;
use error::{AppError, Result};
use models::{is_valid_bssid, Bssid};
use std::io::Write;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr; stdout carries only the lookup results.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if !is_valid_bssid(&cli.bssid) {
        error!("Rejected input {:?}", cli.bssid);
        println!("{} {}", "Error:".red(), "Invalid BSSID format".red());
        return Err(AppError::InvalidBssid(cli.bssid));
    }
    let bssid: Bssid = cli.bssid.parse()?;

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {:?}", e);
            println!("{} {}", "Error:".red(), e.to_string().red());
            return Err(e);
        },
    };

    let app = App::new(&config)?;
    info!("Querying providers for {}", bssid);

    let results = app.lookup(&bssid).await;

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    for result in &results {
        let line = format_result(result);
        if result.error().is_none() {
            writeln!(out, "{}", line.green())?;
        } else {
            writeln!(out, "{}", line.red())?;
        }
    }

    Ok(())
}
