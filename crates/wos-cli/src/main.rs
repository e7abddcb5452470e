//! Widget OS gateway CLI - Entry Point

use anyhow::Result;
use clap::Parser;
use tracing::info;
use wos_cli::{AppConfig, Application, Command};

/// Command-line client for the Widget OS API gateway
#[derive(Parser, Debug)]
#[command(name = "wos", version, about, long_about = None)]
struct Args {
    /// Configuration file path (can also be set via WOS_CONFIG env var)
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Logs go to stderr; stdout carries the response payload.
    wos_telemetry::init_logging()?;

    info!("Starting wos v{}", env!("CARGO_PKG_VERSION"));

    let config = AppConfig::load(args.config)?;
    let app = Application::new(config)?;

    let output = app.run(args.command).await?;
    println!("{output}");

    Ok(())
}
