//! OCMS CLI
//!
//! Operator command-line interface for the OCMS cron service.

mod commands;
mod config;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, handle_command};
use config::Config;

#[derive(Parser)]
#[command(name = "ocms")]
#[command(about = "OCMS batch job operator CLI", long_about = None)]
struct Cli {
    /// Cron service URL
    #[arg(long, env = "OCMS_CRON_URL", default_value = "http://localhost:8085")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = Config { service_url: cli.url };

    handle_command(cli.command, &config).await
}
