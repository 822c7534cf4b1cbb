//! Commands module
//!
//! Defines all CLI commands and their handlers.

mod batch;
mod job;
mod report;

pub use batch::BatchCommands;
pub use job::JobCommands;

use anyhow::Result;
use clap::Subcommand;
use colored::Colorize;

use crate::config::Config;

/// Top-level CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Job status and control
    Job {
        #[command(subcommand)]
        command: JobCommands,
    },
    /// Recorded batch job runs
    Batch {
        #[command(subcommand)]
        command: BatchCommands,
    },
    /// Show the job execution report for the current reporting day
    Report,
    /// Check that the service is up
    Health,
}

/// Routes the command to the appropriate handler module
pub async fn handle_command(command: Commands, config: &Config) -> Result<()> {
    match command {
        Commands::Job { command } => job::handle_job_command(command, config).await,
        Commands::Batch { command } => batch::handle_batch_command(command, config).await,
        Commands::Report => report::show_report(config).await,
        Commands::Health => {
            config.client().health().await?;
            println!("{} {}", "✓".green(), config.service_url);
            Ok(())
        }
    }
}
