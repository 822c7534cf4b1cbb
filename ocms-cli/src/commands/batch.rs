//! Batch job record commands

use anyhow::Result;
use chrono::{DateTime, Duration, Local, Utc};
use clap::Subcommand;
use colored::*;
use ocms_core::domain::batch_job::{BatchJobRecord, RunStatus};
use ocms_core::dto::job::BatchJobQuery;

use crate::config::Config;

#[derive(Subcommand)]
pub enum BatchCommands {
    /// List recorded runs
    List {
        /// Only runs of this job
        #[arg(long)]
        name: Option<String>,

        /// Window start (RFC 3339)
        #[arg(long, conflicts_with = "hours")]
        from: Option<DateTime<Utc>>,

        /// Window end (RFC 3339, default: now)
        #[arg(long)]
        to: Option<DateTime<Utc>>,

        /// Window length in hours, counted back from the window end
        #[arg(long)]
        hours: Option<i64>,
    },
}

pub async fn handle_batch_command(command: BatchCommands, config: &Config) -> Result<()> {
    match command {
        BatchCommands::List {
            name,
            from,
            to,
            hours,
        } => {
            let query = BatchJobQuery {
                from: from.or_else(|| {
                    hours.map(|h| to.unwrap_or_else(Utc::now) - Duration::hours(h))
                }),
                to,
                name,
            };
            list_runs(config, &query).await
        }
    }
}

async fn list_runs(config: &Config, query: &BatchJobQuery) -> Result<()> {
    let runs = config.client().list_batch_jobs(query).await?;

    if runs.is_empty() {
        println!("{}", "No batch job runs found.".yellow());
        return Ok(());
    }

    println!("{}", format!("Found {} run(s):", runs.len()).bold());
    println!();
    for run in &runs {
        print_run(run);
    }

    Ok(())
}

fn print_run(run: &BatchJobRecord) {
    let status = match run.run_status {
        Some(RunStatus::Success) => "S".green(),
        Some(RunStatus::Failed) => "F".red(),
        Some(RunStatus::Running) => "R".cyan(),
        None => run.run_status_code.as_deref().unwrap_or("?").dimmed(),
    };
    let end = run
        .end_run
        .map(format_time)
        .unwrap_or_else(|| "-".to_string());

    println!(
        "  [{}] {:<32} {} .. {}",
        status,
        run.name,
        format_time(run.start_run).dimmed(),
        end.dimmed()
    );
    if !run.log_text.is_empty() {
        println!("      {}", run.log_text);
    }
}

fn format_time(time: DateTime<Utc>) -> String {
    time.with_timezone(&Local)
        .format("%Y-%m-%d %H:%M:%S")
        .to_string()
}
