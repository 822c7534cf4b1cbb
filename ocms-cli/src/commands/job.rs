//! Job command handlers
//!
//! Listing, status, manual trigger and reset of registered jobs.

use anyhow::{Result, bail};
use chrono::{DateTime, Local, Utc};
use clap::Subcommand;
use colored::*;
use ocms_client::CronClient;
use ocms_core::domain::job::{JobResult, JobStatus, JobStatusInfo};
use ocms_core::domain::step::{StepResult, StepStatus};
use ocms_core::dto::job::JobOverview;

use crate::config::Config;

/// Job subcommands
#[derive(Subcommand)]
pub enum JobCommands {
    /// List all registered jobs
    List,
    /// Show the status of one job
    Status {
        /// Job name
        name: String,
    },
    /// Run a job now and wait for it to finish
    Trigger {
        /// Job name
        name: String,
    },
    /// Clear a job's last run status
    Reset {
        /// Job name
        name: String,
    },
}

pub async fn handle_job_command(command: JobCommands, config: &Config) -> Result<()> {
    let client = config.client();

    match command {
        JobCommands::List => list_jobs(&client).await,
        JobCommands::Status { name } => show_status(&client, &name).await,
        JobCommands::Trigger { name } => trigger_job(&client, &name).await,
        JobCommands::Reset { name } => reset_job(&client, &name).await,
    }
}

async fn list_jobs(client: &CronClient) -> Result<()> {
    let jobs = client.list_jobs().await?;

    if jobs.is_empty() {
        println!("{}", "No jobs registered.".yellow());
        return Ok(());
    }

    println!("{}", format!("Found {} job(s):", jobs.len()).bold());
    println!();
    for job in &jobs {
        print_job_summary(job);
    }

    Ok(())
}

async fn show_status(client: &CronClient, name: &str) -> Result<()> {
    let job = client.get_job(name).await?;

    println!("{}", "Job Details:".bold());
    println!("  Name:      {}", job.status.job_name.cyan());
    println!(
        "  Schedule:  {}",
        job.schedule.as_deref().unwrap_or("manual only")
    );
    println!("  Enabled:   {}", yes_no(job.enabled));
    print_status_info(&job.status);

    Ok(())
}

async fn trigger_job(client: &CronClient, name: &str) -> Result<()> {
    println!("{}", format!("Running job {}...", name).dimmed());

    let outcome = client.trigger_job(name).await?;

    print_result(&outcome.result);
    println!();
    print_status_info(&outcome.status);

    if !outcome.result.success {
        bail!("Job {} failed", outcome.job_name);
    }

    Ok(())
}

async fn reset_job(client: &CronClient, name: &str) -> Result<()> {
    client.reset_job(name).await?;
    println!("{} Job {} reset", "✓".green(), name.cyan());

    Ok(())
}

// =============================================================================
// Output
// =============================================================================

fn print_job_summary(job: &JobOverview) {
    let schedule = job.schedule.as_deref().unwrap_or("manual");

    println!(
        "  {} {} {}",
        "▸".cyan(),
        job.status.job_name.bold(),
        if job.enabled {
            "".normal()
        } else {
            "(disabled)".yellow()
        }
    );
    println!("    Schedule: {}", schedule.dimmed());
    println!("    Status:   {}", colorize_status(job.status.status));
    if let Some(start) = job.status.start_time {
        println!("    Last run: {}", format_time(start).dimmed());
    }
    println!();
}

fn print_status_info(info: &JobStatusInfo) {
    println!("  Status:    {}", colorize_status(info.status));

    if let Some(start) = info.start_time {
        println!("  Started:   {}", format_time(start));
    }
    if let Some(end) = info.end_time {
        println!("  Finished:  {}", format_time(end));
        println!("  Duration:  {}s", info.duration_seconds);
    }
    if let Some(message) = &info.last_message {
        println!("  Message:   {}", message);
    }
    if let Some(error) = &info.last_error {
        println!("  Error:     {}", error.red());
    }
}

fn print_result(result: &JobResult) {
    println!(
        "{} {}",
        if result.success {
            "✓".green()
        } else {
            "✗".red()
        },
        result.message
    );

    let Some(data) = &result.data else {
        return;
    };

    // Pipeline jobs report their steps; anything else is printed as JSON
    match data
        .get("steps")
        .and_then(|steps| serde_json::from_value::<Vec<StepResult>>(steps.clone()).ok())
    {
        Some(steps) => {
            println!("\n{}", "Steps:".bold());
            for step in &steps {
                print_step(step);
            }
        }
        None => {
            println!("\n{}", "Data:".bold());
            match serde_json::to_string_pretty(data) {
                Ok(pretty) => println!("{}", pretty),
                Err(_) => println!("{:?}", data),
            }
        }
    }
}

fn print_step(step: &StepResult) {
    let marker = match step.status {
        StepStatus::Success => "✓".green(),
        StepStatus::Error => "✗".red(),
        StepStatus::Skipped => "-".dimmed(),
    };
    println!("  {} {:<24} {}", marker, step.step_name, step.message);
}

fn colorize_status(status: JobStatus) -> ColoredString {
    let status_str = status.to_string();
    match status {
        JobStatus::Unset => status_str.dimmed(),
        JobStatus::Running => status_str.cyan(),
        JobStatus::Success => status_str.green(),
        JobStatus::Failed => status_str.red(),
    }
}

fn format_time(time: DateTime<Utc>) -> String {
    time.with_timezone(&Local)
        .format("%Y-%m-%d %H:%M:%S")
        .to_string()
}

fn yes_no(value: bool) -> ColoredString {
    if value { "yes".green() } else { "no".yellow() }
}
