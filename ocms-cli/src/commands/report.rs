//! Job execution report command

use anyhow::Result;
use chrono::Local;
use colored::*;

use crate::config::Config;

pub async fn show_report(config: &Config) -> Result<()> {
    let report = config.client().job_execution_report().await?;

    println!(
        "{}",
        format!("Job Execution Report {}", report.report_date).bold()
    );
    println!(
        "  Window:      {} .. {}",
        report.window_start.with_timezone(&Local).format("%Y-%m-%d %H:%M"),
        report.window_end.with_timezone(&Local).format("%Y-%m-%d %H:%M")
    );
    println!(
        "  Environment: {} ({})",
        report.environment, report.server_name
    );
    println!(
        "  Total: {}  Completed: {}  Failed: {}  Running: {}",
        report.total_jobs,
        report.completed_jobs.to_string().green(),
        report.failed_jobs.to_string().red(),
        report.running_jobs.to_string().cyan()
    );
    println!();

    if report.job_executions.is_empty() {
        println!("{}", "No job executions in this window.".yellow());
        return Ok(());
    }

    for run in &report.job_executions {
        let status = match run.status.as_str() {
            "Success" => run.status.green(),
            "Failed" => run.status.red(),
            "Running" => run.status.cyan(),
            _ => run.status.dimmed(),
        };
        println!(
            "  {:<32} {:<8} {} {}",
            run.job_name,
            status,
            run.start_time.dimmed(),
            run.duration
        );
        if !run.message.is_empty() {
            println!("      {}", run.message.dimmed());
        }
    }

    Ok(())
}
