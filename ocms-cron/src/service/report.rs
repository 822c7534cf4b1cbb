//! Job Execution Report Service
//!
//! Summarises the batch job runs of the last reporting day. A reporting day
//! ends at the cut-off hour (17:00 by default) in local time; once that hour
//! has passed, the window ends now instead. It always spans 24 hours.

use chrono::{DateTime, Duration, Local, NaiveDateTime, TimeZone, Utc};
use ocms_core::domain::batch_job::BatchJobRecord;
use ocms_core::domain::report::{JobExecutionReport, ReportedRun};
use std::sync::Arc;

use crate::recorder::{BatchJobRecorder, RecorderError};

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Static inputs of the report
#[derive(Debug, Clone)]
pub struct ReportSettings {
    pub cutoff_hour: u32,
    pub environment: String,
    pub server_name: String,
}

impl Default for ReportSettings {
    fn default() -> Self {
        Self {
            cutoff_hour: 17,
            environment: "local".to_string(),
            server_name: "localhost".to_string(),
        }
    }
}

pub struct JobExecutionReportService {
    recorder: Arc<dyn BatchJobRecorder>,
    settings: ReportSettings,
}

impl JobExecutionReportService {
    pub fn new(recorder: Arc<dyn BatchJobRecorder>, settings: ReportSettings) -> Self {
        Self { recorder, settings }
    }

    /// Builds the report for the current reporting day
    pub async fn generate_daily_report(
        &self,
        excluded_jobs: &[&str],
    ) -> Result<JobExecutionReport, RecorderError> {
        self.generate_at(Local::now().naive_local(), excluded_jobs)
            .await
    }

    /// Builds the report as if the local time were `now`
    pub async fn generate_at(
        &self,
        now: NaiveDateTime,
        excluded_jobs: &[&str],
    ) -> Result<JobExecutionReport, RecorderError> {
        let (start, end) = report_window(now, self.settings.cutoff_hour);
        let window_start = local_to_utc(start);
        let window_end = local_to_utc(end);
        let generated_at = local_to_utc(now);

        tracing::info!("Fetching job executions from {} to {}", start, end);

        let runs: Vec<BatchJobRecord> = self
            .recorder
            .list_runs(window_start, window_end)
            .await?
            .into_iter()
            .filter(|r| !excluded_jobs.contains(&r.name.as_str()))
            .collect();

        tracing::info!("Found {} job executions", runs.len());

        let completed_jobs = runs
            .iter()
            .filter(|r| r.run_status_code.as_deref() == Some("S"))
            .count();
        let failed_jobs = runs
            .iter()
            .filter(|r| r.run_status_code.as_deref() == Some("F"))
            .count();
        let running_jobs = runs.iter().filter(|r| r.is_running()).count();

        Ok(JobExecutionReport {
            report_date: now.format("%Y-%m-%d").to_string(),
            window_start,
            window_end,
            total_jobs: runs.len(),
            completed_jobs,
            failed_jobs,
            running_jobs,
            job_executions: runs.iter().map(|r| format_run(r, generated_at)).collect(),
            generated_at,
            environment: self.settings.environment.clone(),
            server_name: self.settings.server_name.clone(),
        })
    }
}

/// Reporting window ending at today's cut-off, or at `now` once it has passed
pub fn report_window(now: NaiveDateTime, cutoff_hour: u32) -> (NaiveDateTime, NaiveDateTime) {
    let cutoff = now.date().and_hms_opt(cutoff_hour, 0, 0).unwrap_or(now);
    let end = if now > cutoff { now } else { cutoff };
    (end - Duration::days(1), end)
}

/// Display row for one recorded run
pub fn format_run(record: &BatchJobRecord, now: DateTime<Utc>) -> ReportedRun {
    let status = match (record.run_status, record.run_status_code.as_deref()) {
        (Some(status), _) => status.to_string(),
        (None, Some(code)) => code.to_string(),
        (None, None) => "UNKNOWN".to_string(),
    };

    ReportedRun {
        job_name: record.name.clone(),
        status,
        message: record.log_text.clone(),
        start_time: format_local(Some(record.start_run)),
        end_time: format_local(record.end_run),
        duration: format_duration(Some(record.start_run), record.end_run, now),
    }
}

/// `"<m> min <s> sec"`, prefixed with `Running:` while unfinished
pub fn format_duration(
    start: Option<DateTime<Utc>>,
    end: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> String {
    match (start, end) {
        (Some(start), Some(end)) => minutes_and_seconds(end - start),
        (Some(start), None) => format!("Running: {}", minutes_and_seconds(now - start)),
        _ => "N/A".to_string(),
    }
}

fn minutes_and_seconds(duration: Duration) -> String {
    let seconds = duration.num_seconds();
    format!("{} min {} sec", seconds / 60, seconds % 60)
}

fn format_local(time: Option<DateTime<Utc>>) -> String {
    time.map(|t| t.with_timezone(&Local).format(TIME_FORMAT).to_string())
        .unwrap_or_else(|| "N/A".to_string())
}

fn local_to_utc(time: NaiveDateTime) -> DateTime<Utc> {
    Local
        .from_local_datetime(&time)
        .earliest()
        .map(|t| t.with_timezone(&Utc))
        .unwrap_or_else(|| Utc.from_utc_datetime(&time))
}
