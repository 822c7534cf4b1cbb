use anyhow::Context;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ocms_cron::api::{self, AppState};
use ocms_cron::config::Config;
use ocms_cron::db;
use ocms_cron::job::TrackedJob;
use ocms_cron::jobs::{JobExecutionReportJob, REPORT_JOB_NAME};
use ocms_cron::lock::{InMemoryJobLock, JobLock, PgJobLock};
use ocms_cron::recorder::{BatchJobRecorder, InMemoryBatchJobRecorder, PgBatchJobRecorder};
use ocms_cron::scheduler::{JobRegistry, JobScheduler, ScheduleConfig};
use ocms_cron::service::JobExecutionReportService;

/// Daily at the report cut-off
const DEFAULT_REPORT_SCHEDULE: &str = "0 0 17 * * *";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ocms_cron=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting OCMS cron service...");

    let config = Config::from_env().context("Failed to load configuration")?;
    config.validate().context("Invalid configuration")?;

    tracing::info!("Instance id: {}", config.instance_id);

    let (recorder, lock): (Arc<dyn BatchJobRecorder>, Arc<dyn JobLock>) =
        match &config.database_url {
            Some(database_url) => {
                tracing::info!("Connecting to database...");

                let pool = db::create_pool(database_url)
                    .await
                    .context("Failed to create database pool")?;

                db::run_migrations(&pool)
                    .await
                    .context("Failed to run database migrations")?;

                let recorder: Arc<dyn BatchJobRecorder> =
                    Arc::new(PgBatchJobRecorder::new(pool.clone()));
                let lock: Arc<dyn JobLock> =
                    Arc::new(PgJobLock::new(pool, config.instance_id.clone()));
                (recorder, lock)
            }
            None => {
                tracing::warn!("DATABASE_URL not set, batch job records and locks are kept in memory");
                let recorder: Arc<dyn BatchJobRecorder> = Arc::new(InMemoryBatchJobRecorder::new());
                let lock: Arc<dyn JobLock> =
                    Arc::new(InMemoryJobLock::new(config.instance_id.clone()));
                (recorder, lock)
            }
        };

    let reports = Arc::new(JobExecutionReportService::new(
        Arc::clone(&recorder),
        config.report.clone(),
    ));

    let registry = Arc::new(build_registry(&recorder, &reports)?);

    if config.scheduler_enabled {
        JobScheduler::new(Arc::clone(&registry), lock).start();
    } else {
        tracing::info!("Scheduler disabled, jobs only run on manual trigger");
    }

    // Build router with all API endpoints
    let app = api::create_router(AppState {
        registry,
        recorder,
        reports,
    });

    tracing::info!("Listening on {}", config.bind_addr);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .context("Failed to bind to address")?;

    axum::serve(listener, app)
        .await
        .context("Failed to start server")?;

    Ok(())
}

/// Registers every job this service runs
fn build_registry(
    recorder: &Arc<dyn BatchJobRecorder>,
    reports: &Arc<JobExecutionReportService>,
) -> anyhow::Result<JobRegistry> {
    let mut registry = JobRegistry::new();

    let report_job = TrackedJob::new(Arc::new(JobExecutionReportJob::new(Arc::clone(reports))))
        .with_recorder(Arc::clone(recorder));
    registry.register(
        report_job,
        ScheduleConfig::from_env(REPORT_JOB_NAME, Some(DEFAULT_REPORT_SCHEDULE))?,
    )?;

    Ok(registry)
}
