use sqlx::{PgPool, postgres::PgPoolOptions};
use std::time::Duration;

pub async fn create_pool(database_url: &str) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .acquire_timeout(Duration::from_secs(5))
        .connect(database_url)
        .await
}

pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::Error> {
    // Batch job audit records
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS ocms_batch_job (
            id BIGSERIAL PRIMARY KEY,
            name VARCHAR(255) NOT NULL,
            run_status VARCHAR(1),
            start_run TIMESTAMPTZ NOT NULL,
            end_run TIMESTAMPTZ,
            log_text TEXT
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_ocms_batch_job_start_run ON ocms_batch_job(start_run)",
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_ocms_batch_job_name ON ocms_batch_job(name, start_run DESC)",
    )
    .execute(pool)
    .await?;

    // Distributed job locks
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS shedlock (
            name VARCHAR(64) PRIMARY KEY,
            lock_until TIMESTAMPTZ NOT NULL,
            locked_at TIMESTAMPTZ NOT NULL,
            locked_by VARCHAR(255) NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    tracing::info!("Database migrations completed successfully");
    Ok(())
}
