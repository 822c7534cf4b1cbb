//! PostgreSQL job lock
//!
//! One row per lock name in the `shedlock` table. Acquisition is a single
//! upsert that only overwrites an expired row.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;

use super::{JobLock, LockConfig, LockError, LockLease, to_chrono};

/// Lock shared by every instance connected to the same database
#[derive(Clone)]
pub struct PgJobLock {
    pool: PgPool,
    instance_id: String,
}

impl PgJobLock {
    pub fn new(pool: PgPool, instance_id: impl Into<String>) -> Self {
        Self {
            pool,
            instance_id: instance_id.into(),
        }
    }
}

#[async_trait]
impl JobLock for PgJobLock {
    async fn try_acquire(&self, config: &LockConfig) -> Result<Option<LockLease>, LockError> {
        let now = Utc::now();
        let lock_until = now + to_chrono(config.lock_at_most_for);

        let result = sqlx::query(
            r#"
            INSERT INTO shedlock (name, lock_until, locked_at, locked_by)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (name) DO UPDATE SET
                lock_until = EXCLUDED.lock_until,
                locked_at = EXCLUDED.locked_at,
                locked_by = EXCLUDED.locked_by
            WHERE shedlock.lock_until <= EXCLUDED.locked_at
            "#,
        )
        .bind(&config.name)
        .bind(lock_until)
        .bind(now)
        .bind(&self.instance_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }

        Ok(Some(LockLease {
            name: config.name.clone(),
            locked_at: now,
            lock_at_least_for: config.lock_at_least_for,
        }))
    }

    async fn release(&self, lease: &LockLease) -> Result<(), LockError> {
        sqlx::query(
            r#"
            UPDATE shedlock
            SET lock_until = $1
            WHERE name = $2 AND locked_by = $3
            "#,
        )
        .bind(lease.release_until(Utc::now()))
        .bind(&lease.name)
        .bind(&self.instance_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
