//! Distributed job lock
//!
//! Ensures at most one instance across the fleet runs a given job name at a
//! time. A lock is held until `lock_until`; acquiring succeeds only once that
//! instant has passed. Releasing keeps the lock for at least
//! `lock_at_least_for` measured from when it was taken, so instances with
//! slightly skewed clocks cannot fire the same schedule twice.
//!
//! `lock_at_most_for` only bounds how long a crashed holder blocks others. It
//! does not stop a run that outlives it.

mod memory;
mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::time::Duration;

pub use memory::InMemoryJobLock;
pub use postgres::PgJobLock;

/// Lock error type
#[derive(Debug, thiserror::Error)]
pub enum LockError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Lease parameters for one named lock
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockConfig {
    pub name: String,
    pub lock_at_least_for: Duration,
    pub lock_at_most_for: Duration,
}

impl LockConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            lock_at_least_for: Duration::from_secs(5 * 60),
            lock_at_most_for: Duration::from_secs(30 * 60),
        }
    }
}

/// A lock currently held by this instance
#[derive(Debug, Clone)]
pub struct LockLease {
    pub name: String,
    pub locked_at: DateTime<Utc>,
    pub lock_at_least_for: Duration,
}

impl LockLease {
    /// Instant the lock should expire once released at `now`
    pub fn release_until(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        let earliest = self.locked_at + to_chrono(self.lock_at_least_for);
        earliest.max(now)
    }
}

/// Named lock shared between scheduler instances
#[async_trait]
pub trait JobLock: Send + Sync {
    /// Takes the lock, or returns `None` while another holder's lease is live
    async fn try_acquire(&self, config: &LockConfig) -> Result<Option<LockLease>, LockError>;

    /// Gives the lock back, honouring the minimum hold time
    async fn release(&self, lease: &LockLease) -> Result<(), LockError>;
}

pub(crate) fn to_chrono(duration: Duration) -> chrono::Duration {
    chrono::Duration::from_std(duration).unwrap_or_else(|_| chrono::Duration::days(365 * 100))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_release_honours_minimum_hold() {
        let locked_at = Utc::now();
        let lease = LockLease {
            name: "nightly".to_string(),
            locked_at,
            lock_at_least_for: Duration::from_secs(300),
        };

        let early = locked_at + chrono::Duration::seconds(10);
        assert_eq!(
            lease.release_until(early),
            locked_at + chrono::Duration::seconds(300)
        );

        let late = locked_at + chrono::Duration::seconds(900);
        assert_eq!(lease.release_until(late), late);
    }
}
