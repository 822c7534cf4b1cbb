//! In-memory job lock
//!
//! Only excludes runs within one process.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use super::{JobLock, LockConfig, LockError, LockLease, to_chrono};

#[derive(Debug, Clone)]
struct LockEntry {
    lock_until: DateTime<Utc>,
    locked_by: String,
}

/// Lock table kept in process memory
pub struct InMemoryJobLock {
    instance_id: String,
    entries: Mutex<HashMap<String, LockEntry>>,
}

impl InMemoryJobLock {
    pub fn new(instance_id: impl Into<String>) -> Self {
        Self {
            instance_id: instance_id.into(),
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Current expiry of a named lock, if it was ever taken
    pub fn lock_until(&self, name: &str) -> Option<DateTime<Utc>> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .map(|e| e.lock_until)
    }
}

#[async_trait]
impl JobLock for InMemoryJobLock {
    async fn try_acquire(&self, config: &LockConfig) -> Result<Option<LockLease>, LockError> {
        let now = Utc::now();
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);

        if let Some(entry) = entries.get(&config.name) {
            if entry.lock_until > now {
                return Ok(None);
            }
        }

        entries.insert(
            config.name.clone(),
            LockEntry {
                lock_until: now + to_chrono(config.lock_at_most_for),
                locked_by: self.instance_id.clone(),
            },
        );

        Ok(Some(LockLease {
            name: config.name.clone(),
            locked_at: now,
            lock_at_least_for: config.lock_at_least_for,
        }))
    }

    async fn release(&self, lease: &LockLease) -> Result<(), LockError> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);

        if let Some(entry) = entries.get_mut(&lease.name) {
            if entry.locked_by == self.instance_id {
                entry.lock_until = lease.release_until(Utc::now());
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn config(at_least: u64) -> LockConfig {
        LockConfig {
            name: "nightly".to_string(),
            lock_at_least_for: Duration::from_secs(at_least),
            lock_at_most_for: Duration::from_secs(1800),
        }
    }

    #[tokio::test]
    async fn test_second_acquire_blocked_while_held() {
        let lock = InMemoryJobLock::new("instance-a");

        let lease = lock.try_acquire(&config(0)).await.unwrap();
        assert!(lease.is_some());
        assert!(lock.try_acquire(&config(0)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_release_without_minimum_frees_lock() {
        let lock = InMemoryJobLock::new("instance-a");

        let lease = lock.try_acquire(&config(0)).await.unwrap().unwrap();
        lock.release(&lease).await.unwrap();

        assert!(lock.try_acquire(&config(0)).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_release_keeps_minimum_hold() {
        let lock = InMemoryJobLock::new("instance-a");

        let lease = lock.try_acquire(&config(300)).await.unwrap().unwrap();
        lock.release(&lease).await.unwrap();

        assert!(lock.try_acquire(&config(300)).await.unwrap().is_none());
        let until = lock.lock_until("nightly").unwrap();
        assert_eq!(until, lease.locked_at + chrono::Duration::seconds(300));
    }

    #[tokio::test]
    async fn test_locks_are_independent_per_name() {
        let lock = InMemoryJobLock::new("instance-a");

        assert!(lock.try_acquire(&config(0)).await.unwrap().is_some());
        let other = LockConfig::new("other_job");
        assert!(lock.try_acquire(&other).await.unwrap().is_some());
    }
}
