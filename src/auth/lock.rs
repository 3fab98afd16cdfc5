//! Serialization of token writes.
//!
//! Issuance and revocation take a [`WriteGuard`] before touching storage so
//! that two rotations of the same refresh-token lineage can never interleave.

use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::config::LockMode;

type PartitionMap = DashMap<String, Arc<Mutex<()>>>;

/// Held for the duration of one write operation.
#[must_use = "the write lock is released as soon as the guard is dropped"]
pub struct WriteGuard {
    guard: Option<OwnedMutexGuard<()>>,
    partition: Option<(Arc<PartitionMap>, String)>,
}

impl Drop for WriteGuard {
    fn drop(&mut self) {
        // release the mutex first so our clone no longer counts
        drop(self.guard.take());
        if let Some((locks, partition)) = self.partition.take() {
            // entry() clones under the same shard lock, so no waiter can appear in between
            locks.remove_if(&partition, |_, mutex| Arc::strong_count(mutex) == 1);
        }
    }
}

#[async_trait]
pub trait WriteSerializer: Send + Sync {
    /// Wait for exclusive access to `partition`.
    async fn acquire(&self, partition: &str) -> WriteGuard;
}

/// One mutex for every write in the process.
#[derive(Default)]
pub struct GlobalWriteLock {
    inner: Arc<Mutex<()>>,
}

#[async_trait]
impl WriteSerializer for GlobalWriteLock {
    async fn acquire(&self, _partition: &str) -> WriteGuard {
        WriteGuard {
            guard: Some(Arc::clone(&self.inner).lock_owned().await),
            partition: None,
        }
    }
}

/// One mutex per subject. Writes for different subjects proceed in parallel.
///
/// A subject's entry lives only while someone holds or waits for it.
#[derive(Default)]
pub struct PerSubjectWriteLock {
    locks: Arc<PartitionMap>,
}

impl PerSubjectWriteLock {
    /// Number of subjects currently held or awaited.
    #[must_use]
    pub fn active_partitions(&self) -> usize {
        self.locks.len()
    }
}

#[async_trait]
impl WriteSerializer for PerSubjectWriteLock {
    async fn acquire(&self, partition: &str) -> WriteGuard {
        // clone the mutex out so the shard guard is not held across the await
        let mutex = Arc::clone(&self.locks.entry(partition.to_string()).or_default());
        WriteGuard {
            guard: Some(mutex.lock_owned().await),
            partition: Some((Arc::clone(&self.locks), partition.to_string())),
        }
    }
}

#[must_use]
pub fn from_mode(mode: LockMode) -> Arc<dyn WriteSerializer> {
    match mode {
        LockMode::Global => Arc::new(GlobalWriteLock::default()),
        LockMode::PerSubject => Arc::new(PerSubjectWriteLock::default()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    async fn max_concurrency(lock: Arc<dyn WriteSerializer>, partitions: &[&str]) -> usize {
        let active = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));
        let mut handles = Vec::new();

        for partition in partitions {
            let lock = Arc::clone(&lock);
            let active = Arc::clone(&active);
            let peak = Arc::clone(&peak);
            let partition = (*partition).to_string();
            handles.push(tokio::spawn(async move {
                let _guard = lock.acquire(&partition).await;
                let now = active.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(20)).await;
                active.fetch_sub(1, Ordering::SeqCst);
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }
        peak.load(Ordering::SeqCst)
    }

    #[tokio::test]
    async fn test_global_lock_serializes_everything() {
        let peak = max_concurrency(from_mode(LockMode::Global), &["a", "b", "c", "d"]).await;
        assert_eq!(peak, 1);
    }

    #[tokio::test]
    async fn test_per_subject_lock_serializes_same_subject() {
        let peak = max_concurrency(from_mode(LockMode::PerSubject), &["a", "a", "a"]).await;
        assert_eq!(peak, 1);
    }

    #[tokio::test]
    async fn test_per_subject_lock_allows_other_subjects() {
        let lock = from_mode(LockMode::PerSubject);
        let _held = lock.acquire("a").await;

        let other = tokio::time::timeout(Duration::from_millis(200), lock.acquire("b")).await;
        assert!(other.is_ok());

        let same = tokio::time::timeout(Duration::from_millis(50), lock.acquire("a")).await;
        assert!(same.is_err());
    }

    #[tokio::test]
    async fn test_per_subject_entries_released_after_use() {
        let lock = PerSubjectWriteLock::default();
        for i in 0..1000 {
            let _guard = lock.acquire(&format!("user-{i}")).await;
        }
        assert_eq!(lock.active_partitions(), 0);
    }

    #[tokio::test]
    async fn test_per_subject_entry_kept_while_waiter_exists() {
        let lock = Arc::new(PerSubjectWriteLock::default());
        let held = lock.acquire("a").await;

        let waiter = {
            let lock = Arc::clone(&lock);
            tokio::spawn(async move {
                let _guard = lock.acquire("a").await;
            })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;

        drop(held);
        // the waiter still references the mutex, so the entry survives the first release
        waiter.await.unwrap();
        assert_eq!(lock.active_partitions(), 0);
    }
}
