use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use super::{CounterStore, CounterStoreError};

/// Prune expired entries once the map grows past this size
const PRUNE_THRESHOLD: usize = 10_000;

struct Counter {
    count: u64,
    expires_at: Instant,
}

/// In-process counters for local development and tests.
///
/// State is not shared between replicas, so quotas multiply with the number
/// of instances. Use Postgres or Redis for any horizontally scaled deployment.
#[derive(Default)]
pub struct MemoryCounterStore {
    counters: Mutex<HashMap<String, Counter>>,
}

impl MemoryCounterStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(
        &self,
    ) -> Result<std::sync::MutexGuard<'_, HashMap<String, Counter>>, CounterStoreError> {
        self.counters
            .lock()
            .map_err(|_| CounterStoreError::Unavailable("memory counter lock poisoned".to_string()))
    }
}

#[async_trait]
impl CounterStore for MemoryCounterStore {
    async fn increment(&self, key: &str, ttl: Duration) -> Result<u64, CounterStoreError> {
        let now = Instant::now();
        let mut counters = self.lock()?;

        if counters.len() > PRUNE_THRESHOLD {
            counters.retain(|_, counter| counter.expires_at > now);
        }

        let counter = counters.entry(key.to_string()).or_insert(Counter {
            count: 0,
            expires_at: now + ttl,
        });
        if counter.expires_at <= now {
            counter.count = 0;
            counter.expires_at = now + ttl;
        }
        counter.count += 1;

        Ok(counter.count)
    }

    async fn decrement(&self, key: &str, _ttl: Duration) -> Result<(), CounterStoreError> {
        let mut counters = self.lock()?;
        if let Some(counter) = counters.get_mut(key) {
            counter.count = counter.count.saturating_sub(1);
        }
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<u64, CounterStoreError> {
        let now = Instant::now();
        let counters = self.lock()?;
        Ok(counters
            .get(key)
            .filter(|counter| counter.expires_at > now)
            .map(|counter| counter.count)
            .unwrap_or(0))
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tokio_test::assert_ok;

    #[tokio::test]
    async fn test_increment_returns_running_count() {
        let store = MemoryCounterStore::new();
        let ttl = Duration::from_secs(60);

        assert_eq!(store.increment("k", ttl).await.unwrap(), 1);
        assert_eq!(store.increment("k", ttl).await.unwrap(), 2);
        assert_eq!(store.increment("other", ttl).await.unwrap(), 1);
        assert_eq!(store.get("k").await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_decrement_never_goes_negative() {
        let store = MemoryCounterStore::new();
        let ttl = Duration::from_secs(60);

        assert_ok!(store.increment("k", ttl).await);
        assert_ok!(store.decrement("k", ttl).await);
        assert_ok!(store.decrement("k", ttl).await);
        assert_eq!(store.get("k").await.unwrap(), 0);

        // Unknown keys are left alone
        assert_ok!(store.decrement("missing", ttl).await);
        assert_eq!(store.get("missing").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_expired_counter_restarts() {
        let store = MemoryCounterStore::new();

        store.increment("k", Duration::from_millis(20)).await.unwrap();
        tokio::time::sleep(Duration::from_millis(40)).await;

        assert_eq!(store.get("k").await.unwrap(), 0);
        assert_eq!(
            store.increment("k", Duration::from_secs(60)).await.unwrap(),
            1
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_increments_observe_distinct_counts() {
        let store = Arc::new(MemoryCounterStore::new());

        let tasks: Vec<_> = (0..64)
            .map(|_| {
                let store = Arc::clone(&store);
                tokio::spawn(async move {
                    store.increment("shared", Duration::from_secs(60)).await.unwrap()
                })
            })
            .collect();

        let mut counts = Vec::new();
        for task in tasks {
            counts.push(task.await.unwrap());
        }
        counts.sort_unstable();

        assert_eq!(counts, (1..=64).collect::<Vec<u64>>());
    }
}
