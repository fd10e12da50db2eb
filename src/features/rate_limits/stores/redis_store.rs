use async_trait::async_trait;
use redis::aio::ConnectionManager;
use std::time::Duration;
use tracing::{debug, warn};

use super::{CounterStore, CounterStoreError};

/// Counters in Redis (or a wire-compatible hosted limiter store).
///
/// `INCR` and `EXPIRE` run in one `MULTI` block so a counter never exists
/// without its expiry.
pub struct RedisCounterStore {
    connection_manager: ConnectionManager,
}

impl RedisCounterStore {
    pub async fn connect(url: &str) -> Result<Self, CounterStoreError> {
        let client = redis::Client::open(url).map_err(|e| {
            warn!("Failed to create Redis client for rate limiting: {}", e);
            CounterStoreError::Unavailable(format!("Failed to create Redis client: {}", e))
        })?;

        let connection_manager = ConnectionManager::new(client).await.map_err(|e| {
            warn!("Failed to connect to Redis for rate limiting: {}", e);
            CounterStoreError::Unavailable(format!("Failed to connect to Redis: {}", e))
        })?;

        let mut conn = connection_manager.clone();
        redis::cmd("PING")
            .query_async::<String>(&mut conn)
            .await
            .map_err(|e| CounterStoreError::Unavailable(format!("Failed to ping Redis: {}", e)))?;

        debug!("Connected to Redis for rate limiting");

        Ok(Self { connection_manager })
    }
}

/// Expiry in whole seconds, rounded up so the key outlives its window.
/// Redis rejects a zero TTL.
fn ttl_secs(ttl: Duration) -> i64 {
    i64::try_from(ttl.as_millis().div_ceil(1000))
        .unwrap_or(i64::MAX)
        .max(1)
}

fn unavailable(e: redis::RedisError) -> CounterStoreError {
    CounterStoreError::Unavailable(format!("Redis error: {}", e))
}

#[async_trait]
impl CounterStore for RedisCounterStore {
    async fn increment(&self, key: &str, ttl: Duration) -> Result<u64, CounterStoreError> {
        let mut conn = self.connection_manager.clone();

        let (count,): (i64,) = redis::pipe()
            .atomic()
            .incr(key, 1)
            .cmd("EXPIRE")
            .arg(key)
            .arg(ttl_secs(ttl))
            .arg("NX")
            .ignore()
            .query_async(&mut conn)
            .await
            .map_err(unavailable)?;

        u64::try_from(count).map_err(|_| CounterStoreError::Corrupt(count.to_string()))
    }

    async fn decrement(&self, key: &str, ttl: Duration) -> Result<(), CounterStoreError> {
        let mut conn = self.connection_manager.clone();

        // DECR on a key that expired in between would recreate it; the
        // EXPIRE NX keeps such a key from living forever
        let (count,): (i64,) = redis::pipe()
            .atomic()
            .decr(key, 1)
            .cmd("EXPIRE")
            .arg(key)
            .arg(ttl_secs(ttl))
            .arg("NX")
            .ignore()
            .query_async(&mut conn)
            .await
            .map_err(unavailable)?;

        if count < 0 {
            redis::cmd("DEL")
                .arg(key)
                .query_async::<()>(&mut conn)
                .await
                .map_err(unavailable)?;
        }

        Ok(())
    }

    async fn get(&self, key: &str) -> Result<u64, CounterStoreError> {
        let mut conn = self.connection_manager.clone();

        let value: Option<i64> = redis::cmd("GET")
            .arg(key)
            .query_async(&mut conn)
            .await
            .map_err(unavailable)?;

        Ok(value.map(|v| v.max(0) as u64).unwrap_or(0))
    }

    fn backend_name(&self) -> &'static str {
        "redis"
    }
}
