use async_trait::async_trait;
use sqlx::PgPool;
use std::time::Duration;

use super::{CounterStore, CounterStoreError};

/// Counters in the `rate_limit_counters` table.
///
/// `INSERT .. ON CONFLICT DO UPDATE .. RETURNING` takes a row lock, so
/// concurrent increments on one key serialize and each sees its own count.
pub struct PgCounterStore {
    pool: PgPool,
}

impl PgCounterStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Delete counters whose window has ended. Returns the number of rows removed.
    pub async fn purge_expired(&self) -> Result<u64, CounterStoreError> {
        let result = sqlx::query("DELETE FROM rate_limit_counters WHERE expires_at <= NOW()")
            .execute(&self.pool)
            .await
            .map_err(unavailable)?;

        Ok(result.rows_affected())
    }
}

fn unavailable(e: sqlx::Error) -> CounterStoreError {
    tracing::error!("Rate limit counter query failed: {:?}", e);
    CounterStoreError::Unavailable(e.to_string())
}

fn to_count(value: i64) -> Result<u64, CounterStoreError> {
    u64::try_from(value).map_err(|_| CounterStoreError::Corrupt(value.to_string()))
}

#[async_trait]
impl CounterStore for PgCounterStore {
    async fn increment(&self, key: &str, ttl: Duration) -> Result<u64, CounterStoreError> {
        // An expired row still holding the key is restarted in place
        let count: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO rate_limit_counters (key, count, expires_at)
            VALUES ($1, 1, NOW() + make_interval(secs => $2))
            ON CONFLICT (key) DO UPDATE
            SET count = CASE
                    WHEN rate_limit_counters.expires_at <= NOW() THEN 1
                    ELSE rate_limit_counters.count + 1
                END,
                expires_at = CASE
                    WHEN rate_limit_counters.expires_at <= NOW() THEN EXCLUDED.expires_at
                    ELSE rate_limit_counters.expires_at
                END
            RETURNING count
            "#,
        )
        .bind(key)
        .bind(ttl.as_secs_f64())
        .fetch_one(&self.pool)
        .await
        .map_err(unavailable)?;

        to_count(count)
    }

    async fn decrement(&self, key: &str, _ttl: Duration) -> Result<(), CounterStoreError> {
        sqlx::query(
            r#"
            UPDATE rate_limit_counters
            SET count = GREATEST(count - 1, 0)
            WHERE key = $1 AND expires_at > NOW()
            "#,
        )
        .bind(key)
        .execute(&self.pool)
        .await
        .map_err(unavailable)?;

        Ok(())
    }

    async fn get(&self, key: &str) -> Result<u64, CounterStoreError> {
        let count: Option<i64> = sqlx::query_scalar(
            r#"
            SELECT count
            FROM rate_limit_counters
            WHERE key = $1 AND expires_at > NOW()
            "#,
        )
        .bind(key)
        .fetch_optional(&self.pool)
        .await
        .map_err(unavailable)?;

        count.map(to_count).transpose().map(|c| c.unwrap_or(0))
    }

    fn backend_name(&self) -> &'static str {
        "postgres"
    }
}
