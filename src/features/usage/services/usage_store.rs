use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::core::error::{AppError, Result};
use crate::features::usage::models::{UsageRecord, UsageSummaryRow};

/// Destination for usage records
#[async_trait]
pub trait UsageSink: Send + Sync {
    async fn write_batch(&self, records: &[UsageRecord]) -> Result<()>;
}

/// Usage records in the `ai_usage_logs` table
pub struct PgUsageStore {
    pool: PgPool,
}

impl PgUsageStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Counts per category and outcome across all users
    pub async fn summary(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<UsageSummaryRow>> {
        sqlx::query_as::<_, UsageSummaryRow>(
            r#"
            SELECT category, outcome, COUNT(*) AS count
            FROM ai_usage_logs
            WHERE occurred_at >= $1 AND occurred_at < $2
            GROUP BY category, outcome
            ORDER BY category, outcome
            "#,
        )
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to summarize AI usage: {:?}", e);
            AppError::Database(e)
        })
    }

    /// Counts per category and outcome for one user
    pub async fn user_summary(
        &self,
        user_id: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<UsageSummaryRow>> {
        sqlx::query_as::<_, UsageSummaryRow>(
            r#"
            SELECT category, outcome, COUNT(*) AS count
            FROM ai_usage_logs
            WHERE user_id = $1 AND occurred_at >= $2 AND occurred_at < $3
            GROUP BY category, outcome
            ORDER BY category, outcome
            "#,
        )
        .bind(user_id)
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to summarize AI usage for user: {:?}", e);
            AppError::Database(e)
        })
    }
}

#[async_trait]
impl UsageSink for PgUsageStore {
    async fn write_batch(&self, records: &[UsageRecord]) -> Result<()> {
        if records.is_empty() {
            return Ok(());
        }

        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(
            "INSERT INTO ai_usage_logs \
             (id, user_id, category, outcome, occurred_at, duration_ms, request_id) ",
        );
        builder.push_values(records, |mut row, record| {
            row.push_bind(record.id)
                .push_bind(record.identity.clone())
                .push_bind(record.category.as_str())
                .push_bind(record.outcome.as_str())
                .push_bind(record.occurred_at)
                .push_bind(record.duration_ms)
                .push_bind(record.request_id.clone());
        });
        builder.push(" ON CONFLICT (id) DO NOTHING");

        builder.build().execute(&self.pool).await?;

        Ok(())
    }
}
