use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::features::rate_limits::models::EndpointCategory;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum UsageOutcome {
    Success,
    Error,
}

impl UsageOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            UsageOutcome::Success => "success",
            UsageOutcome::Error => "error",
        }
    }
}

/// Audit entry for one gated invocation that reached its handler
#[derive(Debug, Clone, PartialEq)]
pub struct UsageRecord {
    pub id: Uuid,
    pub identity: String,
    pub category: EndpointCategory,
    pub outcome: UsageOutcome,
    pub occurred_at: DateTime<Utc>,
    pub duration_ms: i64,
    pub request_id: Option<String>,
}

impl UsageRecord {
    pub fn new(
        identity: String,
        category: EndpointCategory,
        outcome: UsageOutcome,
        duration: Duration,
        request_id: Option<String>,
    ) -> Self {
        Self {
            id: Uuid::now_v7(),
            identity,
            category,
            outcome,
            occurred_at: Utc::now(),
            duration_ms: i64::try_from(duration.as_millis()).unwrap_or(i64::MAX),
            request_id,
        }
    }
}

/// One aggregated row of `ai_usage_logs`
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UsageSummaryRow {
    pub category: String,
    pub outcome: String,
    pub count: i64,
}
