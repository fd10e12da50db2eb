use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use crate::features::usage::models::UsageSummaryRow;

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct UsageCountDto {
    pub category: String,
    pub outcome: String,
    pub count: i64,
}

impl From<UsageSummaryRow> for UsageCountDto {
    fn from(row: UsageSummaryRow) -> Self {
        Self {
            category: row.category,
            outcome: row.outcome,
            count: row.count,
        }
    }
}

/// AI usage counts over a reporting period
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct UsageSummaryDto {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
    pub total: i64,
    pub items: Vec<UsageCountDto>,
}

impl UsageSummaryDto {
    pub fn new(from: DateTime<Utc>, to: DateTime<Utc>, rows: Vec<UsageSummaryRow>) -> Self {
        let items: Vec<UsageCountDto> = rows.into_iter().map(UsageCountDto::from).collect();
        let total = items.iter().map(|item| item.count).sum();

        Self {
            from,
            to,
            total,
            items,
        }
    }
}
