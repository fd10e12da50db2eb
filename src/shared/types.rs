use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::shared::constants::DEFAULT_USAGE_LOOKBACK_DAYS;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub message: Option<String>,
    pub errors: Option<Vec<String>>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: Option<T>, message: Option<String>) -> Self {
        Self {
            success: true,
            data,
            message,
            errors: None,
        }
    }

    pub fn error(message: Option<String>, errors: Option<Vec<String>>) -> ApiResponse<()> {
        ApiResponse {
            success: false,
            data: None,
            message,
            errors,
        }
    }
}

// =============================================================================
// DATE RANGE
// =============================================================================

/// Optional `from`/`to` bounds for reporting endpoints.
/// Missing bounds default to the last `DEFAULT_USAGE_LOOKBACK_DAYS` days.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
pub struct DateRangeQuery {
    /// Inclusive lower bound (RFC 3339)
    pub from: Option<DateTime<Utc>>,
    /// Exclusive upper bound (RFC 3339)
    pub to: Option<DateTime<Utc>>,
}

impl DateRangeQuery {
    /// Resolve to concrete bounds, rejecting inverted ranges
    pub fn resolve(&self, now: DateTime<Utc>) -> Result<(DateTime<Utc>, DateTime<Utc>), String> {
        let to = self.to.unwrap_or(now);
        let from = self
            .from
            .unwrap_or_else(|| to - Duration::days(DEFAULT_USAGE_LOOKBACK_DAYS));

        if from >= to {
            return Err("'from' must be earlier than 'to'".to_string());
        }

        Ok((from, to))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_date_range_defaults_to_lookback_window() {
        let now = Utc::now();
        let (from, to) = DateRangeQuery::default().resolve(now).unwrap();

        assert_eq!(to, now);
        assert_eq!(to - from, Duration::days(DEFAULT_USAGE_LOOKBACK_DAYS));
    }

    #[test]
    fn test_date_range_rejects_inverted_bounds() {
        let now = Utc::now();
        let query = DateRangeQuery {
            from: Some(now),
            to: Some(now - Duration::hours(1)),
        };

        assert!(query.resolve(now).is_err());
    }
}
