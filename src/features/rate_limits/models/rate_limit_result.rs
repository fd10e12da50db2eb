use chrono::{DateTime, Utc};

use super::EndpointCategory;
use crate::core::error::AppError;

/// Outcome of one quota check. Computed per call and never persisted here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimitResult {
    pub category: EndpointCategory,
    pub allowed: bool,
    pub limit: u32,
    /// Always within `[0, limit]`
    pub remaining: u32,
    pub window_start: DateTime<Utc>,
    pub reset_at: DateTime<Utc>,
}

impl RateLimitResult {
    /// Build a result from the post-increment counter value.
    ///
    /// `count` includes the current attempt, so the call is allowed iff the
    /// pre-increment count was below `limit`.
    pub fn from_count(
        category: EndpointCategory,
        limit: u32,
        count: u64,
        window_start: DateTime<Utc>,
        reset_at: DateTime<Utc>,
    ) -> Self {
        let allowed = count <= u64::from(limit);
        let remaining = if allowed {
            (u64::from(limit) - count) as u32
        } else {
            0
        };

        Self {
            category,
            allowed,
            limit,
            remaining,
            window_start,
            reset_at,
        }
    }

    /// Whole seconds until the window resets, at least 1
    pub fn retry_after_secs(&self, now: DateTime<Utc>) -> u64 {
        let millis = (self.reset_at - now).num_milliseconds().max(0) as u64;
        millis.div_ceil(1000).max(1)
    }

    pub fn to_error(&self, now: DateTime<Utc>) -> AppError {
        AppError::RateLimitExceeded {
            category: self.category.to_string(),
            limit: self.limit,
            reset_at: self.reset_at,
            retry_after_secs: self.retry_after_secs(now),
        }
    }
}
