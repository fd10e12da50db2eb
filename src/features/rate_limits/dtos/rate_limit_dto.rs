use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use crate::features::rate_limits::models::{EndpointCategory, RateLimitPolicy, RateLimitResult};

/// Caller's quota for one AI endpoint category
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RateLimitStatusDto {
    pub category: EndpointCategory,
    /// Maximum requests per window
    pub limit: u32,
    /// Requests left in the current window
    pub remaining: u32,
    /// Whether the next request would be allowed
    pub can_request: bool,
    pub window_start: DateTime<Utc>,
    /// When the current window ends and the quota refills
    pub resets_at: DateTime<Utc>,
}

impl From<RateLimitResult> for RateLimitStatusDto {
    fn from(result: RateLimitResult) -> Self {
        Self {
            category: result.category,
            limit: result.limit,
            remaining: result.remaining,
            can_request: result.allowed,
            window_start: result.window_start,
            resets_at: result.reset_at,
        }
    }
}

/// Configured quota for one category
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RateLimitPolicyDto {
    pub category: EndpointCategory,
    pub max_requests: u32,
    pub window_secs: u64,
}

impl From<&RateLimitPolicy> for RateLimitPolicyDto {
    fn from(policy: &RateLimitPolicy) -> Self {
        Self {
            category: policy.category,
            max_requests: policy.max_requests,
            window_secs: policy.window_secs(),
        }
    }
}
