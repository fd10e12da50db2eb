/// Default reporting window for usage summaries
pub const DEFAULT_USAGE_LOOKBACK_DAYS: i64 = 30;

// =============================================================================
// ROLE CONSTANTS
// =============================================================================

/// Super admin role - can inspect rate limit policies and tenant-wide AI usage
pub const ROLE_SUPER_ADMIN: &str = "super_admin";

// =============================================================================
// RESPONSE HEADERS
// =============================================================================

pub const HEADER_RATE_LIMIT_LIMIT: &str = "x-ratelimit-limit";
pub const HEADER_RATE_LIMIT_REMAINING: &str = "x-ratelimit-remaining";
pub const HEADER_RATE_LIMIT_RESET: &str = "x-ratelimit-reset";
