use std::sync::Arc;

use axum::{routing::get, Router};

use super::handlers::{get_my_rate_limit, get_my_rate_limits, list_rate_limit_policies};
use super::services::RateLimitService;

/// Quota status for the authenticated caller
pub fn routes(service: Arc<RateLimitService>) -> Router {
    Router::new()
        .route("/api/ai/rate-limits", get(get_my_rate_limits))
        .route("/api/ai/rate-limits/{category}", get(get_my_rate_limit))
        .with_state(service)
}

/// Policy table inspection (super admin only)
pub fn admin_routes(service: Arc<RateLimitService>) -> Router {
    Router::new()
        .route(
            "/api/admin/ai/rate-limit-policies",
            get(list_rate_limit_policies),
        )
        .with_state(service)
}
