use std::sync::Arc;

use axum::{routing::get, Router};

use super::handlers::{get_my_usage, get_usage_summary};
use super::services::PgUsageStore;

pub fn routes(store: Arc<PgUsageStore>) -> Router {
    Router::new()
        .route("/api/ai/usage/me", get(get_my_usage))
        .with_state(store)
}

/// Usage across all users (super admin only)
pub fn admin_routes(store: Arc<PgUsageStore>) -> Router {
    Router::new()
        .route("/api/admin/ai/usage", get(get_usage_summary))
        .with_state(store)
}
