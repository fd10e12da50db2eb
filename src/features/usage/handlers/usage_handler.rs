use std::sync::Arc;

use axum::{
    extract::{Query, State},
    Json,
};
use chrono::Utc;

use crate::core::error::{AppError, Result};
use crate::features::auth::guards::RequireSuperAdmin;
use crate::features::auth::model::AuthenticatedUser;
use crate::features::usage::dtos::UsageSummaryDto;
use crate::features::usage::services::PgUsageStore;
use crate::shared::types::{ApiResponse, DateRangeQuery};

/// Get the caller's AI usage grouped by category and outcome
#[utoipa::path(
    get,
    path = "/api/ai/usage/me",
    params(DateRangeQuery),
    responses(
        (status = 200, description = "Usage summary", body = ApiResponse<UsageSummaryDto>),
        (status = 400, description = "Invalid date range"),
        (status = 401, description = "Unauthorized")
    ),
    tag = "ai",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn get_my_usage(
    user: AuthenticatedUser,
    State(store): State<Arc<PgUsageStore>>,
    Query(range): Query<DateRangeQuery>,
) -> Result<Json<ApiResponse<UsageSummaryDto>>> {
    let (from, to) = range.resolve(Utc::now()).map_err(AppError::Validation)?;
    let rows = store.user_summary(&user.user_id, from, to).await?;

    Ok(Json(ApiResponse::success(
        Some(UsageSummaryDto::new(from, to, rows)),
        None,
    )))
}

/// Get AI usage across all users
#[utoipa::path(
    get,
    path = "/api/admin/ai/usage",
    params(DateRangeQuery),
    responses(
        (status = 200, description = "Usage summary", body = ApiResponse<UsageSummaryDto>),
        (status = 400, description = "Invalid date range"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - Super admin access required")
    ),
    tag = "admin",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn get_usage_summary(
    RequireSuperAdmin(_user): RequireSuperAdmin,
    State(store): State<Arc<PgUsageStore>>,
    Query(range): Query<DateRangeQuery>,
) -> Result<Json<ApiResponse<UsageSummaryDto>>> {
    let (from, to) = range.resolve(Utc::now()).map_err(AppError::Validation)?;
    let rows = store.summary(from, to).await?;

    Ok(Json(ApiResponse::success(
        Some(UsageSummaryDto::new(from, to, rows)),
        None,
    )))
}
