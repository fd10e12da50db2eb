use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};

use crate::core::error::{AppError, Result};
use crate::features::auth::guards::RequireSuperAdmin;
use crate::features::auth::model::AuthenticatedUser;
use crate::features::rate_limits::dtos::{RateLimitPolicyDto, RateLimitStatusDto};
use crate::features::rate_limits::models::EndpointCategory;
use crate::features::rate_limits::services::RateLimitService;
use crate::shared::types::ApiResponse;

/// Get the caller's remaining quota for every AI endpoint category
#[utoipa::path(
    get,
    path = "/api/ai/rate-limits",
    responses(
        (status = 200, description = "Quota per category", body = ApiResponse<Vec<RateLimitStatusDto>>),
        (status = 401, description = "Unauthorized"),
        (status = 503, description = "Rate limit store unavailable")
    ),
    tag = "ai",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn get_my_rate_limits(
    user: AuthenticatedUser,
    State(service): State<Arc<RateLimitService>>,
) -> Result<Json<ApiResponse<Vec<RateLimitStatusDto>>>> {
    let statuses = service.status_all(&user.user_id).await?;
    let response = statuses.into_iter().map(RateLimitStatusDto::from).collect();

    Ok(Json(ApiResponse::success(Some(response), None)))
}

/// Get the caller's remaining quota for one category
#[utoipa::path(
    get,
    path = "/api/ai/rate-limits/{category}",
    params(
        ("category" = String, Path, description = "Endpoint category, e.g. generate-post")
    ),
    responses(
        (status = 200, description = "Quota for the category", body = ApiResponse<RateLimitStatusDto>),
        (status = 400, description = "Unknown category"),
        (status = 401, description = "Unauthorized"),
        (status = 503, description = "Rate limit store unavailable")
    ),
    tag = "ai",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn get_my_rate_limit(
    user: AuthenticatedUser,
    State(service): State<Arc<RateLimitService>>,
    Path(category): Path<String>,
) -> Result<Json<ApiResponse<RateLimitStatusDto>>> {
    let category: EndpointCategory = category
        .parse()
        .map_err(|_| AppError::BadRequest(format!("Unknown endpoint category '{}'", category)))?;

    if service.policies().get(category).is_none() {
        return Err(AppError::BadRequest(format!(
            "Category '{}' is not rate limited",
            category
        )));
    }

    let status = service.status(&user.user_id, category).await?;

    Ok(Json(ApiResponse::success(Some(status.into()), None)))
}

/// List the configured rate limit policies
#[utoipa::path(
    get,
    path = "/api/admin/ai/rate-limit-policies",
    responses(
        (status = 200, description = "Configured policies", body = ApiResponse<Vec<RateLimitPolicyDto>>),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - Super admin access required")
    ),
    tag = "admin",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn list_rate_limit_policies(
    RequireSuperAdmin(_user): RequireSuperAdmin,
    State(service): State<Arc<RateLimitService>>,
) -> Result<Json<ApiResponse<Vec<RateLimitPolicyDto>>>> {
    let policies = service
        .policies()
        .iter()
        .map(RateLimitPolicyDto::from)
        .collect();

    Ok(Json(ApiResponse::success(Some(policies), None)))
}
