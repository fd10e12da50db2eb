use std::sync::Arc;

use axum::{extract::State, Json};
use validator::Validate;

use crate::core::error::{AppError, Result};
use crate::core::extractor::AppJson;
use crate::features::ai_content::dtos::{
    CompetitorAnalysisRequestDto, GeneratePostRequestDto, GeneratePostResponseDto,
    ReviewReplyRequestDto, ReviewReplyResponseDto,
};
use crate::features::ai_content::models::CompetitorAnalysis;
use crate::features::ai_content::services::ContentService;
use crate::shared::types::ApiResponse;

/// Draft a reply to a Google review
#[utoipa::path(
    post,
    path = "/api/ai/reviews/reply",
    request_body = ReviewReplyRequestDto,
    responses(
        (status = 200, description = "Reply drafted", body = ApiResponse<ReviewReplyResponseDto>),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Unauthorized"),
        (status = 429, description = "Rate limit exceeded"),
        (status = 502, description = "AI provider error"),
        (status = 503, description = "Rate limit store unavailable")
    ),
    tag = "ai",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn generate_review_reply(
    State(service): State<Arc<ContentService>>,
    AppJson(dto): AppJson<ReviewReplyRequestDto>,
) -> Result<Json<ApiResponse<ReviewReplyResponseDto>>> {
    dto.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let reply = service.generate_review_reply(&dto).await?;
    Ok(Json(ApiResponse::success(Some(reply), None)))
}

/// Draft a Google Business Profile post
#[utoipa::path(
    post,
    path = "/api/ai/posts/generate",
    request_body = GeneratePostRequestDto,
    responses(
        (status = 200, description = "Post drafted", body = ApiResponse<GeneratePostResponseDto>),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Unauthorized"),
        (status = 429, description = "Rate limit exceeded"),
        (status = 502, description = "AI provider error"),
        (status = 503, description = "Rate limit store unavailable")
    ),
    tag = "ai",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn generate_post(
    State(service): State<Arc<ContentService>>,
    AppJson(dto): AppJson<GeneratePostRequestDto>,
) -> Result<Json<ApiResponse<GeneratePostResponseDto>>> {
    dto.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let post = service.generate_post(&dto).await?;
    Ok(Json(ApiResponse::success(Some(post), None)))
}

/// Compare the business against a competitor
///
/// When the model output cannot be parsed the response still succeeds, with
/// `parsed = false` and empty lists.
#[utoipa::path(
    post,
    path = "/api/ai/competitors/analyze",
    request_body = CompetitorAnalysisRequestDto,
    responses(
        (status = 200, description = "Analysis produced", body = ApiResponse<CompetitorAnalysis>),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Unauthorized"),
        (status = 429, description = "Rate limit exceeded"),
        (status = 502, description = "AI provider error"),
        (status = 503, description = "Rate limit store unavailable")
    ),
    tag = "ai",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn analyze_competitor(
    State(service): State<Arc<ContentService>>,
    AppJson(dto): AppJson<CompetitorAnalysisRequestDto>,
) -> Result<Json<ApiResponse<CompetitorAnalysis>>> {
    dto.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let analysis = service.analyze_competitor(&dto).await?;
    Ok(Json(ApiResponse::success(Some(analysis), None)))
}
