use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::features::ai_content::{
    dtos as ai_content_dtos, handlers as ai_content_handlers, models as ai_content_models,
};
use crate::features::auth;
use crate::features::rate_limits::{
    dtos as rate_limits_dtos, handlers as rate_limits_handlers, models as rate_limits_models,
};
use crate::features::usage::{
    dtos as usage_dtos, handlers as usage_handlers, models as usage_models,
};
use crate::shared::types::ApiResponse;

#[derive(OpenApi)]
#[openapi(
    paths(
        // AI content (gated)
        ai_content_handlers::content_handler::generate_review_reply,
        ai_content_handlers::content_handler::generate_post,
        ai_content_handlers::content_handler::analyze_competitor,
        // Rate limits
        rate_limits_handlers::rate_limit_handler::get_my_rate_limits,
        rate_limits_handlers::rate_limit_handler::get_my_rate_limit,
        rate_limits_handlers::rate_limit_handler::list_rate_limit_policies,
        // Usage
        usage_handlers::usage_handler::get_my_usage,
        usage_handlers::usage_handler::get_usage_summary,
    ),
    components(
        schemas(
            // Auth
            auth::model::AuthenticatedUser,
            // AI content
            ai_content_models::Tone,
            ai_content_models::PostType,
            ai_content_models::CompetitorAnalysis,
            ai_content_dtos::ReviewReplyRequestDto,
            ai_content_dtos::ReviewReplyResponseDto,
            ai_content_dtos::GeneratePostRequestDto,
            ai_content_dtos::GeneratePostResponseDto,
            ai_content_dtos::CompetitorAnalysisRequestDto,
            ApiResponse<ai_content_dtos::ReviewReplyResponseDto>,
            ApiResponse<ai_content_dtos::GeneratePostResponseDto>,
            ApiResponse<ai_content_models::CompetitorAnalysis>,
            // Rate limits
            rate_limits_models::EndpointCategory,
            rate_limits_dtos::RateLimitStatusDto,
            rate_limits_dtos::RateLimitPolicyDto,
            ApiResponse<Vec<rate_limits_dtos::RateLimitStatusDto>>,
            ApiResponse<rate_limits_dtos::RateLimitStatusDto>,
            ApiResponse<Vec<rate_limits_dtos::RateLimitPolicyDto>>,
            // Usage
            usage_models::UsageOutcome,
            usage_dtos::UsageCountDto,
            usage_dtos::UsageSummaryDto,
            ApiResponse<usage_dtos::UsageSummaryDto>,
        )
    ),
    tags(
        (name = "ai", description = "AI content generation for business profiles (rate limited per user)"),
        (name = "admin", description = "Admin endpoints (super admin only)"),
    ),
    modifiers(&SecurityAddon),
    info(
        title = "GMB Dashboard API",
        version = "0.1.0",
        description = "API documentation for the GMB dashboard backend",
    )
)]
pub struct ApiDoc;

/// Adds Bearer JWT security scheme to OpenAPI spec
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

/// Modifier to override OpenAPI info from config
pub struct SwaggerInfoModifier {
    pub title: String,
    pub version: String,
    pub description: String,
}

impl Modify for SwaggerInfoModifier {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        openapi.info.title = self.title.clone();
        openapi.info.version = self.version.clone();
        openapi.info.description = Some(self.description.clone());
    }
}
