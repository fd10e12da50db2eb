use std::sync::Arc;

use axum::{routing::post, Router};

use super::handlers::{analyze_competitor, generate_post, generate_review_reply};
use super::services::ContentService;
use crate::core::error::Result;
use crate::features::ai_gate::AiGate;
use crate::features::rate_limits::models::EndpointCategory;

/// AI endpoints, each behind the gate for its category.
///
/// These routes authenticate through the gate and must not also sit behind
/// the JWT route layer.
pub fn routes(service: Arc<ContentService>, gate: &Arc<AiGate>) -> Result<Router> {
    Ok(Router::new()
        .route(
            "/api/ai/reviews/reply",
            gate.layer(EndpointCategory::GenerateReply, post(generate_review_reply))?,
        )
        .route(
            "/api/ai/posts/generate",
            gate.layer(EndpointCategory::GeneratePost, post(generate_post))?,
        )
        .route(
            "/api/ai/competitors/analyze",
            gate.layer(EndpointCategory::AnalyzeCompetitor, post(analyze_competitor))?,
        )
        .with_state(service))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::AppError;
    use crate::features::ai_content::models::{ChatModel, ChatRequest};
    use crate::features::auth::model::AuthenticatedUser;
    use crate::features::auth::IdentityResolver;
    use crate::features::rate_limits::models::PolicyTable;
    use crate::features::rate_limits::stores::MemoryCounterStore;
    use crate::features::rate_limits::{RateLimitOptions, RateLimitService};
    use crate::features::usage::UsageLogger;
    use async_trait::async_trait;
    use axum::http::StatusCode;
    use axum_test::TestServer;
    use serde_json::{json, Value};

    struct OwnerResolver;

    #[async_trait]
    impl IdentityResolver for OwnerResolver {
        async fn resolve(&self, token: &str) -> Result<AuthenticatedUser> {
            if token == "owner-token" {
                Ok(AuthenticatedUser {
                    user_id: "owner-42".to_string(),
                    email: None,
                    roles: vec![],
                })
            } else {
                Err(AppError::Unauthorized("Invalid token".to_string()))
            }
        }
    }

    struct EchoModel;

    #[async_trait]
    impl ChatModel for EchoModel {
        async fn complete(&self, request: ChatRequest) -> Result<String> {
            if request.json_output {
                Ok(r#"{"summary": "ok"}"#.to_string())
            } else {
                Ok("Thanks for visiting!".to_string())
            }
        }
    }

    fn server(policies: PolicyTable) -> Result<TestServer> {
        let limiter = Arc::new(RateLimitService::new(
            Arc::new(MemoryCounterStore::new()),
            policies,
            RateLimitOptions::default(),
        ));
        let (usage, _receiver) = UsageLogger::channel(16);
        let gate = Arc::new(AiGate::new(Arc::new(OwnerResolver), limiter, usage));
        let service = Arc::new(ContentService::new(Arc::new(EchoModel)));

        let app = routes(service, &gate)?;
        Ok(TestServer::new(app).unwrap())
    }

    #[tokio::test]
    async fn test_review_reply_through_gate() {
        let server = server(PolicyTable::defaults()).unwrap();

        let response = server
            .post("/api/ai/reviews/reply")
            .authorization_bearer("owner-token")
            .json(&json!({
                "business_name": "Kopi Senja",
                "rating": 5,
                "review_text": "Lovely staff"
            }))
            .await;

        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["data"]["reply"], "Thanks for visiting!");
        assert_eq!(response.headers().get("x-ratelimit-limit").unwrap(), "10");
        assert_eq!(response.headers().get("x-ratelimit-remaining").unwrap(), "9");
    }

    #[tokio::test]
    async fn test_invalid_body_is_400_after_auth() {
        let server = server(PolicyTable::defaults()).unwrap();

        let response = server
            .post("/api/ai/reviews/reply")
            .authorization_bearer("owner-token")
            .json(&json!({
                "business_name": "Kopi Senja",
                "rating": 9,
                "review_text": "?"
            }))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_missing_token_is_401() {
        let server = server(PolicyTable::defaults()).unwrap();

        let response = server
            .post("/api/ai/competitors/analyze")
            .json(&json!({
                "business_name": "Kopi Senja",
                "competitor_name": "Kopi Pagi"
            }))
            .await;

        response.assert_status(StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn test_routes_refuse_uncovered_category() {
        let policies = PolicyTable::parse("analyze-competitor=off").unwrap();
        assert!(matches!(server(policies), Err(AppError::Configuration(_))));
    }
}
