use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{HeaderMap, HeaderValue},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::MethodRouter,
};

use super::gate::AiGate;
use crate::core::error::{AppError, Result};
use crate::features::auth::bearer_token;
use crate::features::rate_limits::models::{EndpointCategory, RateLimitResult};
use crate::shared::constants::{
    HEADER_RATE_LIMIT_LIMIT, HEADER_RATE_LIMIT_REMAINING, HEADER_RATE_LIMIT_RESET,
};

/// Middleware state: the gate plus the category of the route it wraps
#[derive(Clone)]
struct GateState {
    gate: Arc<AiGate>,
    category: EndpointCategory,
}

impl AiGate {
    /// Wrap `route` so every call to it goes through the gate for `category`.
    ///
    /// The handler sees `AuthenticatedUser` and `RateLimitResult` in request
    /// extensions. Fails when `category` has no configured policy so a
    /// misconfigured route is caught at startup.
    pub fn layer<S>(
        self: &Arc<Self>,
        category: EndpointCategory,
        route: MethodRouter<S>,
    ) -> Result<MethodRouter<S>>
    where
        S: Clone + Send + Sync + 'static,
    {
        self.rate_limits().policies().get(category).ok_or_else(|| {
            AppError::Configuration(format!(
                "Cannot gate route: no rate limit policy for '{}'",
                category
            ))
        })?;

        let state = GateState {
            gate: Arc::clone(self),
            category,
        };

        Ok(route.layer(middleware::from_fn_with_state(state, ai_gate_middleware)))
    }
}

fn rate_limit_headers(quota: &RateLimitResult) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(HEADER_RATE_LIMIT_LIMIT, HeaderValue::from(quota.limit));
    headers.insert(HEADER_RATE_LIMIT_REMAINING, HeaderValue::from(quota.remaining));
    headers.insert(
        HEADER_RATE_LIMIT_RESET,
        HeaderValue::from(quota.reset_at.timestamp()),
    );
    headers
}

async fn ai_gate_middleware(
    State(state): State<GateState>,
    mut req: Request,
    next: Next,
) -> Response {
    let token = bearer_token(req.headers()).ok().map(str::to_string);
    let request_id = req
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    let result = state
        .gate
        .protect_request(token.as_deref(), state.category, request_id, |ctx| async move {
            let headers = rate_limit_headers(&ctx.quota);
            req.extensions_mut().insert(ctx.user);
            req.extensions_mut().insert(ctx.quota);

            let mut response = next.run(req).await;
            response.headers_mut().extend(headers);
            response
        })
        .await;

    match result {
        Ok(response) => response,
        Err(e) => e.into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::ai_gate::gate::tests::{gate_with, post_limiter, VALID_TOKEN};
    use crate::features::auth::model::AuthenticatedUser;
    use crate::features::usage::models::{UsageOutcome, UsageRecord};
    use axum::{http::StatusCode, routing::post, Extension, Json, Router};
    use axum_test::TestServer;
    use serde_json::{json, Value};
    use tokio::sync::mpsc;

    async fn generate(
        user: AuthenticatedUser,
        Extension(quota): Extension<RateLimitResult>,
    ) -> Json<Value> {
        Json(json!({ "user": user.user_id, "remaining": quota.remaining }))
    }

    async fn failing() -> StatusCode {
        StatusCode::BAD_GATEWAY
    }

    fn server(max: u32) -> (TestServer, mpsc::Receiver<UsageRecord>) {
        let (gate, receiver) = gate_with(post_limiter(max));
        let gate = Arc::new(gate);

        let app = Router::new()
            .route(
                "/generate",
                gate.layer(EndpointCategory::GeneratePost, post(generate))
                    .unwrap(),
            )
            .route(
                "/failing",
                gate.layer(EndpointCategory::GeneratePost, post(failing))
                    .unwrap(),
            );

        (TestServer::new(app).unwrap(), receiver)
    }

    #[tokio::test]
    async fn test_unauthenticated_request_is_401() {
        let (server, mut receiver) = server(2);

        let response = server.post("/generate").await;

        response.assert_status(StatusCode::UNAUTHORIZED);
        let body: Value = response.json();
        assert_eq!(body["success"], false);
        assert!(receiver.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_allowed_request_reaches_handler_with_headers() {
        let (server, mut receiver) = server(2);

        let response = server.post("/generate").authorization_bearer(VALID_TOKEN).await;

        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["user"], "owner-1");
        assert_eq!(body["remaining"], 1);
        assert_eq!(response.headers().get(HEADER_RATE_LIMIT_LIMIT).unwrap(), "2");
        assert_eq!(response.headers().get(HEADER_RATE_LIMIT_REMAINING).unwrap(), "1");
        assert!(response.headers().get(HEADER_RATE_LIMIT_RESET).is_some());

        let record = receiver.try_recv().unwrap();
        assert_eq!(record.outcome, UsageOutcome::Success);
    }

    #[tokio::test]
    async fn test_exhausted_quota_is_429_with_retry_after() {
        let (server, _receiver) = server(1);

        server
            .post("/generate")
            .authorization_bearer(VALID_TOKEN)
            .await
            .assert_status_ok();

        let response = server.post("/generate").authorization_bearer(VALID_TOKEN).await;

        response.assert_status(StatusCode::TOO_MANY_REQUESTS);
        assert!(response.headers().get("retry-after").is_some());
        assert_eq!(response.headers().get(HEADER_RATE_LIMIT_REMAINING).unwrap(), "0");
        let body: Value = response.json();
        assert_eq!(body["errors"][0], "rate_limit_exceeded");
    }

    #[tokio::test]
    async fn test_handler_failure_status_is_kept_and_recorded_as_error() {
        let (server, mut receiver) = server(2);

        let response = server.post("/failing").authorization_bearer(VALID_TOKEN).await;

        response.assert_status(StatusCode::BAD_GATEWAY);
        assert_eq!(receiver.try_recv().unwrap().outcome, UsageOutcome::Error);
    }

    #[test]
    fn test_layer_requires_policy() {
        let (gate, _receiver) = gate_with(post_limiter(2));
        let gate = Arc::new(gate);

        let result = gate.layer::<()>(EndpointCategory::AnalyzeCompetitor, post(failing));
        assert!(matches!(result, Err(AppError::Configuration(_))));
    }
}
