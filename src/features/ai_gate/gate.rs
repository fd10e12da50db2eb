use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;

use super::outcome::UsageOutcomeOf;
use crate::core::error::{AppError, Result};
use crate::features::auth::model::AuthenticatedUser;
use crate::features::auth::IdentityResolver;
use crate::features::rate_limits::models::{EndpointCategory, RateLimitResult};
use crate::features::rate_limits::RateLimitService;
use crate::features::usage::models::UsageRecord;
use crate::features::usage::UsageLogger;

/// What a gated handler learns about the call it is serving
#[derive(Debug, Clone)]
pub struct GateContext {
    pub user: AuthenticatedUser,
    pub quota: RateLimitResult,
}

/// Authentication, quota and usage accounting in front of AI handlers.
///
/// Every invocation runs resolve identity, consume quota, run handler, record
/// usage, in that order. A failure in the first two steps ends the call before
/// the handler runs and records nothing.
pub struct AiGate {
    identity: Arc<dyn IdentityResolver>,
    rate_limits: Arc<RateLimitService>,
    usage: UsageLogger,
}

impl AiGate {
    pub fn new(
        identity: Arc<dyn IdentityResolver>,
        rate_limits: Arc<RateLimitService>,
        usage: UsageLogger,
    ) -> Self {
        Self {
            identity,
            rate_limits,
            usage,
        }
    }

    pub fn rate_limits(&self) -> &Arc<RateLimitService> {
        &self.rate_limits
    }

    /// Run `handler` behind the gate and hand back its output unchanged.
    ///
    /// `credentials` is the bearer token, if the caller sent one.
    pub async fn protect<F, Fut, R>(
        &self,
        credentials: Option<&str>,
        category: EndpointCategory,
        handler: F,
    ) -> Result<R>
    where
        F: FnOnce(GateContext) -> Fut,
        Fut: Future<Output = R>,
        R: UsageOutcomeOf,
    {
        self.protect_request(credentials, category, None, handler)
            .await
    }

    /// [`protect`](Self::protect) with the request id copied into the usage record
    pub async fn protect_request<F, Fut, R>(
        &self,
        credentials: Option<&str>,
        category: EndpointCategory,
        request_id: Option<String>,
        handler: F,
    ) -> Result<R>
    where
        F: FnOnce(GateContext) -> Fut,
        Fut: Future<Output = R>,
        R: UsageOutcomeOf,
    {
        let token = credentials.ok_or_else(|| {
            AppError::Unauthorized("Missing or invalid authorization header".to_string())
        })?;
        let user = self.identity.resolve(token).await?;

        let quota = self.rate_limits.check(&user.user_id, category).await?;
        if !quota.allowed {
            return Err(quota.to_error(Utc::now()));
        }

        tracing::debug!(
            "AI gate passed: user={} category={} remaining={}",
            user.user_id,
            category,
            quota.remaining
        );

        let identity = user.user_id.clone();
        let started = Instant::now();
        let output = handler(GateContext { user, quota }).await;

        self.usage.record(UsageRecord::new(
            identity,
            category,
            output.usage_outcome(),
            started.elapsed(),
            request_id,
        ));

        Ok(output)
    }
}
