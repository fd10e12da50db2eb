use chrono::{DateTime, Utc};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use crate::core::config::RateLimitConfig;
use crate::core::error::{AppError, Result};
use crate::features::rate_limits::models::{
    EndpointCategory, PolicyTable, RateLimitPolicy, RateLimitResult,
};
use crate::features::rate_limits::stores::{counter_key, CounterStore, CounterStoreError};

/// Tunables for [`RateLimitService`]
#[derive(Debug, Clone)]
pub struct RateLimitOptions {
    pub key_prefix: String,
    pub store_timeout: Duration,
    /// Denied attempts still consume a unit of the window
    pub count_denied_attempts: bool,
}

impl Default for RateLimitOptions {
    fn default() -> Self {
        Self {
            key_prefix: "gmb:ai-rl".to_string(),
            store_timeout: Duration::from_millis(500),
            count_denied_attempts: true,
        }
    }
}

impl From<&RateLimitConfig> for RateLimitOptions {
    fn from(config: &RateLimitConfig) -> Self {
        Self {
            key_prefix: config.key_prefix.clone(),
            store_timeout: config.store_timeout,
            count_denied_attempts: config.count_denied_attempts,
        }
    }
}

/// Checks and consumes per-user quota for AI endpoint categories.
///
/// Holds no mutable state of its own; all counters live in the store.
pub struct RateLimitService {
    store: Arc<dyn CounterStore>,
    policies: PolicyTable,
    options: RateLimitOptions,
}

impl RateLimitService {
    pub fn new(
        store: Arc<dyn CounterStore>,
        policies: PolicyTable,
        options: RateLimitOptions,
    ) -> Self {
        Self {
            store,
            policies,
            options,
        }
    }

    pub fn policies(&self) -> &PolicyTable {
        &self.policies
    }

    fn policy(&self, category: EndpointCategory) -> Result<&RateLimitPolicy> {
        self.policies.get(category).ok_or_else(|| {
            AppError::Configuration(format!(
                "No rate limit policy configured for '{}'",
                category
            ))
        })
    }

    fn validate_identity(identity: &str) -> Result<()> {
        if identity.trim().is_empty() {
            return Err(AppError::Validation(
                "Rate limit identity must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Run a store call under the configured timeout
    async fn with_timeout<T>(
        &self,
        call: impl Future<Output = std::result::Result<T, CounterStoreError>>,
    ) -> std::result::Result<T, CounterStoreError> {
        tokio::time::timeout(self.options.store_timeout, call)
            .await
            .map_err(|_| CounterStoreError::Timeout(self.options.store_timeout))?
    }

    /// Consume one unit of `category` quota for `identity`.
    ///
    /// Returns `allowed = false` once the window is exhausted. A store failure
    /// is an error (`InfrastructureUnavailable`), never an allow.
    pub async fn check(
        &self,
        identity: &str,
        category: EndpointCategory,
    ) -> Result<RateLimitResult> {
        self.check_at(identity, category, Utc::now()).await
    }

    pub(crate) async fn check_at(
        &self,
        identity: &str,
        category: EndpointCategory,
        now: DateTime<Utc>,
    ) -> Result<RateLimitResult> {
        Self::validate_identity(identity)?;
        let policy = *self.policy(category)?;

        let (window_start, reset_at) = policy.window_bounds(now);
        let key = counter_key(&self.options.key_prefix, identity, category, window_start);
        let ttl = (reset_at - now).to_std().unwrap_or(policy.window);

        let count = self
            .with_timeout(self.store.increment(&key, ttl))
            .await
            .map_err(|e| {
                tracing::error!(
                    "Rate limit check failed closed for category={} backend={}: {}",
                    category,
                    self.store.backend_name(),
                    e
                );
                AppError::from(e)
            })?;

        let result = RateLimitResult::from_count(
            category,
            policy.max_requests,
            count,
            window_start,
            reset_at,
        );

        if !result.allowed {
            tracing::info!(
                "Rate limit exceeded: identity={} category={} limit={} resets_at={}",
                identity,
                category,
                policy.max_requests,
                reset_at
            );

            if !self.options.count_denied_attempts {
                // Hand the unit back; a failure here only over-counts, so it is not fatal
                if let Err(e) = self.with_timeout(self.store.decrement(&key, ttl)).await {
                    tracing::warn!("Failed to release denied rate limit unit: {}", e);
                }
            }
        }

        Ok(result)
    }

    /// Quota view for `identity` without consuming anything
    pub async fn status(
        &self,
        identity: &str,
        category: EndpointCategory,
    ) -> Result<RateLimitResult> {
        self.status_at(identity, category, Utc::now()).await
    }

    pub(crate) async fn status_at(
        &self,
        identity: &str,
        category: EndpointCategory,
        now: DateTime<Utc>,
    ) -> Result<RateLimitResult> {
        Self::validate_identity(identity)?;
        let policy = *self.policy(category)?;

        let (window_start, reset_at) = policy.window_bounds(now);
        let key = counter_key(&self.options.key_prefix, identity, category, window_start);

        let used = self.with_timeout(self.store.get(&key)).await?;
        let limit = u64::from(policy.max_requests);
        let remaining = limit.saturating_sub(used) as u32;

        Ok(RateLimitResult {
            category,
            allowed: remaining > 0,
            limit: policy.max_requests,
            remaining,
            window_start,
            reset_at,
        })
    }

    /// Status for every configured category
    pub async fn status_all(&self, identity: &str) -> Result<Vec<RateLimitResult>> {
        let now = Utc::now();
        let mut statuses = Vec::new();
        for policy in self.policies.iter() {
            statuses.push(self.status_at(identity, policy.category, now).await?);
        }
        Ok(statuses)
    }
}
