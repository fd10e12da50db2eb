//! Atomic counter backends for quota tracking.
//!
//! All backends share one contract: `increment` is an atomic
//! increment-and-get, so concurrent callers for the same key always observe
//! distinct counts.

mod memory_store;
mod postgres_store;
mod redis_store;

pub use memory_store::MemoryCounterStore;
pub use postgres_store::PgCounterStore;
pub use redis_store::RedisCounterStore;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use std::time::Duration;
use thiserror::Error;

use crate::core::error::AppError;
use crate::features::rate_limits::models::EndpointCategory;

#[derive(Debug, Error)]
pub enum CounterStoreError {
    #[error("counter store unreachable: {0}")]
    Unavailable(String),

    #[error("counter store timed out after {0:?}")]
    Timeout(Duration),

    #[error("unexpected counter value: {0}")]
    Corrupt(String),
}

impl From<CounterStoreError> for AppError {
    fn from(err: CounterStoreError) -> Self {
        AppError::InfrastructureUnavailable(err.to_string())
    }
}

/// External counter keyed by `(identity, category, window)`.
#[async_trait]
pub trait CounterStore: Send + Sync {
    /// Atomically add one and return the new value. A new key expires after `ttl`.
    async fn increment(&self, key: &str, ttl: Duration) -> Result<u64, CounterStoreError>;

    /// Atomically subtract one, never going below zero.
    async fn decrement(&self, key: &str, ttl: Duration) -> Result<(), CounterStoreError>;

    /// Current value without consuming quota. Missing or expired keys read as zero.
    async fn get(&self, key: &str) -> Result<u64, CounterStoreError>;

    fn backend_name(&self) -> &'static str;
}

/// Counter key for one identity, category and window.
///
/// The identity is hashed so raw user ids never reach the shared store.
pub fn counter_key(
    prefix: &str,
    identity: &str,
    category: EndpointCategory,
    window_start: DateTime<Utc>,
) -> String {
    let digest = hex::encode(Sha256::digest(identity.as_bytes()));
    format!(
        "{}:{}:{}:{}",
        prefix,
        digest,
        category,
        window_start.timestamp()
    )
}
