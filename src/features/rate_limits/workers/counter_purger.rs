use std::sync::Arc;
use std::time::Duration;
use tokio::time::interval;

use crate::features::rate_limits::stores::PgCounterStore;

/// Removes ended windows from `rate_limit_counters` so the table stays small
pub struct CounterPurger {
    store: Arc<PgCounterStore>,
    every: Duration,
}

impl CounterPurger {
    pub fn new(store: Arc<PgCounterStore>, every: Duration) -> Self {
        Self { store, every }
    }

    pub async fn run(&self) {
        tracing::info!("Starting rate limit counter purger (every {:?})", self.every);

        let mut interval = interval(self.every);

        loop {
            interval.tick().await;

            match self.store.purge_expired().await {
                Ok(0) => {}
                Ok(purged) => tracing::debug!("Purged {} expired rate limit counters", purged),
                Err(e) => tracing::error!("Failed to purge rate limit counters: {}", e),
            }
        }
    }
}
