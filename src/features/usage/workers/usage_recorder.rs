use std::sync::Arc;
use tokio::sync::mpsc;

use crate::features::usage::models::UsageRecord;
use crate::features::usage::services::UsageSink;

/// Drains the usage channel into the sink in batches.
///
/// Sink failures are logged and the batch is dropped; they never reach the
/// request that produced the records. Exits once every `UsageLogger` is gone
/// and the channel is empty.
pub struct UsageRecorder {
    receiver: mpsc::Receiver<UsageRecord>,
    sink: Arc<dyn UsageSink>,
    batch_size: usize,
}

impl UsageRecorder {
    pub fn new(
        receiver: mpsc::Receiver<UsageRecord>,
        sink: Arc<dyn UsageSink>,
        batch_size: usize,
    ) -> Self {
        Self {
            receiver,
            sink,
            batch_size: batch_size.max(1),
        }
    }

    pub async fn run(mut self) {
        tracing::info!("Starting usage recorder worker");

        let mut batch = Vec::with_capacity(self.batch_size);

        loop {
            let received = self.receiver.recv_many(&mut batch, self.batch_size).await;
            if received == 0 {
                break;
            }

            if let Err(e) = self.sink.write_batch(&batch).await {
                tracing::error!("Failed to write {} usage records: {}", batch.len(), e);
            }
            batch.clear();
        }

        tracing::info!("Usage recorder stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::{AppError, Result};
    use crate::features::rate_limits::models::EndpointCategory;
    use crate::features::usage::models::UsageOutcome;
    use crate::features::usage::services::UsageLogger;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use std::time::Duration;

    /// Collects everything written to it
    #[derive(Default)]
    struct CollectingSink {
        records: Mutex<Vec<UsageRecord>>,
        batches: Mutex<Vec<usize>>,
    }

    #[async_trait]
    impl UsageSink for CollectingSink {
        async fn write_batch(&self, records: &[UsageRecord]) -> Result<()> {
            self.batches.lock().unwrap().push(records.len());
            self.records.lock().unwrap().extend_from_slice(records);
            Ok(())
        }
    }

    struct FailingSink;

    #[async_trait]
    impl UsageSink for FailingSink {
        async fn write_batch(&self, _records: &[UsageRecord]) -> Result<()> {
            Err(AppError::Internal("audit store down".to_string()))
        }
    }

    fn record(outcome: UsageOutcome) -> UsageRecord {
        UsageRecord::new(
            "u1".to_string(),
            EndpointCategory::GenerateReply,
            outcome,
            Duration::from_millis(5),
            Some("req-1".to_string()),
        )
    }

    #[tokio::test]
    async fn test_recorder_writes_everything_then_stops() {
        let sink = Arc::new(CollectingSink::default());
        let (logger, receiver) = UsageLogger::channel(16);

        for _ in 0..5 {
            logger.record(record(UsageOutcome::Success));
        }
        logger.record(record(UsageOutcome::Error));
        drop(logger);

        UsageRecorder::new(receiver, sink.clone(), 4).run().await;

        let records = sink.records.lock().unwrap();
        assert_eq!(records.len(), 6);
        assert_eq!(records[5].outcome, UsageOutcome::Error);
        assert!(sink.batches.lock().unwrap().iter().all(|&size| size <= 4));
    }

    #[tokio::test]
    async fn test_sink_failure_is_swallowed() {
        let (logger, receiver) = UsageLogger::channel(4);
        logger.record(record(UsageOutcome::Success));
        drop(logger);

        // Completes without panicking even though every write fails
        UsageRecorder::new(receiver, Arc::new(FailingSink), 10).run().await;
    }
}
