use tokio::sync::mpsc::{self, error::TrySendError};

use crate::features::usage::models::UsageRecord;

/// Non-blocking handle for emitting usage records.
///
/// Sending never waits and never fails the caller: a full or closed channel
/// drops the record and logs it.
#[derive(Clone)]
pub struct UsageLogger {
    sender: mpsc::Sender<UsageRecord>,
}

impl UsageLogger {
    /// Logger plus the receiving end for a [`UsageRecorder`](crate::features::usage::workers::UsageRecorder)
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<UsageRecord>) {
        let (sender, receiver) = mpsc::channel(capacity);
        (Self { sender }, receiver)
    }

    pub fn record(&self, record: UsageRecord) {
        match self.sender.try_send(record) {
            Ok(()) => {}
            Err(TrySendError::Full(record)) => {
                tracing::warn!(
                    "Usage log channel full, dropping record id={} category={} outcome={}",
                    record.id,
                    record.category,
                    record.outcome.as_str()
                );
            }
            Err(TrySendError::Closed(record)) => {
                tracing::warn!(
                    "Usage recorder stopped, dropping record id={} category={}",
                    record.id,
                    record.category
                );
            }
        }
    }
}
