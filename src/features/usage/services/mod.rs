mod usage_logger;
mod usage_store;

pub use usage_logger::UsageLogger;
pub use usage_store::{PgUsageStore, UsageSink};
