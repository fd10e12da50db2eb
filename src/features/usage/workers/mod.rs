mod usage_recorder;

pub use usage_recorder::UsageRecorder;
