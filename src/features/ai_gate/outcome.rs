use axum::response::Response;

use crate::features::usage::models::UsageOutcome;

/// Classifies a gated handler's output for the usage log
pub trait UsageOutcomeOf {
    fn usage_outcome(&self) -> UsageOutcome;
}

impl<T, E> UsageOutcomeOf for Result<T, E> {
    fn usage_outcome(&self) -> UsageOutcome {
        if self.is_ok() {
            UsageOutcome::Success
        } else {
            UsageOutcome::Error
        }
    }
}

impl UsageOutcomeOf for Response {
    fn usage_outcome(&self) -> UsageOutcome {
        let status = self.status();
        if status.is_success() || status.is_redirection() {
            UsageOutcome::Success
        } else {
            UsageOutcome::Error
        }
    }
}
