mod rate_limit_service;

pub use rate_limit_service::{RateLimitOptions, RateLimitService};

#[cfg(test)]
pub(crate) use rate_limit_service::tests as test_support;
