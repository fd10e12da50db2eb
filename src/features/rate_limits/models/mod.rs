mod category;
mod policy;
mod rate_limit_result;

pub use category::EndpointCategory;
pub use policy::{PolicyTable, RateLimitPolicy};
pub use rate_limit_result::RateLimitResult;
