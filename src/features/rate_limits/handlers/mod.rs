pub mod rate_limit_handler;

pub use rate_limit_handler::{get_my_rate_limit, get_my_rate_limits, list_rate_limit_policies};
