pub mod usage_handler;

pub use usage_handler::{get_my_usage, get_usage_summary};
