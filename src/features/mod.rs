pub mod ai_content;
pub mod ai_gate;
pub mod auth;
pub mod rate_limits;
pub mod usage;
