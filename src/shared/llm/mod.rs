//! Helpers for turning free-form model output into typed values.

mod parser;
mod response;

pub use parser::parse_with_fallback;
pub use response::LlmResponse;
