pub mod content_handler;

pub use content_handler::{analyze_competitor, generate_post, generate_review_reply};
