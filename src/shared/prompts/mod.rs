//! Prompt templates for the AI content endpoints.
//!
//! ```ignore
//! let mut ctx = HashMap::new();
//! ctx.insert("business_name", Value::from("Kopi Senja"));
//! let prompt = render_template("ai/post.jinja", &ctx)?;
//! ```

pub mod engine;

pub use engine::render_template;
