mod chat;
mod competitor_analysis;
mod content;

pub use chat::{ChatModel, ChatRequest};
pub use competitor_analysis::CompetitorAnalysis;
pub use content::{PostType, Tone};
