use async_trait::async_trait;

use crate::core::error::Result;

/// One completion request: a system prompt plus a single user turn
#[derive(Debug, Clone, PartialEq)]
pub struct ChatRequest {
    pub system: String,
    pub prompt: String,
    /// Ask the provider for a JSON object response
    pub json_output: bool,
    pub temperature: f32,
}

impl ChatRequest {
    pub fn text(system: String, prompt: String) -> Self {
        Self {
            system,
            prompt,
            json_output: false,
            temperature: 0.7,
        }
    }

    pub fn json(system: String, prompt: String) -> Self {
        Self {
            system,
            prompt,
            json_output: true,
            temperature: 0.2,
        }
    }
}

/// Text generation backend for the AI content endpoints
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Returns the assistant message text.
    ///
    /// Provider failures map to `AppError::ExternalServiceError`.
    async fn complete(&self, request: ChatRequest) -> Result<String>;
}
