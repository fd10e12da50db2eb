use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::shared::llm::LlmResponse;

fn default_true() -> bool {
    true
}

/// Structured comparison against one competitor's public profile
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, ToSchema)]
pub struct CompetitorAnalysis {
    /// Two or three sentence overview
    #[serde(default)]
    pub summary: String,

    /// Where the competitor is ahead
    #[serde(default)]
    pub competitor_strengths: Vec<String>,

    /// Where the competitor is weak
    #[serde(default)]
    pub competitor_weaknesses: Vec<String>,

    /// Concrete actions for the business, most valuable first
    #[serde(default)]
    pub recommended_actions: Vec<String>,

    /// False when the model output could not be parsed and this is a placeholder
    #[serde(default = "default_true")]
    #[schemars(skip)]
    pub parsed: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schemars(skip)]
    pub error: Option<String>,
}

impl LlmResponse for CompetitorAnalysis {
    fn mark_as_fallback(&mut self, error_message: String) {
        self.parsed = false;
        self.error = Some(error_message);
    }

    fn is_success(&self) -> bool {
        self.parsed
    }
}
