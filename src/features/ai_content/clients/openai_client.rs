use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::core::config::AiProviderConfig;
use crate::core::error::{AppError, Result};
use crate::features::ai_content::models::{ChatModel, ChatRequest};

#[derive(Debug, Serialize)]
struct CompletionBody<'a> {
    model: &'a str,
    messages: [CompletionMessage<'a>; 2],
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Debug, Serialize)]
struct CompletionMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    message: CompletionChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct CompletionChoiceMessage {
    content: Option<String>,
}

/// Client for any OpenAI-compatible `/chat/completions` endpoint
pub struct OpenAiChatClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl OpenAiChatClient {
    pub fn new(config: &AiProviderConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent("GmbDashboardCore/1.0")
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| AppError::Configuration(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
        })
    }

    fn body<'a>(&'a self, request: &'a ChatRequest) -> CompletionBody<'a> {
        CompletionBody {
            model: &self.model,
            messages: [
                CompletionMessage {
                    role: "system",
                    content: &request.system,
                },
                CompletionMessage {
                    role: "user",
                    content: &request.prompt,
                },
            ],
            temperature: request.temperature,
            response_format: request.json_output.then_some(ResponseFormat {
                kind: "json_object",
            }),
        }
    }
}

fn first_message(response: CompletionResponse) -> Result<String> {
    response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .map(|content| content.trim().to_string())
        .filter(|content| !content.is_empty())
        .ok_or_else(|| AppError::ExternalServiceError("AI provider returned no content".to_string()))
}

#[async_trait]
impl ChatModel for OpenAiChatClient {
    async fn complete(&self, request: ChatRequest) -> Result<String> {
        let url = format!("{}/chat/completions", self.base_url);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&self.body(&request))
            .send()
            .await
            .map_err(|e| {
                tracing::error!("AI provider request failed: {:?}", e);
                if e.is_timeout() {
                    AppError::ExternalServiceError("AI provider timed out".to_string())
                } else {
                    AppError::ExternalServiceError(format!("AI provider request failed: {}", e))
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            tracing::warn!(
                "AI provider returned status {}: {}",
                status,
                detail.chars().take(500).collect::<String>()
            );
            return Err(AppError::ExternalServiceError(format!(
                "AI provider returned status {}",
                status.as_u16()
            )));
        }

        let completion: CompletionResponse = response.json().await.map_err(|e| {
            tracing::error!("Failed to parse AI provider response: {:?}", e);
            AppError::ExternalServiceError(format!("Failed to parse AI provider response: {}", e))
        })?;

        first_message(completion)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn client() -> OpenAiChatClient {
        OpenAiChatClient::new(&AiProviderConfig {
            base_url: "https://llm.internal/v1/".to_string(),
            api_key: "sk-test".to_string(),
            model: "gpt-4o-mini".to_string(),
            request_timeout: Duration::from_secs(5),
        })
        .unwrap()
    }

    #[test]
    fn test_body_for_json_request() {
        let client = client();
        let request = ChatRequest::json("sys".to_string(), "analyze".to_string());

        let body = serde_json::to_value(client.body(&request)).unwrap();
        assert_eq!(body["model"], "gpt-4o-mini");
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][1]["content"], "analyze");
        assert_eq!(body["response_format"]["type"], "json_object");
    }

    #[test]
    fn test_body_for_text_request_has_no_response_format() {
        let client = client();
        let request = ChatRequest::text("sys".to_string(), "write".to_string());

        let body = serde_json::to_value(client.body(&request)).unwrap();
        assert!(body.get("response_format").is_none());
        assert_eq!(client.base_url, "https://llm.internal/v1");
    }

    #[test]
    fn test_first_message_extraction() {
        let response: CompletionResponse = serde_json::from_str(
            r#"{"choices": [{"message": {"role": "assistant", "content": "  Thanks!  "}}]}"#,
        )
        .unwrap();
        assert_eq!(first_message(response).unwrap(), "Thanks!");

        let empty: CompletionResponse = serde_json::from_str(r#"{"choices": []}"#).unwrap();
        assert!(matches!(
            first_message(empty),
            Err(AppError::ExternalServiceError(_))
        ));
    }
}
