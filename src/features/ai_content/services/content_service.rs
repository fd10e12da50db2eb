use minijinja::Value;
use std::collections::HashMap;
use std::sync::Arc;

use crate::core::error::{AppError, Result};
use crate::features::ai_content::dtos::{
    CompetitorAnalysisRequestDto, GeneratePostRequestDto, GeneratePostResponseDto,
    ReviewReplyRequestDto, ReviewReplyResponseDto, DEFAULT_LANGUAGE, DEFAULT_POST_MAX_WORDS,
    DEFAULT_REPLY_MAX_WORDS,
};
use crate::features::ai_content::models::{ChatModel, ChatRequest, CompetitorAnalysis, Tone};
use crate::shared::llm::{parse_with_fallback, LlmResponse};
use crate::shared::prompts::render_template;

const SYSTEM_TEMPLATE: &str = "ai/system.jinja";
const REVIEW_REPLY_TEMPLATE: &str = "ai/review_reply.jinja";
const POST_TEMPLATE: &str = "ai/post.jinja";
const COMPETITOR_TEMPLATE: &str = "ai/competitor_analysis.jinja";

/// Generates review replies, posts and competitor analyses for a business profile
pub struct ContentService {
    model: Arc<dyn ChatModel>,
}

impl ContentService {
    pub fn new(model: Arc<dyn ChatModel>) -> Self {
        Self { model }
    }

    fn render(name: &str, ctx: &HashMap<&str, Value>) -> Result<String> {
        render_template(name, ctx).map_err(|e| {
            tracing::error!("Failed to render prompt {}: {}", name, e);
            AppError::Internal(format!("Failed to render prompt: {}", e))
        })
    }

    fn system_prompt(language: Option<&str>, tone: Tone) -> Result<String> {
        let mut ctx = HashMap::new();
        ctx.insert("language", Value::from(language.unwrap_or(DEFAULT_LANGUAGE)));
        ctx.insert("tone", Value::from(tone.as_str()));
        Self::render(SYSTEM_TEMPLATE, &ctx)
    }

    pub async fn generate_review_reply(
        &self,
        dto: &ReviewReplyRequestDto,
    ) -> Result<ReviewReplyResponseDto> {
        let system = Self::system_prompt(dto.language.as_deref(), dto.tone)?;

        let mut ctx = HashMap::new();
        ctx.insert("business_name", Value::from(dto.business_name.as_str()));
        ctx.insert(
            "reviewer_name",
            Value::from(dto.reviewer_name.as_deref().unwrap_or("a customer")),
        );
        ctx.insert("rating", Value::from(dto.rating));
        ctx.insert("review_text", Value::from(dto.review_text.as_str()));
        ctx.insert(
            "max_words",
            Value::from(dto.max_words.unwrap_or(DEFAULT_REPLY_MAX_WORDS)),
        );
        let prompt = Self::render(REVIEW_REPLY_TEMPLATE, &ctx)?;

        let reply = self.model.complete(ChatRequest::text(system, prompt)).await?;

        Ok(ReviewReplyResponseDto { reply })
    }

    pub async fn generate_post(
        &self,
        dto: &GeneratePostRequestDto,
    ) -> Result<GeneratePostResponseDto> {
        let system = Self::system_prompt(dto.language.as_deref(), dto.tone)?;

        let mut ctx = HashMap::new();
        ctx.insert("business_name", Value::from(dto.business_name.as_str()));
        ctx.insert("post_type", Value::from(dto.post_type.as_str()));
        ctx.insert("topic", Value::from(dto.topic.as_str()));
        ctx.insert(
            "call_to_action",
            Value::from(dto.call_to_action.as_deref().unwrap_or("")),
        );
        ctx.insert("keywords", Value::from_serialize(&dto.keywords));
        ctx.insert(
            "max_words",
            Value::from(dto.max_words.unwrap_or(DEFAULT_POST_MAX_WORDS)),
        );
        let prompt = Self::render(POST_TEMPLATE, &ctx)?;

        let content = self.model.complete(ChatRequest::text(system, prompt)).await?;

        Ok(GeneratePostResponseDto {
            post_type: dto.post_type,
            content,
        })
    }

    /// Structured analysis; unparseable model output yields a placeholder with `parsed = false`
    pub async fn analyze_competitor(
        &self,
        dto: &CompetitorAnalysisRequestDto,
    ) -> Result<CompetitorAnalysis> {
        let system = Self::system_prompt(dto.language.as_deref(), Tone::Professional)?;

        let mut ctx = HashMap::new();
        ctx.insert("business_name", Value::from(dto.business_name.as_str()));
        ctx.insert("competitor_name", Value::from(dto.competitor_name.as_str()));
        ctx.insert(
            "competitor_rating",
            Value::from_serialize(dto.competitor_rating),
        );
        ctx.insert(
            "competitor_review_count",
            Value::from_serialize(dto.competitor_review_count),
        );
        ctx.insert("category", Value::from_serialize(&dto.category));
        ctx.insert("notes", Value::from_serialize(&dto.notes));
        ctx.insert(
            "json_schema",
            Value::from(CompetitorAnalysis::json_schema_string()),
        );
        let prompt = Self::render(COMPETITOR_TEMPLATE, &ctx)?;

        let raw = self.model.complete(ChatRequest::json(system, prompt)).await?;
        let analysis: CompetitorAnalysis = parse_with_fallback(&raw);

        if !analysis.is_success() {
            tracing::warn!(
                "Competitor analysis for '{}' fell back to placeholder",
                dto.competitor_name
            );
        }

        Ok(analysis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::ai_content::models::PostType;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Returns a canned reply and remembers the last request
    pub(crate) struct StubModel {
        reply: String,
        last: Mutex<Option<ChatRequest>>,
    }

    impl StubModel {
        pub(crate) fn new(reply: &str) -> Self {
            Self {
                reply: reply.to_string(),
                last: Mutex::new(None),
            }
        }

        fn last_request(&self) -> ChatRequest {
            self.last.lock().unwrap().clone().unwrap()
        }
    }

    #[async_trait]
    impl ChatModel for StubModel {
        async fn complete(&self, request: ChatRequest) -> Result<String> {
            *self.last.lock().unwrap() = Some(request);
            Ok(self.reply.clone())
        }
    }

    struct DownModel;

    #[async_trait]
    impl ChatModel for DownModel {
        async fn complete(&self, _request: ChatRequest) -> Result<String> {
            Err(AppError::ExternalServiceError("AI provider timed out".to_string()))
        }
    }

    fn reply_dto(rating: u8) -> ReviewReplyRequestDto {
        ReviewReplyRequestDto {
            business_name: "Kopi Senja".to_string(),
            reviewer_name: Some("Rina".to_string()),
            rating,
            review_text: "Waited 40 minutes for a cold latte.".to_string(),
            tone: Tone::Empathetic,
            language: Some("id".to_string()),
            max_words: None,
        }
    }

    #[tokio::test]
    async fn test_review_reply_prompt_reflects_request() {
        let model = Arc::new(StubModel::new("Maaf atas pengalaman Anda."));
        let service = ContentService::new(model.clone());

        let response = service.generate_review_reply(&reply_dto(1)).await.unwrap();
        assert_eq!(response.reply, "Maaf atas pengalaman Anda.");

        let request = model.last_request();
        assert!(!request.json_output);
        assert!(request.system.contains("Write in id"));
        assert!(request.system.contains("empathetic"));
        assert!(request.prompt.contains("Rina"));
        assert!(request.prompt.contains("Apologise"));
        assert!(request.prompt.contains(&DEFAULT_REPLY_MAX_WORDS.to_string()));
    }

    #[tokio::test]
    async fn test_post_prompt_includes_keywords() {
        let model = Arc::new(StubModel::new("Our autumn menu is here!"));
        let service = ContentService::new(model.clone());

        let dto = GeneratePostRequestDto {
            business_name: "Kopi Senja".to_string(),
            post_type: PostType::Offer,
            topic: "Pumpkin spice latte".to_string(),
            call_to_action: Some("Order now".to_string()),
            keywords: vec!["latte".to_string(), "autumn".to_string()],
            tone: Tone::Enthusiastic,
            language: None,
            max_words: Some(80),
        };

        let response = service.generate_post(&dto).await.unwrap();
        assert_eq!(response.post_type, PostType::Offer);
        assert_eq!(response.content, "Our autumn menu is here!");

        let request = model.last_request();
        assert!(request.system.contains("Write in en"));
        assert!(request.prompt.contains("offer post"));
        assert!(request.prompt.contains("latte, autumn"));
        assert!(request.prompt.contains("Order now"));
        assert!(request.prompt.contains("80 words"));
    }

    fn competitor_dto() -> CompetitorAnalysisRequestDto {
        CompetitorAnalysisRequestDto {
            business_name: "Kopi Senja".to_string(),
            competitor_name: "Kopi Pagi".to_string(),
            competitor_rating: Some(4.6),
            competitor_review_count: Some(312),
            category: Some("Coffee shop".to_string()),
            notes: None,
            language: None,
        }
    }

    #[tokio::test]
    async fn test_competitor_analysis_parses_fenced_json() {
        let model = Arc::new(StubModel::new(
            "```json\n{\"summary\": \"Strong on speed\", \"competitor_strengths\": [\"fast service\"], \"recommended_actions\": [\"reply to reviews\",]}\n```",
        ));
        let service = ContentService::new(model.clone());

        let analysis = service.analyze_competitor(&competitor_dto()).await.unwrap();
        assert!(analysis.is_success());
        assert_eq!(analysis.competitor_strengths, vec!["fast service"]);
        assert_eq!(analysis.recommended_actions, vec!["reply to reviews"]);

        let request = model.last_request();
        assert!(request.json_output);
        assert!(request.prompt.contains("312"));
        assert!(request.prompt.contains("recommended_actions"));
    }

    #[tokio::test]
    async fn test_competitor_analysis_falls_back_on_garbage() {
        let service = ContentService::new(Arc::new(StubModel::new("I can't compare these.")));

        let analysis = service.analyze_competitor(&competitor_dto()).await.unwrap();
        assert!(!analysis.is_success());
        assert!(analysis.error.is_some());
    }

    #[tokio::test]
    async fn test_model_failure_propagates() {
        let service = ContentService::new(Arc::new(DownModel));

        let result = service.generate_review_reply(&reply_dto(5)).await;
        assert!(matches!(result, Err(AppError::ExternalServiceError(_))));
    }
}
