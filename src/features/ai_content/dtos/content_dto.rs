use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::features::ai_content::models::{PostType, Tone};
use crate::shared::validation::LANGUAGE_TAG_REGEX;

pub const DEFAULT_LANGUAGE: &str = "en";
pub const DEFAULT_REPLY_MAX_WORDS: u16 = 120;
pub const DEFAULT_POST_MAX_WORDS: u16 = 150;

/// Draft a reply to a customer review
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct ReviewReplyRequestDto {
    #[validate(length(min = 1, max = 200, message = "Business name must be 1-200 characters"))]
    pub business_name: String,

    #[validate(length(max = 100, message = "Reviewer name must not exceed 100 characters"))]
    pub reviewer_name: Option<String>,

    /// Star rating, 1-5
    #[validate(range(min = 1, max = 5, message = "Rating must be between 1 and 5"))]
    pub rating: u8,

    #[validate(length(min = 1, max = 4000, message = "Review text must be 1-4000 characters"))]
    pub review_text: String,

    #[serde(default)]
    pub tone: Tone,

    /// BCP 47 style tag, e.g. "en" or "id-ID"
    #[validate(regex(path = *LANGUAGE_TAG_REGEX, message = "Language must be a tag like 'en' or 'pt-BR'"))]
    pub language: Option<String>,

    #[validate(range(min = 20, max = 400, message = "Max words must be between 20 and 400"))]
    pub max_words: Option<u16>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ReviewReplyResponseDto {
    pub reply: String,
}

/// Draft a Google Business Profile post
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct GeneratePostRequestDto {
    #[validate(length(min = 1, max = 200, message = "Business name must be 1-200 characters"))]
    pub business_name: String,

    #[serde(default)]
    pub post_type: PostType,

    #[validate(length(min = 1, max = 500, message = "Topic must be 1-500 characters"))]
    pub topic: String,

    #[validate(length(max = 100, message = "Call to action must not exceed 100 characters"))]
    pub call_to_action: Option<String>,

    #[serde(default)]
    #[validate(length(max = 10, message = "At most 10 keywords are allowed"))]
    pub keywords: Vec<String>,

    #[serde(default)]
    pub tone: Tone,

    #[validate(regex(path = *LANGUAGE_TAG_REGEX, message = "Language must be a tag like 'en' or 'pt-BR'"))]
    pub language: Option<String>,

    #[validate(range(min = 20, max = 400, message = "Max words must be between 20 and 400"))]
    pub max_words: Option<u16>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct GeneratePostResponseDto {
    pub post_type: PostType,
    pub content: String,
}

/// Compare the business against a competitor's public profile
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CompetitorAnalysisRequestDto {
    #[validate(length(min = 1, max = 200, message = "Business name must be 1-200 characters"))]
    pub business_name: String,

    #[validate(length(min = 1, max = 200, message = "Competitor name must be 1-200 characters"))]
    pub competitor_name: String,

    #[validate(range(min = 0.0, max = 5.0, message = "Rating must be between 0 and 5"))]
    pub competitor_rating: Option<f32>,

    pub competitor_review_count: Option<u32>,

    #[validate(length(max = 100, message = "Category must not exceed 100 characters"))]
    pub category: Option<String>,

    #[validate(length(max = 2000, message = "Notes must not exceed 2000 characters"))]
    pub notes: Option<String>,

    #[validate(regex(path = *LANGUAGE_TAG_REGEX, message = "Language must be a tag like 'en' or 'pt-BR'"))]
    pub language: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn reply_dto(value: serde_json::Value) -> ReviewReplyRequestDto {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_review_reply_defaults() {
        let dto = reply_dto(json!({
            "business_name": "Kopi Senja",
            "rating": 5,
            "review_text": "Best latte in town"
        }));

        assert!(dto.validate().is_ok());
        assert_eq!(dto.tone, Tone::Friendly);
        assert!(dto.language.is_none());
    }

    #[test]
    fn test_review_reply_rejects_out_of_range_rating() {
        let dto = reply_dto(json!({
            "business_name": "Kopi Senja",
            "rating": 6,
            "review_text": "Great"
        }));
        assert!(dto.validate().is_err());
    }

    #[test]
    fn test_review_reply_rejects_bad_language() {
        let dto = reply_dto(json!({
            "business_name": "Kopi Senja",
            "rating": 4,
            "review_text": "Great",
            "language": "english"
        }));
        assert!(dto.validate().is_err());
    }

    #[test]
    fn test_post_rejects_too_many_keywords() {
        let keywords: Vec<String> = (0..11).map(|i| format!("kw{}", i)).collect();
        let dto: GeneratePostRequestDto = serde_json::from_value(json!({
            "business_name": "Kopi Senja",
            "topic": "New seasonal menu",
            "keywords": keywords
        }))
        .unwrap();

        assert!(dto.validate().is_err());
    }

    #[test]
    fn test_competitor_rating_bounds() {
        let dto: CompetitorAnalysisRequestDto = serde_json::from_value(json!({
            "business_name": "Kopi Senja",
            "competitor_name": "Kopi Pagi",
            "competitor_rating": 5.5
        }))
        .unwrap();

        assert!(dto.validate().is_err());
    }
}
