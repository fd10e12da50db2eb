use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use utoipa::ToSchema;

use crate::core::error::AppError;

/// AI operation a request is gated under. Each one is billed by the model
/// provider, so each carries its own quota.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema,
)]
#[serde(rename_all = "kebab-case")]
pub enum EndpointCategory {
    GenerateReply,
    GeneratePost,
    AnalyzeCompetitor,
}

impl EndpointCategory {
    pub const ALL: [EndpointCategory; 3] = [
        EndpointCategory::GenerateReply,
        EndpointCategory::GeneratePost,
        EndpointCategory::AnalyzeCompetitor,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EndpointCategory::GenerateReply => "generate-reply",
            EndpointCategory::GeneratePost => "generate-post",
            EndpointCategory::AnalyzeCompetitor => "analyze-competitor",
        }
    }
}

impl fmt::Display for EndpointCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EndpointCategory {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EndpointCategory::ALL
            .into_iter()
            .find(|category| category.as_str() == s)
            .ok_or_else(|| AppError::Configuration(format!("Unknown endpoint category '{}'", s)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tags_round_trip_through_from_str() {
        for category in EndpointCategory::ALL {
            assert_eq!(category.as_str().parse::<EndpointCategory>().unwrap(), category);
        }
    }

    #[test]
    fn test_unknown_tag_is_configuration_error() {
        let err = "generate-image".parse::<EndpointCategory>().unwrap_err();
        assert!(matches!(err, AppError::Configuration(_)));

        // Tags are case sensitive
        assert!("Generate-Post".parse::<EndpointCategory>().is_err());
    }

    #[test]
    fn test_serde_uses_kebab_case_tags() {
        let json = serde_json::to_string(&EndpointCategory::AnalyzeCompetitor).unwrap();
        assert_eq!(json, "\"analyze-competitor\"");
    }
}
