use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Tone {
    #[default]
    Friendly,
    Professional,
    Enthusiastic,
    Empathetic,
}

impl Tone {
    pub fn as_str(&self) -> &'static str {
        match self {
            Tone::Friendly => "friendly",
            Tone::Professional => "professional",
            Tone::Enthusiastic => "enthusiastic",
            Tone::Empathetic => "empathetic",
        }
    }
}

/// Google Business Profile post kinds
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum PostType {
    #[default]
    Update,
    Offer,
    Event,
}

impl PostType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PostType::Update => "update",
            PostType::Offer => "offer",
            PostType::Event => "event",
        }
    }
}
