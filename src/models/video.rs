use serde::{Deserialize, Serialize};

use super::VideoId;
use crate::player::source::SourceResolver;

/// How an item's bytes reach the viewer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum DeliveryType {
    /// A known video file or CDN object streamed by the native element
    #[serde(rename = "mp4")]
    DirectFile,
    #[serde(rename = "youtube")]
    YouTube,
    #[serde(rename = "vimeo")]
    Vimeo,
    /// Anything else; played exactly like a direct file
    #[default]
    #[serde(rename = "direct")]
    Direct,
}

impl DeliveryType {
    /// Whether the item is shown through a third-party embed frame.
    pub fn is_embedded(self) -> bool {
        matches!(self, Self::YouTube | Self::Vimeo)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::DirectFile => "mp4",
            Self::YouTube => "youtube",
            Self::Vimeo => "vimeo",
            Self::Direct => "direct",
        }
    }
}

/// An alternative caption/language track offered for an item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaptionVariant {
    pub language: String,
    pub label: String,
    #[serde(default)]
    pub src: String,
    #[serde(default)]
    pub is_default: bool,
}

/// A playable entry as handed over by the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoItem {
    pub id: VideoId,
    pub title: String,
    #[serde(default)]
    pub url: String,
    #[serde(rename = "type", default)]
    pub delivery: DeliveryType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub episode_number: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caption_label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_default: Option<bool>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub variants: Vec<CaptionVariant>,
}

impl VideoItem {
    /// Build an item whose delivery type is classified from its URL.
    pub fn new(id: impl Into<VideoId>, title: impl Into<String>, url: impl Into<String>) -> Self {
        let url = url.into();
        let delivery = SourceResolver::classify(&url);
        Self {
            id: id.into(),
            title: title.into(),
            url,
            delivery,
            thumbnail: None,
            duration: None,
            description: None,
            episode_number: 0,
            caption_label: None,
            is_default: None,
            variants: Vec::new(),
        }
    }

    pub fn with_delivery(mut self, delivery: DeliveryType) -> Self {
        self.delivery = delivery;
        self
    }

    pub fn with_thumbnail(mut self, thumbnail: impl Into<String>) -> Self {
        self.thumbnail = Some(thumbnail.into());
        self
    }

    pub fn with_episode_number(mut self, episode_number: u32) -> Self {
        self.episode_number = episode_number;
        self
    }

    pub fn with_variants(mut self, variants: Vec<CaptionVariant>) -> Self {
        self.variants = variants;
        self
    }

    pub fn has_url(&self) -> bool {
        !self.url.trim().is_empty()
    }

    /// The caption variant to preselect when the item starts.
    pub fn default_variant(&self) -> Option<&CaptionVariant> {
        self.variants.iter().find(|v| v.is_default)
    }

    pub fn variant(&self, language: &str) -> Option<&CaptionVariant> {
        self.variants.iter().find(|v| v.language == language)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_catalog_json() {
        let json = r#"{
            "id": "12",
            "title": "Aula 1",
            "url": "https://youtu.be/abc123",
            "type": "youtube",
            "episode_number": 1,
            "variants": [
                {"language": "pt", "label": "Português", "is_default": true},
                {"language": "en", "label": "English"}
            ]
        }"#;

        let item: VideoItem = serde_json::from_str(json).unwrap();
        assert_eq!(item.delivery, DeliveryType::YouTube);
        assert_eq!(item.episode_number, 1);
        assert_eq!(item.default_variant().map(|v| v.language.as_str()), Some("pt"));
        assert!(item.variant("en").is_some());
        assert!(item.thumbnail.is_none());
    }

    #[test]
    fn missing_type_and_url_fall_back_to_defaults() {
        let item: VideoItem = serde_json::from_str(r#"{"id": "1", "title": "x"}"#).unwrap();
        assert_eq!(item.delivery, DeliveryType::Direct);
        assert!(!item.has_url());
    }

    #[test]
    fn new_classifies_from_url() {
        let item = VideoItem::new("3", "Intro", "https://vimeo.com/76979871");
        assert_eq!(item.delivery, DeliveryType::Vimeo);
        assert!(item.delivery.is_embedded());

        let item = VideoItem::new("4", "Lab", "https://cdn.example.org/lab.MP4");
        assert_eq!(item.delivery, DeliveryType::DirectFile);
        assert!(!item.delivery.is_embedded());
    }

    #[test]
    fn whitespace_url_counts_as_missing() {
        let item = VideoItem::new("5", "Blank", "   ");
        assert!(!item.has_url());
    }
}
