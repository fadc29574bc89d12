use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::fmt;
use tracing::{debug, warn};

use crate::models::{DeliveryType, VideoItem};

const YOUTUBE_TOKENS: &[&str] = &["youtube.com", "youtu.be"];
const VIMEO_TOKENS: &[&str] = &["vimeo.com"];
const DIRECT_FILE_EXTENSIONS: &[&str] = &[".mp4", ".webm", ".ogg", ".ogv", ".mov", ".m4v", ".mkv", ".m3u8"];
const CDN_TOKENS: &[&str] = &["cloudfront.net"];

// watch?v=ID (v may follow other query params), youtu.be/ID, embed/ID
static YOUTUBE_ID: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i:youtube\.com/watch\?(?:[^#]*&)?v=|youtu\.be/|youtube\.com/embed/)([^&\n?#/]+)")
        .expect("youtube id pattern")
});

static VIMEO_ID: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i:vimeo\.com/)(?:video/)?(\d+)").expect("vimeo id pattern"));

/// Why an item cannot be handed to the transport layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum UnplayableReason {
    /// The item carried no URL at all
    MissingUrl,
    /// An embeddable-host URL whose video id could not be extracted
    UnrecognizedEmbed,
    /// The transport never signalled ready within the loading timeout
    LoadTimedOut,
}

impl fmt::Display for UnplayableReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingUrl => write!(f, "Video URL is not available."),
            Self::UnrecognizedEmbed => write!(f, "Video address could not be recognized."),
            Self::LoadTimedOut => write!(f, "Video took too long to load."),
        }
    }
}

/// What the controller should do with the active item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum PlaybackSource {
    /// Stream through the native media element
    Native { url: String },
    /// Show through an opaque embed frame
    Embedded { url: String, host: DeliveryType },
    Unplayable { reason: UnplayableReason },
}

impl PlaybackSource {
    pub fn address(&self) -> Option<&str> {
        match self {
            Self::Native { url } | Self::Embedded { url, .. } => Some(url),
            Self::Unplayable { .. } => None,
        }
    }
}

/// Pure functions mapping catalog URLs onto playable addresses
pub struct SourceResolver;

impl SourceResolver {
    /// Classify a raw URL. First match wins: YouTube, Vimeo, known direct
    /// file, then anything else as an unclassified direct address.
    pub fn classify(url: &str) -> DeliveryType {
        let lower = url.trim().to_lowercase();

        if YOUTUBE_TOKENS.iter().any(|t| lower.contains(t)) {
            DeliveryType::YouTube
        } else if VIMEO_TOKENS.iter().any(|t| lower.contains(t)) {
            DeliveryType::Vimeo
        } else if Self::has_direct_file_extension(&lower) || CDN_TOKENS.iter().any(|t| lower.contains(t)) {
            DeliveryType::DirectFile
        } else {
            DeliveryType::Direct
        }
    }

    fn has_direct_file_extension(lower_url: &str) -> bool {
        let path = lower_url.split(['?', '#']).next().unwrap_or_default();
        DIRECT_FILE_EXTENSIONS.iter().any(|ext| path.ends_with(ext))
    }

    pub fn youtube_id(url: &str) -> Option<&str> {
        YOUTUBE_ID
            .captures(url)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str())
            .filter(|id| !id.is_empty())
    }

    pub fn vimeo_id(url: &str) -> Option<&str> {
        VIMEO_ID.captures(url).and_then(|c| c.get(1)).map(|m| m.as_str())
    }

    /// Address to hand to the platform for this item. Empty when the item
    /// has no URL or its host id cannot be extracted.
    pub fn to_embeddable(item: &VideoItem, autoplay: bool) -> String {
        let url = item.url.trim();
        if url.is_empty() {
            return String::new();
        }

        let autoplay_flag = if autoplay { 1 } else { 0 };
        match item.delivery {
            DeliveryType::YouTube => match Self::youtube_id(url) {
                Some(id) => format!(
                    "https://www.youtube.com/embed/{}?autoplay={}&rel=0&modestbranding=1&playsinline=1",
                    id, autoplay_flag
                ),
                None => {
                    warn!(url, "Could not extract YouTube id");
                    String::new()
                }
            },
            DeliveryType::Vimeo => match Self::vimeo_id(url) {
                Some(id) => format!("https://player.vimeo.com/video/{}?autoplay={}", id, autoplay_flag),
                None => {
                    warn!(url, "Could not extract Vimeo id");
                    String::new()
                }
            },
            DeliveryType::DirectFile | DeliveryType::Direct => url.to_string(),
        }
    }

    /// Resolve an item into the source the controller will play.
    pub fn resolve(item: &VideoItem, autoplay: bool) -> PlaybackSource {
        if !item.has_url() {
            debug!(video_id = %item.id, "Item has no URL");
            return PlaybackSource::Unplayable {
                reason: UnplayableReason::MissingUrl,
            };
        }

        let address = Self::to_embeddable(item, autoplay);
        if address.is_empty() {
            return PlaybackSource::Unplayable {
                reason: UnplayableReason::UnrecognizedEmbed,
            };
        }

        if item.delivery.is_embedded() {
            PlaybackSource::Embedded {
                url: address,
                host: item.delivery,
            }
        } else {
            PlaybackSource::Native { url: address }
        }
    }

    /// Thumbnail to show for the item, falling back to the YouTube still
    /// when the catalog did not provide one.
    pub fn thumbnail_for(item: &VideoItem) -> Option<String> {
        if let Some(thumbnail) = item.thumbnail.as_deref().map(str::trim)
            && !thumbnail.is_empty()
        {
            return Some(thumbnail.to_string());
        }

        if item.delivery == DeliveryType::YouTube {
            return Self::youtube_id(&item.url)
                .map(|id| format!("https://img.youtube.com/vi/{}/maxresdefault.jpg", id));
        }

        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_by_first_matching_token() {
        assert_eq!(SourceResolver::classify("https://www.youtube.com/watch?v=dQw4w9WgXcQ"), DeliveryType::YouTube);
        assert_eq!(SourceResolver::classify("https://YOUTU.BE/dQw4w9WgXcQ"), DeliveryType::YouTube);
        assert_eq!(SourceResolver::classify("https://vimeo.com/76979871"), DeliveryType::Vimeo);
        assert_eq!(SourceResolver::classify("https://files.example.com/a/b/lesson.webm?sig=1"), DeliveryType::DirectFile);
        assert_eq!(SourceResolver::classify("https://d1abc.cloudfront.net/upload/42"), DeliveryType::DirectFile);
        assert_eq!(SourceResolver::classify("https://stream.example.com/live"), DeliveryType::Direct);
        assert_eq!(SourceResolver::classify(""), DeliveryType::Direct);
    }

    #[test]
    fn youtube_token_wins_over_extension() {
        assert_eq!(SourceResolver::classify("https://youtube.com/watch?v=abc&f=clip.mp4"), DeliveryType::YouTube);
    }

    #[test]
    fn extension_in_query_is_not_a_file() {
        assert_eq!(SourceResolver::classify("https://example.com/play?file=clip.mp4"), DeliveryType::Direct);
    }

    #[test]
    fn extracts_youtube_ids_from_all_shapes() {
        for url in [
            "https://www.youtube.com/watch?v=dQw4w9WgXcQ",
            "https://www.youtube.com/watch?v=dQw4w9WgXcQ&t=42",
            "https://www.youtube.com/watch?feature=share&v=dQw4w9WgXcQ",
            "https://youtu.be/dQw4w9WgXcQ?si=xyz",
            "https://www.youtube.com/embed/dQw4w9WgXcQ",
        ] {
            assert_eq!(SourceResolver::youtube_id(url), Some("dQw4w9WgXcQ"), "{}", url);
        }
        assert_eq!(SourceResolver::youtube_id("https://www.youtube.com/channel/xyz"), None);
    }

    #[test]
    fn builds_youtube_embed_with_autoplay_flag() {
        let item = VideoItem::new("1", "t", "https://youtu.be/abc123");
        assert_eq!(
            SourceResolver::to_embeddable(&item, true),
            "https://www.youtube.com/embed/abc123?autoplay=1&rel=0&modestbranding=1&playsinline=1"
        );
        assert!(SourceResolver::to_embeddable(&item, false).contains("autoplay=0"));
    }

    #[test]
    fn builds_vimeo_player_url() {
        let item = VideoItem::new("1", "t", "https://vimeo.com/76979871");
        assert_eq!(
            SourceResolver::to_embeddable(&item, false),
            "https://player.vimeo.com/video/76979871?autoplay=0"
        );
        let item = VideoItem::new("1", "t", "https://player.vimeo.com/video/555?h=1");
        assert_eq!(SourceResolver::vimeo_id(&item.url), Some("555"));
    }

    #[test]
    fn unextractable_id_is_unplayable() {
        let item = VideoItem::new("1", "t", "https://vimeo.com/channels/staffpicks");
        assert_eq!(SourceResolver::to_embeddable(&item, true), "");
        assert_eq!(
            SourceResolver::resolve(&item, true),
            PlaybackSource::Unplayable {
                reason: UnplayableReason::UnrecognizedEmbed
            }
        );
    }

    #[test]
    fn missing_url_is_unplayable() {
        let item = VideoItem::new("1", "t", "").with_delivery(DeliveryType::DirectFile);
        let source = SourceResolver::resolve(&item, true);
        assert_eq!(
            source,
            PlaybackSource::Unplayable {
                reason: UnplayableReason::MissingUrl
            }
        );
        assert_eq!(source.address(), None);
    }

    #[test]
    fn direct_items_resolve_to_native() {
        let item = VideoItem::new("1", "t", "  https://cdn.test/a.mp4 ");
        assert_eq!(
            SourceResolver::resolve(&item, true),
            PlaybackSource::Native {
                url: "https://cdn.test/a.mp4".to_string()
            }
        );
        let item = VideoItem::new("2", "t", "https://stream.test/live");
        assert!(matches!(SourceResolver::resolve(&item, true), PlaybackSource::Native { .. }));
    }

    #[test]
    fn thumbnail_falls_back_to_youtube_still() {
        let item = VideoItem::new("1", "t", "https://youtu.be/abc123");
        assert_eq!(
            SourceResolver::thumbnail_for(&item).as_deref(),
            Some("https://img.youtube.com/vi/abc123/maxresdefault.jpg")
        );

        let item = VideoItem::new("1", "t", "https://youtu.be/abc123").with_thumbnail("https://img.test/t.jpg");
        assert_eq!(SourceResolver::thumbnail_for(&item).as_deref(), Some("https://img.test/t.jpg"));

        let item = VideoItem::new("1", "t", "https://cdn.test/a.mp4").with_thumbnail("  ");
        assert_eq!(SourceResolver::thumbnail_for(&item), None);
    }
}
