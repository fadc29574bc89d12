use anyhow::Result;
use async_trait::async_trait;
use std::time::Duration;

/// Native media element for direct-file content.
///
/// Calls return once the platform accepted the request; the resulting state
/// changes arrive separately as [`TransportEvent`](super::TransportEvent)s.
#[async_trait]
pub trait MediaTransport: Send + Sync {
    async fn load(&self, url: &str, autoplay: bool) -> Result<()>;
    async fn unload(&self) -> Result<()>;
    async fn play(&self) -> Result<()>;
    async fn pause(&self) -> Result<()>;
    async fn seek(&self, position: Duration) -> Result<()>;
    async fn set_volume(&self, volume: f64) -> Result<()>;
    async fn set_muted(&self, muted: bool) -> Result<()>;
    async fn set_playback_speed(&self, speed: f64) -> Result<()>;
    /// Select a caption track by language, or turn captions off
    async fn set_caption_track(&self, language: Option<&str>) -> Result<()>;
}

/// Opaque third-party frame for embeddable hosts. Beyond the initial
/// address the player has no control over it.
pub trait EmbedFrame: Send + Sync {
    fn show(&self, address: &str, title: &str);
    fn clear(&self);
}

#[async_trait]
pub trait FullscreenPlatform: Send + Sync {
    /// Ask the platform for fullscreen. The player only flips its own flag
    /// when the platform acknowledges the change.
    async fn request_fullscreen(&self) -> Result<()>;
    async fn exit_fullscreen(&self) -> Result<()>;
}
