use serde::Serialize;
use std::time::Duration;

use crate::models::VideoItem;
use crate::player::source::PlaybackSource;

/// Speeds offered by the settings menu.
pub const PLAYBACK_SPEEDS: [f64; 6] = [0.5, 0.75, 1.0, 1.25, 1.5, 2.0];

pub const DEFAULT_QUALITY: &str = "auto";

const VOLUME_STEP: f64 = 0.1;

/// Which surface renders the active item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    Native,
    Embedded,
}

impl BackendKind {
    pub fn for_source(source: &PlaybackSource) -> Option<Self> {
        match source {
            PlaybackSource::Native { .. } => Some(Self::Native),
            PlaybackSource::Embedded { .. } => Some(Self::Embedded),
            PlaybackSource::Unplayable { .. } => None,
        }
    }

    /// Seek, volume, speed and caption controls only exist for native playback.
    pub fn supports_fine_controls(self) -> bool {
        matches!(self, Self::Native)
    }
}

/// Transport state of the active item.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransportState {
    pub is_playing: bool,
    pub is_muted: bool,
    /// 0.0 - 1.0, kept while muted
    pub volume: f64,
    pub current_time: Duration,
    /// Known once metadata loaded
    pub duration: Option<Duration>,
    pub is_fullscreen: bool,
    pub playback_speed: f64,
    pub quality: String,
    /// Selected caption language, `None` when captions are off
    pub caption: Option<String>,
}

impl TransportState {
    pub fn new(autoplay: bool) -> Self {
        Self {
            is_playing: autoplay,
            is_muted: false,
            volume: 1.0,
            current_time: Duration::ZERO,
            duration: None,
            is_fullscreen: false,
            playback_speed: 1.0,
            quality: DEFAULT_QUALITY.to_string(),
            caption: None,
        }
    }

    /// Per-item fields go back to their defaults; volume, mute, speed,
    /// quality and fullscreen carry over between items.
    pub fn reset_for_item(&mut self, item: &VideoItem, autoplay: bool) {
        self.is_playing = autoplay;
        self.current_time = Duration::ZERO;
        self.duration = None;
        self.caption = item.default_variant().map(|v| v.language.clone());
    }

    pub fn set_volume(&mut self, volume: f64) -> f64 {
        self.volume = if volume.is_finite() {
            volume.clamp(0.0, 1.0)
        } else {
            self.volume
        };
        self.volume
    }

    /// Increase volume by 10%, capped at 100%
    pub fn volume_up(&mut self) -> f64 {
        self.volume = (self.volume + VOLUME_STEP).min(1.0);
        self.volume
    }

    /// Decrease volume by 10%, floored at 0%
    pub fn volume_down(&mut self) -> f64 {
        self.volume = (self.volume - VOLUME_STEP).max(0.0);
        self.volume
    }

    /// Clamp a target into `[0, duration]`. Without a known duration only
    /// the lower bound applies.
    pub fn clamp_position(&self, position: Duration) -> Duration {
        match self.duration {
            Some(duration) => position.min(duration),
            None => position,
        }
    }

    /// Position moved by `offset_secs`, clamped into the playable range.
    pub fn offset_position(&self, offset_secs: f64) -> Duration {
        let target = self.current_time.as_secs_f64() + offset_secs;
        self.clamp_position(crate::utils::duration_from_secs(target))
    }

    pub fn is_supported_speed(speed: f64) -> bool {
        PLAYBACK_SPEEDS.iter().any(|s| (s - speed).abs() < f64::EPSILON)
    }
}

impl Default for TransportState {
    fn default() -> Self {
        Self::new(true)
    }
}
