use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Stored viewing state for one (user, video, collection) triple, as kept by
/// the portal's viewing-status service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressRecord {
    pub video_id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tv_show_id: Option<i64>,
    #[serde(default)]
    pub current_play_time: f64,
    #[serde(default)]
    pub total_duration: Option<f64>,
    #[serde(default)]
    pub completion_percentage: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quality: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub playback_speed: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_watched_at: Option<DateTime<Utc>>,
}

/// The part of a record the player reads back at video start.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressStatus {
    /// Seconds into the video
    pub current_play_time: f64,
    pub completion_percentage: f64,
}

impl From<&ProgressRecord> for ProgressStatus {
    fn from(record: &ProgressRecord) -> Self {
        Self {
            current_play_time: record.current_play_time,
            completion_percentage: record.completion_percentage,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentType {
    Video,
    TvShow,
}

/// One progress push to the persistence service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressReport {
    pub video_id: i64,
    /// Whole seconds
    pub current_play_time: u64,
    /// Whole seconds
    pub total_duration: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tv_show_id: Option<i64>,
    pub content_type: ContentType,
    pub content_id: i64,
    pub quality: String,
    pub playback_speed: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtitle_language: Option<String>,
}

impl ProgressReport {
    pub fn completion_percentage(&self) -> f64 {
        if self.total_duration > 0 {
            self.current_play_time as f64 / self.total_duration as f64 * 100.0
        } else {
            0.0
        }
    }
}
