use serde::Serialize;
use tokio::sync::broadcast;

use super::chrome::ChromeState;
use super::controller::CloseReason;
use super::source::UnplayableReason;
use super::transport::{BackendKind, TransportState};
use crate::models::VideoId;

pub const EVENT_CHANNEL_CAPACITY: usize = 64;

/// State changes a renderer redraws from.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum PlayerEvent {
    ItemChanged {
        index: usize,
        video_id: VideoId,
        title: String,
        /// `None` when the item cannot be played
        backend: Option<BackendKind>,
        /// "Collection - Episode i of n"
        position_label: String,
        has_previous: bool,
        has_next: bool,
    },
    LoadingChanged {
        loading: bool,
    },
    TransportChanged(TransportState),
    ChromeChanged(ChromeState),
    NoticeShown {
        message: String,
    },
    NoticeCleared,
    Unplayable {
        reason: UnplayableReason,
        message: String,
    },
    Closed {
        reason: CloseReason,
    },
}

pub fn channel() -> (broadcast::Sender<PlayerEvent>, broadcast::Receiver<PlayerEvent>) {
    broadcast::channel(EVENT_CHANNEL_CAPACITY)
}
