use anyhow::{Result, anyhow};
use async_trait::async_trait;
use portal_player::models::{ProgressReport, ProgressStatus};
use portal_player::player::{EmbedFrame, FullscreenPlatform, MediaTransport};
use portal_player::services::ProgressService;
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq)]
pub enum TransportCall {
    Load { url: String, autoplay: bool },
    Unload,
    Play,
    Pause,
    Seek(Duration),
    SetVolume(f64),
    SetMuted(bool),
    SetPlaybackSpeed(f64),
    SetCaption(Option<String>),
}

/// Records every call the player makes on the native element.
#[derive(Default)]
pub struct MockTransport {
    calls: Mutex<Vec<TransportCall>>,
    failing: AtomicBool,
    panic_on_seek: AtomicBool,
}

impl MockTransport {
    pub fn calls(&self) -> Vec<TransportCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn loads(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                TransportCall::Load { url, .. } => Some(url),
                _ => None,
            })
            .collect()
    }

    pub fn seeks(&self) -> Vec<Duration> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                TransportCall::Seek(position) => Some(position),
                _ => None,
            })
            .collect()
    }

    pub fn count(&self, call: &TransportCall) -> usize {
        self.calls().iter().filter(|c| *c == call).count()
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Simulate a platform binding that crashes mid-call.
    pub fn set_panic_on_seek(&self, panic: bool) {
        self.panic_on_seek.store(panic, Ordering::SeqCst);
    }

    fn record(&self, call: TransportCall) -> Result<()> {
        self.calls.lock().unwrap().push(call);
        if self.failing.load(Ordering::SeqCst) {
            return Err(anyhow!("transport failure"));
        }
        Ok(())
    }
}

#[async_trait]
impl MediaTransport for MockTransport {
    async fn load(&self, url: &str, autoplay: bool) -> Result<()> {
        self.record(TransportCall::Load {
            url: url.to_string(),
            autoplay,
        })
    }

    async fn unload(&self) -> Result<()> {
        self.record(TransportCall::Unload)
    }

    async fn play(&self) -> Result<()> {
        self.record(TransportCall::Play)
    }

    async fn pause(&self) -> Result<()> {
        self.record(TransportCall::Pause)
    }

    async fn seek(&self, position: Duration) -> Result<()> {
        if self.panic_on_seek.load(Ordering::SeqCst) {
            panic!("media element crashed while seeking");
        }
        self.record(TransportCall::Seek(position))
    }

    async fn set_volume(&self, volume: f64) -> Result<()> {
        self.record(TransportCall::SetVolume(volume))
    }

    async fn set_muted(&self, muted: bool) -> Result<()> {
        self.record(TransportCall::SetMuted(muted))
    }

    async fn set_playback_speed(&self, speed: f64) -> Result<()> {
        self.record(TransportCall::SetPlaybackSpeed(speed))
    }

    async fn set_caption_track(&self, language: Option<&str>) -> Result<()> {
        self.record(TransportCall::SetCaption(language.map(str::to_string)))
    }
}

#[derive(Default)]
pub struct MockEmbed {
    shown: Mutex<Vec<(String, String)>>,
    cleared: AtomicUsize,
}

impl MockEmbed {
    pub fn shown(&self) -> Vec<(String, String)> {
        self.shown.lock().unwrap().clone()
    }

    pub fn cleared(&self) -> usize {
        self.cleared.load(Ordering::SeqCst)
    }
}

impl EmbedFrame for MockEmbed {
    fn show(&self, address: &str, title: &str) {
        self.shown
            .lock()
            .unwrap()
            .push((address.to_string(), title.to_string()));
    }

    fn clear(&self) {
        self.cleared.fetch_add(1, Ordering::SeqCst);
    }
}

#[derive(Default)]
pub struct MockFullscreen {
    requests: AtomicUsize,
    exits: AtomicUsize,
    failing: AtomicBool,
}

impl MockFullscreen {
    pub fn requests(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }

    pub fn exits(&self) -> usize {
        self.exits.load(Ordering::SeqCst)
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

#[async_trait]
impl FullscreenPlatform for MockFullscreen {
    async fn request_fullscreen(&self) -> Result<()> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            return Err(anyhow!("fullscreen denied"));
        }
        Ok(())
    }

    async fn exit_fullscreen(&self) -> Result<()> {
        self.exits.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ProgressCall {
    StartSession {
        video_id: i64,
        collection_id: Option<i64>,
    },
    GetStatus {
        video_id: i64,
        collection_id: Option<i64>,
    },
    Report(ProgressReport),
}

/// In-memory progress backend. Calls are recorded even while failing.
#[derive(Default)]
pub struct MockProgressService {
    calls: Mutex<Vec<ProgressCall>>,
    statuses: Mutex<HashMap<i64, ProgressStatus>>,
    status_delay: Option<Duration>,
    failing: AtomicBool,
}

impl MockProgressService {
    pub fn with_status(self, video_id: i64, current_play_time: f64, completion_percentage: f64) -> Self {
        self.statuses.lock().unwrap().insert(
            video_id,
            ProgressStatus {
                current_play_time,
                completion_percentage,
            },
        );
        self
    }

    /// Answer status lookups only after `delay`, like a slow backend.
    pub fn with_status_delay(mut self, delay: Duration) -> Self {
        self.status_delay = Some(delay);
        self
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn calls(&self) -> Vec<ProgressCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn reports(&self) -> Vec<ProgressReport> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                ProgressCall::Report(report) => Some(report),
                _ => None,
            })
            .collect()
    }

    pub fn sessions(&self) -> Vec<i64> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                ProgressCall::StartSession { video_id, .. } => Some(video_id),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: ProgressCall) -> Result<()> {
        self.calls.lock().unwrap().push(call);
        if self.failing.load(Ordering::SeqCst) {
            return Err(anyhow!("progress service unavailable"));
        }
        Ok(())
    }
}

#[async_trait]
impl ProgressService for MockProgressService {
    async fn start_session(&self, video_id: i64, collection_id: Option<i64>) -> Result<()> {
        self.record(ProgressCall::StartSession {
            video_id,
            collection_id,
        })
    }

    async fn report_progress(&self, report: &ProgressReport) -> Result<()> {
        self.record(ProgressCall::Report(report.clone()))
    }

    async fn get_status(&self, video_id: i64, collection_id: Option<i64>) -> Result<Option<ProgressStatus>> {
        self.record(ProgressCall::GetStatus {
            video_id,
            collection_id,
        })?;
        if let Some(delay) = self.status_delay {
            tokio::time::sleep(delay).await;
        }
        Ok(self.statuses.lock().unwrap().get(&video_id).copied())
    }
}
