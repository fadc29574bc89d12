use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, error, info, trace, warn};

use super::chrome::{ChromeMachine, ChromeState, Viewport};
use super::events::{self, PlayerEvent};
use super::keyboard::{KeyInput, Shortcut};
use super::layout::{LayoutHost, LayoutTakeover};
use super::source::{PlaybackSource, SourceResolver, UnplayableReason};
use super::tracker::{ProgressTracker, ResumeDecision, TrackerReply, TrackerSettings, TrackerWorker};
use super::traits::{EmbedFrame, FullscreenPlatform, MediaTransport};
use super::transport::{BackendKind, TransportState};
use crate::models::{Playlist, VideoItem};
use crate::services::{CurrentUser, ProgressService};
use crate::utils::{PlayerError, PlayerResult};

/// Why the player went away.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CloseReason {
    /// Close button, Escape outside fullscreen, or an explicit close call
    Requested,
    /// Every handle was dropped while the player was still mounted
    Detached,
    /// The actor stopped without reaching its cleanup path
    Failed,
}

pub type CloseCallback = Box<dyn FnOnce(CloseReason) + Send + 'static>;

/// What the host page hands to a new player.
pub struct PlayerProps {
    pub items: Vec<VideoItem>,
    pub start_index: usize,
    pub collection_name: Option<String>,
    pub collection_id: Option<i64>,
    pub autoplay: bool,
    on_close: CloseCallback,
}

impl PlayerProps {
    pub fn new(items: Vec<VideoItem>, on_close: impl FnOnce(CloseReason) + Send + 'static) -> Self {
        Self {
            items,
            start_index: 0,
            collection_name: None,
            collection_id: None,
            autoplay: true,
            on_close: Box::new(on_close),
        }
    }

    pub fn with_start_index(mut self, start_index: usize) -> Self {
        self.start_index = start_index;
        self
    }

    pub fn with_collection(mut self, name: impl Into<String>, id: Option<i64>) -> Self {
        self.collection_name = Some(name.into());
        self.collection_id = id;
        self
    }

    pub fn with_autoplay(mut self, autoplay: bool) -> Self {
        self.autoplay = autoplay;
        self
    }
}

impl std::fmt::Debug for PlayerProps {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlayerProps")
            .field("items", &self.items.len())
            .field("start_index", &self.start_index)
            .field("collection_name", &self.collection_name)
            .field("collection_id", &self.collection_id)
            .field("autoplay", &self.autoplay)
            .finish()
    }
}

/// Platform and service seams the player drives.
#[derive(Clone)]
pub struct PlayerCollaborators {
    pub transport: Arc<dyn MediaTransport>,
    pub embed: Arc<dyn EmbedFrame>,
    pub fullscreen: Arc<dyn FullscreenPlatform>,
    pub layout: Arc<dyn LayoutHost>,
    pub user: Arc<dyn CurrentUser>,
    pub progress: Arc<dyn ProgressService>,
}

#[derive(Debug, Clone)]
pub struct PlayerTimings {
    pub controls_hide_delay: Duration,
    pub resume_notice_duration: Duration,
    /// How long an item may stay loading before it is declared unplayable
    pub loading_timeout: Duration,
    pub tracker: TrackerSettings,
}

impl Default for PlayerTimings {
    fn default() -> Self {
        Self {
            controls_hide_delay: Duration::from_secs(3),
            resume_notice_duration: Duration::from_secs(3),
            loading_timeout: Duration::from_secs(30),
            tracker: TrackerSettings::default(),
        }
    }
}

/// Signals coming back from the native element, the embed frame or the
/// fullscreen platform.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TransportEvent {
    MetadataLoaded(Duration),
    Ready,
    TimeUpdate(Duration),
    Playing,
    Paused,
    Ended,
    FullscreenChanged(bool),
}

/// Commands that can be sent to the player controller
#[derive(Debug)]
pub enum PlayerCommand {
    TogglePlayPause,
    ToggleMute,
    SetVolume(f64),
    VolumeUp,
    VolumeDown,
    Seek(Duration),
    /// Seek by a signed number of seconds
    SeekRelative(f64),
    SetPlaybackSpeed {
        speed: f64,
        respond_to: oneshot::Sender<PlayerResult<()>>,
    },
    SetQuality(String),
    /// Caption language, `None` turns captions off
    SetCaption(Option<String>),
    ToggleFullscreen,
    Select(usize),
    Next,
    Previous,
    PointerMoved,
    ToggleCinema,
    ToggleSidebars,
    ToggleBottomBar,
    Viewport(Viewport),
    Key(KeyInput),
    Escape,
    Close,
    Transport(TransportEvent),
    GetSnapshot {
        respond_to: oneshot::Sender<PlayerSnapshot>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "view", content = "reason", rename_all = "snake_case")]
pub enum PlayerView {
    Loading,
    Ready,
    /// Full-screen failure view; only closing is possible
    Unplayable(UnplayableReason),
}

/// Everything a renderer needs to draw the player at one instant.
#[derive(Debug, Clone, Serialize)]
pub struct PlayerSnapshot {
    pub index: usize,
    pub item: VideoItem,
    pub view: PlayerView,
    pub backend: Option<BackendKind>,
    pub address: Option<String>,
    pub thumbnail: Option<String>,
    pub transport: TransportState,
    pub chrome: ChromeState,
    pub notice: Option<String>,
    pub position_label: String,
    pub has_previous: bool,
    pub has_next: bool,
    pub tracking: bool,
}

/// Why the actor woke up.
enum Wake {
    Command(PlayerCommand),
    Detached,
    Status(TrackerReply),
    ProgressTick,
    HideControls,
    NoticeExpired,
    LoadTimeout,
}

/// Actor owning every piece of player state. Spawn [`PlayerController::run`]
/// and talk to it through the [`PlayerHandle`].
pub struct PlayerController {
    receiver: mpsc::UnboundedReceiver<PlayerCommand>,
    events: broadcast::Sender<PlayerEvent>,
    collaborators: PlayerCollaborators,
    timings: PlayerTimings,
    on_close: Option<CloseCallback>,

    playlist: Playlist,
    collection_id: Option<i64>,
    autoplay: bool,

    source: PlaybackSource,
    backend: Option<BackendKind>,
    view: PlayerView,
    transport_state: TransportState,
    chrome: ChromeMachine,

    tracker: ProgressTracker,
    tracker_worker: Option<TrackerWorker>,
    worker_task: Option<JoinHandle<()>>,
    replies: mpsc::UnboundedReceiver<TrackerReply>,
    pending_resume: Option<Duration>,
    /// Set once the viewer seeks; a late resume point must not override it
    position_chosen: bool,

    notice: Option<String>,
    notice_deadline: Option<Instant>,
    loading_deadline: Option<Instant>,
    takeover: Option<LayoutTakeover>,
}

impl PlayerController {
    /// Build a player for the given props. Fails only on an empty playlist.
    pub fn new(
        props: PlayerProps,
        collaborators: PlayerCollaborators,
        timings: PlayerTimings,
    ) -> PlayerResult<(PlayerHandle, PlayerController)> {
        let PlayerProps {
            items,
            start_index,
            collection_name,
            collection_id,
            autoplay,
            on_close,
        } = props;

        let playlist = Playlist::new(items, start_index, collection_name)?;
        let (sender, receiver) = mpsc::unbounded_channel();
        let (events, _) = events::channel();
        let (replies_tx, replies) = mpsc::unbounded_channel();
        let (tracker, worker) =
            ProgressTracker::new(collaborators.progress.clone(), timings.tracker.clone(), replies_tx);
        let chrome = ChromeMachine::new(timings.controls_hide_delay, playlist.is_single_item());

        let controller = PlayerController {
            receiver,
            events: events.clone(),
            collaborators,
            timings,
            on_close: Some(on_close),
            playlist,
            collection_id,
            autoplay,
            source: PlaybackSource::Unplayable {
                reason: UnplayableReason::MissingUrl,
            },
            backend: None,
            view: PlayerView::Loading,
            transport_state: TransportState::new(autoplay),
            chrome,
            tracker,
            tracker_worker: Some(worker),
            worker_task: None,
            replies,
            pending_resume: None,
            position_chosen: false,
            notice: None,
            notice_deadline: None,
            loading_deadline: None,
            takeover: None,
        };
        let handle = PlayerHandle { sender, events };

        Ok((handle, controller))
    }

    /// Run the controller event loop until the player closes
    pub async fn run(mut self) {
        debug!("PlayerController event loop started");
        self.mount().await;

        let reason = loop {
            let wake = tokio::select! {
                command = self.receiver.recv() => match command {
                    Some(command) => Wake::Command(command),
                    None => Wake::Detached,
                },
                Some(reply) = self.replies.recv() => Wake::Status(reply),
                _ = self.tracker.tick() => Wake::ProgressTick,
                _ = sleep_until_opt(self.chrome.hide_deadline()) => Wake::HideControls,
                _ = sleep_until_opt(self.notice_deadline) => Wake::NoticeExpired,
                _ = sleep_until_opt(self.loading_deadline) => Wake::LoadTimeout,
            };

            if let Some(reason) = self.handle_wake(wake).await {
                break reason;
            }
        };

        self.teardown(reason).await;
        debug!("PlayerController event loop stopped");
    }

    async fn mount(&mut self) {
        let now = Instant::now();
        self.takeover = Some(LayoutTakeover::acquire(self.collaborators.layout.clone()));
        if let Some(worker) = self.tracker_worker.take() {
            self.worker_task = Some(tokio::spawn(worker.run()));
        }

        info!(
            items = self.playlist.len(),
            start = self.playlist.current_index(),
            collection = ?self.playlist.collection_name(),
            "Player mounted"
        );

        self.chrome.mount(now);
        self.emit_chrome();
        self.load_current(now).await;
    }

    async fn handle_wake(&mut self, wake: Wake) -> Option<CloseReason> {
        let now = Instant::now();
        match wake {
            Wake::Command(command) => return self.handle_command(command, now).await,
            Wake::Detached => {
                info!("All player handles dropped, closing");
                return Some(CloseReason::Detached);
            }
            Wake::Status(reply) => self.handle_status(reply).await,
            Wake::ProgressTick => {
                if self.backend == Some(BackendKind::Native) {
                    self.tracker.report(now, &self.transport_state, false);
                }
            }
            Wake::HideControls => {
                if self.chrome.hide_expired(now) {
                    self.emit_chrome();
                }
            }
            Wake::NoticeExpired => self.clear_notice(),
            Wake::LoadTimeout => {
                self.loading_deadline = None;
                if self.view == PlayerView::Loading {
                    warn!(
                        video_id = %self.playlist.current().id,
                        timeout = ?self.timings.loading_timeout,
                        "Item never became ready"
                    );
                    self.unload_surface().await;
                    self.mark_unplayable(UnplayableReason::LoadTimedOut);
                }
            }
        }
        None
    }

    async fn handle_command(&mut self, command: PlayerCommand, now: Instant) -> Option<CloseReason> {
        let command = match command {
            PlayerCommand::Key(input) => match Self::shortcut_command(&input) {
                Some(command) => command,
                None => {
                    trace!(?input, "Key not bound");
                    return None;
                }
            },
            command => command,
        };

        if matches!(self.view, PlayerView::Unplayable(_)) && !Self::allowed_while_unplayable(&command) {
            debug!(?command, "Ignoring command on unplayable item");
            if let PlayerCommand::SetPlaybackSpeed { respond_to, .. } = command {
                let _ = respond_to.send(Ok(()));
            }
            return None;
        }

        match command {
            PlayerCommand::TogglePlayPause => self.toggle_play_pause(now).await,
            PlayerCommand::ToggleMute => {
                if self.require_native("mute") {
                    self.transport_state.is_muted = !self.transport_state.is_muted;
                    if let Err(e) = self.collaborators.transport.set_muted(self.transport_state.is_muted).await {
                        warn!("Failed to set mute: {}", e);
                    }
                    self.emit_transport();
                }
            }
            PlayerCommand::SetVolume(volume) => {
                if self.require_native("volume") {
                    self.transport_state.set_volume(volume);
                    self.push_volume().await;
                }
            }
            PlayerCommand::VolumeUp => {
                if self.require_native("volume") {
                    self.transport_state.volume_up();
                    self.push_volume().await;
                }
            }
            PlayerCommand::VolumeDown => {
                if self.require_native("volume") {
                    self.transport_state.volume_down();
                    self.push_volume().await;
                }
            }
            PlayerCommand::Seek(position) => self.seek(position, now).await,
            PlayerCommand::SeekRelative(offset) => {
                let target = self.transport_state.offset_position(offset);
                self.seek(target, now).await;
            }
            PlayerCommand::SetPlaybackSpeed { speed, respond_to } => {
                let result = self.set_playback_speed(speed).await;
                let _ = respond_to.send(result);
            }
            PlayerCommand::SetQuality(quality) => {
                if self.require_native("quality") {
                    debug!(%quality, "Quality label selected");
                    self.transport_state.quality = quality;
                    self.emit_transport();
                }
            }
            PlayerCommand::SetCaption(language) => self.set_caption(language).await,
            PlayerCommand::ToggleFullscreen => self.toggle_fullscreen().await,
            PlayerCommand::Select(index) => {
                if self.playlist.select(index) {
                    self.load_current(now).await;
                }
            }
            PlayerCommand::Next => {
                if self.playlist.next() {
                    self.load_current(now).await;
                }
            }
            PlayerCommand::Previous => {
                if self.playlist.previous() {
                    self.load_current(now).await;
                }
            }
            PlayerCommand::PointerMoved => {
                if self.chrome.pointer_moved(now) {
                    self.emit_chrome();
                }
            }
            PlayerCommand::ToggleCinema => {
                self.chrome.toggle_cinema(now);
                self.emit_chrome();
            }
            PlayerCommand::ToggleSidebars => {
                if self.chrome.toggle_sidebars() {
                    self.emit_chrome();
                }
            }
            PlayerCommand::ToggleBottomBar => {
                if self.chrome.toggle_bottom_bar() {
                    self.emit_chrome();
                }
            }
            PlayerCommand::Viewport(viewport) => {
                if self.chrome.apply_viewport(viewport) {
                    self.emit_chrome();
                }
            }
            PlayerCommand::Key(_) => {}
            PlayerCommand::Escape => return self.escape().await,
            PlayerCommand::Close => return Some(CloseReason::Requested),
            PlayerCommand::Transport(event) => self.handle_transport_event(event, now).await,
            PlayerCommand::GetSnapshot { respond_to } => {
                let _ = respond_to.send(self.snapshot());
            }
        }
        None
    }

    fn allowed_while_unplayable(command: &PlayerCommand) -> bool {
        match command {
            PlayerCommand::Close | PlayerCommand::Escape | PlayerCommand::GetSnapshot { .. } => true,
            PlayerCommand::Transport(TransportEvent::FullscreenChanged(_)) => true,
            _ => false,
        }
    }

    fn shortcut_command(input: &KeyInput) -> Option<PlayerCommand> {
        let command = match Shortcut::from_input(input)? {
            Shortcut::Escape => PlayerCommand::Escape,
            Shortcut::ToggleCinema => PlayerCommand::ToggleCinema,
            Shortcut::ToggleSidebars => PlayerCommand::ToggleSidebars,
            Shortcut::ToggleBottomBar => PlayerCommand::ToggleBottomBar,
            Shortcut::TogglePlayPause => PlayerCommand::TogglePlayPause,
            Shortcut::Previous => PlayerCommand::Previous,
            Shortcut::Next => PlayerCommand::Next,
        };
        Some(command)
    }

    async fn escape(&mut self) -> Option<CloseReason> {
        if self.transport_state.is_fullscreen {
            if let Err(e) = self.collaborators.fullscreen.exit_fullscreen().await {
                warn!("Failed to exit fullscreen: {}", e);
            }
            None
        } else {
            Some(CloseReason::Requested)
        }
    }

    /// Switch to the playlist's current item. Every path that changes the
    /// index ends up here.
    async fn load_current(&mut self, now: Instant) {
        self.unload_surface().await;
        self.pending_resume = None;
        self.position_chosen = false;
        self.clear_notice();

        let item = self.playlist.current().clone();
        self.transport_state.reset_for_item(&item, self.autoplay);
        self.source = SourceResolver::resolve(&item, self.autoplay);
        self.backend = BackendKind::for_source(&self.source);

        info!(
            index = self.playlist.current_index(),
            video_id = %item.id,
            delivery = item.delivery.as_str(),
            "Loading item"
        );

        match self.source.clone() {
            PlaybackSource::Native { url } => {
                self.begin_loading(now);
                self.track_item(&item, true, now);
                if let Err(e) = self.collaborators.transport.load(&url, self.autoplay).await {
                    error!(video_id = %item.id, "Failed to load media: {}", e);
                }
                self.apply_preferences().await;
            }
            PlaybackSource::Embedded { url, host } => {
                self.begin_loading(now);
                self.track_item(&item, false, now);
                debug!(host = host.as_str(), %url, "Showing embed frame");
                self.collaborators.embed.show(&url, &item.title);
            }
            PlaybackSource::Unplayable { reason } => {
                self.tracker.end_item();
                self.emit_item_changed(&item);
                self.mark_unplayable(reason);
                return;
            }
        }

        self.emit_item_changed(&item);
        self.emit(PlayerEvent::LoadingChanged { loading: true });
        self.emit_transport();
    }

    fn begin_loading(&mut self, now: Instant) {
        self.view = PlayerView::Loading;
        self.loading_deadline = Some(now + self.timings.loading_timeout);
    }

    fn track_item(&mut self, item: &VideoItem, native: bool, now: Instant) {
        let user = self.collaborators.user.current_user();
        self.tracker
            .begin_item(item, self.collection_id, user.as_ref(), native, now);
    }

    fn mark_unplayable(&mut self, reason: UnplayableReason) {
        warn!(video_id = %self.playlist.current().id, %reason, "Item is unplayable");
        self.tracker.end_item();
        self.loading_deadline = None;
        self.pending_resume = None;
        self.backend = None;
        self.transport_state.is_playing = false;
        self.view = PlayerView::Unplayable(reason.clone());
        self.emit(PlayerEvent::Unplayable {
            message: reason.to_string(),
            reason,
        });
    }

    /// Carry user preferences over to a freshly loaded native element.
    async fn apply_preferences(&mut self) {
        let transport = &self.collaborators.transport;
        let state = &self.transport_state;

        if state.volume < 1.0 {
            if let Err(e) = transport.set_volume(state.volume).await {
                warn!("Failed to restore volume: {}", e);
            }
        }
        if state.is_muted {
            if let Err(e) = transport.set_muted(true).await {
                warn!("Failed to restore mute: {}", e);
            }
        }
        if state.playback_speed != 1.0 {
            if let Err(e) = transport.set_playback_speed(state.playback_speed).await {
                warn!("Failed to restore playback speed: {}", e);
            }
        }
        if let Some(language) = state.caption.as_deref() {
            if let Err(e) = transport.set_caption_track(Some(language)).await {
                warn!(language, "Failed to select default captions: {}", e);
            }
        }
    }

    async fn unload_surface(&mut self) {
        match self.backend.take() {
            Some(BackendKind::Native) => {
                if let Err(e) = self.collaborators.transport.unload().await {
                    warn!("Failed to unload media: {}", e);
                }
            }
            Some(BackendKind::Embedded) => self.collaborators.embed.clear(),
            None => {}
        }
    }

    async fn handle_transport_event(&mut self, event: TransportEvent, now: Instant) {
        trace!(?event, "Transport event");

        if let TransportEvent::FullscreenChanged(fullscreen) = event {
            if self.transport_state.is_fullscreen != fullscreen {
                self.transport_state.is_fullscreen = fullscreen;
                self.emit_transport();
            }
            return;
        }

        let Some(backend) = self.backend else {
            trace!(?event, "No active surface, ignoring transport event");
            return;
        };

        match (event, backend) {
            (TransportEvent::Ready, _) => {
                if self.view == PlayerView::Loading {
                    self.view = PlayerView::Ready;
                    self.loading_deadline = None;
                    self.emit(PlayerEvent::LoadingChanged { loading: false });
                    debug!(video_id = %self.playlist.current().id, "Item ready");
                }
                self.apply_pending_resume().await;
            }
            (TransportEvent::MetadataLoaded(duration), BackendKind::Native) => {
                self.transport_state.duration = Some(duration);
                self.transport_state.current_time = self.transport_state.clamp_position(self.transport_state.current_time);
                self.emit_transport();
                self.apply_pending_resume().await;
            }
            (TransportEvent::TimeUpdate(position), BackendKind::Native) => {
                self.transport_state.current_time = self.transport_state.clamp_position(position);
                self.emit_transport();
            }
            (TransportEvent::Playing, BackendKind::Native) => {
                if !self.transport_state.is_playing {
                    self.transport_state.is_playing = true;
                    self.emit_transport();
                }
            }
            (TransportEvent::Paused, BackendKind::Native) => {
                if self.transport_state.is_playing {
                    self.transport_state.is_playing = false;
                    self.tracker.report(now, &self.transport_state, true);
                    self.emit_transport();
                }
            }
            (TransportEvent::Ended, BackendKind::Native) => {
                debug!(index = self.playlist.current_index(), "Playback ended");
                self.transport_state.is_playing = false;
                if let Some(duration) = self.transport_state.duration {
                    self.transport_state.current_time = duration;
                }
                self.tracker.report(now, &self.transport_state, true);
                self.emit_transport();

                if self.playlist.next() {
                    self.load_current(now).await;
                }
            }
            (event, BackendKind::Embedded) => {
                trace!(?event, "Embedded content reports no transport state");
            }
            (TransportEvent::FullscreenChanged(_), _) => {}
        }
    }

    async fn handle_status(&mut self, reply: TrackerReply) {
        if !self.tracker.accepts(&reply) {
            debug!(generation = reply.generation, "Dropping stale progress status");
            return;
        }

        match self.tracker.resume_decision(reply.status.as_ref()) {
            ResumeDecision::StartOver => {
                debug!(video_id = %self.playlist.current().id, "Starting from the beginning");
            }
            ResumeDecision::ResumeAt(_) if self.position_chosen => {
                debug!(video_id = %self.playlist.current().id, "Viewer already seeked, ignoring stored position");
            }
            ResumeDecision::ResumeAt(position) => {
                self.pending_resume = Some(position);
                if self.view == PlayerView::Ready || self.transport_state.duration.is_some() {
                    self.apply_pending_resume().await;
                }
            }
        }
    }

    async fn apply_pending_resume(&mut self) {
        if self.backend != Some(BackendKind::Native) {
            return;
        }
        let Some(position) = self.pending_resume.take() else {
            return;
        };

        let target = self.transport_state.clamp_position(position);
        info!(video_id = %self.playlist.current().id, ?target, "Resuming playback");
        if let Err(e) = self.collaborators.transport.seek(target).await {
            warn!("Failed to seek to resume point: {}", e);
            return;
        }
        self.transport_state.current_time = target;
        self.emit_transport();

        if let Some(message) = ResumeDecision::ResumeAt(target).notice() {
            self.show_notice(message);
        }
    }

    async fn toggle_play_pause(&mut self, now: Instant) {
        if !self.require_native("play/pause") {
            return;
        }

        let transport = self.collaborators.transport.clone();
        if self.transport_state.is_playing {
            self.transport_state.is_playing = false;
            match transport.pause().await {
                Ok(()) => {
                    self.tracker.report(now, &self.transport_state, true);
                }
                Err(e) => {
                    warn!("Failed to pause: {}", e);
                    self.transport_state.is_playing = true;
                }
            }
        } else {
            self.transport_state.is_playing = true;
            if let Err(e) = transport.play().await {
                warn!("Failed to start playback: {}", e);
                self.transport_state.is_playing = false;
            }
        }
        self.emit_transport();
    }

    async fn seek(&mut self, position: Duration, now: Instant) {
        if !self.require_native("seek") {
            return;
        }

        let target = self.transport_state.clamp_position(position);
        self.position_chosen = true;
        self.pending_resume = None;
        if let Err(e) = self.collaborators.transport.seek(target).await {
            warn!(?target, "Failed to seek: {}", e);
            return;
        }
        self.transport_state.current_time = target;
        self.tracker.report(now, &self.transport_state, true);
        self.emit_transport();
    }

    async fn push_volume(&mut self) {
        if let Err(e) = self.collaborators.transport.set_volume(self.transport_state.volume).await {
            warn!("Failed to set volume: {}", e);
        }
        self.emit_transport();
    }

    async fn set_playback_speed(&mut self, speed: f64) -> PlayerResult<()> {
        if !TransportState::is_supported_speed(speed) {
            return Err(PlayerError::UnsupportedSpeed(speed));
        }
        if !self.require_native("playback speed") {
            return Ok(());
        }

        if let Err(e) = self.collaborators.transport.set_playback_speed(speed).await {
            warn!(speed, "Failed to set playback speed: {}", e);
            return Ok(());
        }
        self.transport_state.playback_speed = speed;
        self.emit_transport();
        Ok(())
    }

    async fn set_caption(&mut self, language: Option<String>) {
        if !self.require_native("captions") {
            return;
        }
        if let Some(lang) = language.as_deref()
            && self.playlist.current().variant(lang).is_none()
        {
            warn!(language = lang, "Unknown caption language");
            return;
        }

        if let Err(e) = self.collaborators.transport.set_caption_track(language.as_deref()).await {
            warn!("Failed to select captions: {}", e);
            return;
        }
        self.transport_state.caption = language;
        self.emit_transport();
    }

    async fn toggle_fullscreen(&mut self) {
        let platform = &self.collaborators.fullscreen;
        let result = if self.transport_state.is_fullscreen {
            platform.exit_fullscreen().await
        } else {
            platform.request_fullscreen().await
        };

        // The flag only moves when the platform acknowledges
        if let Err(e) = result {
            warn!("Fullscreen request failed: {}", e);
        }
    }

    fn require_native(&self, intent: &str) -> bool {
        match self.backend {
            Some(backend) if backend.supports_fine_controls() => true,
            _ => {
                debug!(intent, "Intent unavailable for this item");
                false
            }
        }
    }

    fn show_notice(&mut self, message: String) {
        debug!(%message, "Showing notice");
        self.notice = Some(message.clone());
        self.notice_deadline = Some(Instant::now() + self.timings.resume_notice_duration);
        self.emit(PlayerEvent::NoticeShown { message });
    }

    fn clear_notice(&mut self) {
        self.notice_deadline = None;
        if self.notice.take().is_some() {
            self.emit(PlayerEvent::NoticeCleared);
        }
    }

    /// The single cleanup path for every way the player can close.
    async fn teardown(&mut self, reason: CloseReason) {
        info!(?reason, "Closing player");

        self.chrome.cancel_timer();
        self.notice_deadline = None;
        self.loading_deadline = None;
        self.pending_resume = None;
        self.tracker.shutdown();

        self.unload_surface().await;
        if self.transport_state.is_fullscreen {
            if let Err(e) = self.collaborators.fullscreen.exit_fullscreen().await {
                warn!("Failed to exit fullscreen on close: {}", e);
            }
        }
        if let Some(takeover) = self.takeover.take() {
            takeover.release();
        }

        self.emit(PlayerEvent::Closed { reason });
        if let Some(on_close) = self.on_close.take() {
            on_close(reason);
        }

        // Let already queued progress jobs reach the service
        if let Some(worker) = self.worker_task.take()
            && let Err(e) = worker.await
        {
            error!("Progress worker failed: {}", e);
        }
    }

    fn snapshot(&self) -> PlayerSnapshot {
        let item = self.playlist.current();
        PlayerSnapshot {
            index: self.playlist.current_index(),
            item: item.clone(),
            view: self.view.clone(),
            backend: self.backend,
            address: self.source.address().map(str::to_string),
            thumbnail: SourceResolver::thumbnail_for(item),
            transport: self.transport_state.clone(),
            chrome: self.chrome.state(),
            notice: self.notice.clone(),
            position_label: self.playlist.position_label(),
            has_previous: self.playlist.has_previous(),
            has_next: self.playlist.has_next(),
            tracking: self.tracker.is_tracking(),
        }
    }

    fn emit(&self, event: PlayerEvent) {
        // No subscribers is fine
        let _ = self.events.send(event);
    }

    fn emit_transport(&self) {
        self.emit(PlayerEvent::TransportChanged(self.transport_state.clone()));
    }

    fn emit_chrome(&self) {
        self.emit(PlayerEvent::ChromeChanged(self.chrome.state()));
    }

    fn emit_item_changed(&self, item: &VideoItem) {
        self.emit(PlayerEvent::ItemChanged {
            index: self.playlist.current_index(),
            video_id: item.id.clone(),
            title: item.title.clone(),
            backend: self.backend,
            position_label: self.playlist.position_label(),
            has_previous: self.playlist.has_previous(),
            has_next: self.playlist.has_next(),
        });
    }
}

impl Drop for PlayerController {
    fn drop(&mut self) {
        // Only reached with the callback still pending when `run` unwound or
        // was never polled to completion
        if let Some(on_close) = self.on_close.take() {
            error!("Player stopped without closing cleanly");
            on_close(CloseReason::Failed);
        }
    }
}

async fn sleep_until_opt(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

/// Handle for communicating with a running [`PlayerController`].
#[derive(Debug, Clone)]
pub struct PlayerHandle {
    sender: mpsc::UnboundedSender<PlayerCommand>,
    events: broadcast::Sender<PlayerEvent>,
}

impl PlayerHandle {
    pub fn send(&self, command: PlayerCommand) -> PlayerResult<()> {
        self.sender.send(command).map_err(|_| PlayerError::Closed)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<PlayerEvent> {
        self.events.subscribe()
    }

    pub fn toggle_play_pause(&self) -> PlayerResult<()> {
        self.send(PlayerCommand::TogglePlayPause)
    }

    pub fn toggle_mute(&self) -> PlayerResult<()> {
        self.send(PlayerCommand::ToggleMute)
    }

    pub fn set_volume(&self, volume: f64) -> PlayerResult<()> {
        self.send(PlayerCommand::SetVolume(volume))
    }

    pub fn seek(&self, position: Duration) -> PlayerResult<()> {
        self.send(PlayerCommand::Seek(position))
    }

    pub fn seek_relative(&self, offset_secs: f64) -> PlayerResult<()> {
        self.send(PlayerCommand::SeekRelative(offset_secs))
    }

    pub fn toggle_fullscreen(&self) -> PlayerResult<()> {
        self.send(PlayerCommand::ToggleFullscreen)
    }

    pub fn select(&self, index: usize) -> PlayerResult<()> {
        self.send(PlayerCommand::Select(index))
    }

    pub fn next(&self) -> PlayerResult<()> {
        self.send(PlayerCommand::Next)
    }

    pub fn previous(&self) -> PlayerResult<()> {
        self.send(PlayerCommand::Previous)
    }

    pub fn pointer_moved(&self) -> PlayerResult<()> {
        self.send(PlayerCommand::PointerMoved)
    }

    pub fn key(&self, input: impl Into<KeyInput>) -> PlayerResult<()> {
        self.send(PlayerCommand::Key(input.into()))
    }

    /// Forward a platform signal to the player
    pub fn transport_event(&self, event: TransportEvent) -> PlayerResult<()> {
        self.send(PlayerCommand::Transport(event))
    }

    pub fn close(&self) -> PlayerResult<()> {
        self.send(PlayerCommand::Close)
    }

    pub async fn set_playback_speed(&self, speed: f64) -> PlayerResult<()> {
        let (respond_to, response) = oneshot::channel();
        self.send(PlayerCommand::SetPlaybackSpeed { speed, respond_to })?;
        response.await.map_err(|_| PlayerError::Closed)?
    }

    pub async fn snapshot(&self) -> PlayerResult<PlayerSnapshot> {
        let (respond_to, response) = oneshot::channel();
        self.send(PlayerCommand::GetSnapshot { respond_to })?;
        response.await.map_err(|_| PlayerError::Closed)
    }
}
