#![allow(dead_code)]

pub mod fixtures;
pub mod mocks;

use portal_player::models::{UserId, VideoItem};
use portal_player::player::{
    CloseReason, LayoutSnapshot, LayoutStack, PlayerCollaborators, PlayerController, PlayerHandle,
    PlayerProps, PlayerSnapshot, PlayerTimings, TransportEvent,
};
use portal_player::services::{Anonymous, CurrentUser, SignedIn};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;

use mocks::{MockEmbed, MockFullscreen, MockProgressService, MockTransport};

/// A spawned player wired to recording mocks.
pub struct TestPlayer {
    pub handle: PlayerHandle,
    pub transport: Arc<MockTransport>,
    pub embed: Arc<MockEmbed>,
    pub fullscreen: Arc<MockFullscreen>,
    pub layout: Arc<LayoutStack>,
    pub progress: Arc<MockProgressService>,
    pub closed: Arc<Mutex<Vec<CloseReason>>>,
    pub task: Option<JoinHandle<()>>,
}

impl TestPlayer {
    pub async fn snapshot(&self) -> PlayerSnapshot {
        self.handle.snapshot().await.expect("player is running")
    }

    pub fn transport_event(&self, event: TransportEvent) {
        self.handle.transport_event(event).expect("player is running");
    }

    /// Mark the active native item loaded and ready.
    pub fn ready(&self, duration_secs: u64) {
        self.transport_event(TransportEvent::MetadataLoaded(Duration::from_secs(duration_secs)));
        self.transport_event(TransportEvent::Ready);
    }

    /// Wait for the actor to stop.
    pub async fn join(&mut self) {
        if let Some(task) = self.task.take() {
            task.await.expect("player task panicked");
        }
    }

    pub fn close_reasons(&self) -> Vec<CloseReason> {
        self.closed.lock().unwrap().clone()
    }
}

/// Let every task run until the runtime goes idle. Needs paused time.
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(1)).await;
}

/// Move the paused clock forward and let timers fire.
pub async fn advance(duration: Duration) {
    tokio::time::advance(duration).await;
    settle().await;
}

pub struct PlayerBuilder {
    items: Vec<VideoItem>,
    start_index: usize,
    autoplay: bool,
    collection: Option<(String, Option<i64>)>,
    user: Option<UserId>,
    progress: MockProgressService,
    initial_layout: LayoutSnapshot,
    timings: PlayerTimings,
}

impl PlayerBuilder {
    pub fn new(items: Vec<VideoItem>) -> Self {
        Self {
            items,
            start_index: 0,
            autoplay: true,
            collection: None,
            user: Some(UserId::from("7")),
            progress: MockProgressService::default(),
            initial_layout: LayoutSnapshot::default(),
            timings: PlayerTimings::default(),
        }
    }

    pub fn start_at(mut self, index: usize) -> Self {
        self.start_index = index;
        self
    }

    pub fn autoplay(mut self, autoplay: bool) -> Self {
        self.autoplay = autoplay;
        self
    }

    pub fn collection(mut self, name: &str, id: Option<i64>) -> Self {
        self.collection = Some((name.to_string(), id));
        self
    }

    pub fn anonymous(mut self) -> Self {
        self.user = None;
        self
    }

    pub fn progress(mut self, progress: MockProgressService) -> Self {
        self.progress = progress;
        self
    }

    pub fn initial_layout(mut self, layout: LayoutSnapshot) -> Self {
        self.initial_layout = layout;
        self
    }

    pub async fn spawn(self) -> TestPlayer {
        let transport = Arc::new(MockTransport::default());
        let embed = Arc::new(MockEmbed::default());
        let fullscreen = Arc::new(MockFullscreen::default());
        let layout = Arc::new(LayoutStack::new(self.initial_layout));
        let progress = Arc::new(self.progress);
        let user: Arc<dyn CurrentUser> = match self.user {
            Some(user) => Arc::new(SignedIn(user)),
            None => Arc::new(Anonymous),
        };
        let closed = Arc::new(Mutex::new(Vec::new()));

        let closed_sink = closed.clone();
        let mut props = PlayerProps::new(self.items, move |reason| {
            closed_sink.lock().unwrap().push(reason);
        })
        .with_start_index(self.start_index)
        .with_autoplay(self.autoplay);
        if let Some((name, id)) = self.collection {
            props = props.with_collection(name, id);
        }

        let collaborators = PlayerCollaborators {
            transport: transport.clone(),
            embed: embed.clone(),
            fullscreen: fullscreen.clone(),
            layout: layout.clone(),
            user,
            progress: progress.clone(),
        };

        let (handle, controller) =
            PlayerController::new(props, collaborators, self.timings).expect("valid playlist");
        let task = tokio::spawn(controller.run());
        settle().await;

        TestPlayer {
            handle,
            transport,
            embed,
            fullscreen,
            layout,
            progress,
            closed,
            task: Some(task),
        }
    }
}
