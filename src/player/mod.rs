pub mod chrome;
pub mod controller;
pub mod events;
pub mod keyboard;
pub mod layout;
pub mod source;
pub mod tracker;
pub mod traits;
pub mod transport;

pub use chrome::{ChromeMachine, ChromeState, Viewport};
pub use controller::{
    CloseReason, PlayerCollaborators, PlayerCommand, PlayerController, PlayerHandle, PlayerProps,
    PlayerSnapshot, PlayerTimings, PlayerView, TransportEvent,
};
pub use events::PlayerEvent;
pub use keyboard::{Key, KeyInput, Modifiers, Shortcut};
pub use layout::{LayoutHost, LayoutSnapshot, LayoutStack, LayoutTakeover, TakeoverToken};
pub use source::{PlaybackSource, SourceResolver, UnplayableReason};
pub use tracker::{ProgressTracker, ReportThrottle, ResumeDecision, TrackerSettings};
pub use traits::{EmbedFrame, FullscreenPlatform, MediaTransport};
pub use transport::{BackendKind, TransportState, PLAYBACK_SPEEDS};
