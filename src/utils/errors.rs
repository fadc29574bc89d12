use thiserror::Error;

/// Failures surfaced to the host through [`PlayerHandle`](crate::player::PlayerHandle)
/// and [`PlayerController::new`](crate::player::PlayerController::new).
/// Collaborator failures never reach this type; they are logged where they occur.
#[derive(Error, Debug)]
pub enum PlayerError {
    #[error("Playlist is empty")]
    EmptyPlaylist,

    #[error("Player is closed")]
    Closed,

    #[error("Unsupported playback speed: {0}")]
    UnsupportedSpeed(f64),
}

pub type PlayerResult<T> = std::result::Result<T, PlayerError>;
