pub mod errors;
pub mod time;

pub use errors::{PlayerError, PlayerResult};
pub use time::{duration_from_secs, format_playback_time};
