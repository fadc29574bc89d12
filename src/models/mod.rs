pub mod identifiers;
pub mod playlist;
pub mod progress;
pub mod video;

pub use identifiers::{UserId, VideoId};
pub use playlist::Playlist;
pub use progress::{ContentType, ProgressRecord, ProgressReport, ProgressStatus};
pub use video::{CaptionVariant, DeliveryType, VideoItem};
