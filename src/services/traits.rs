use anyhow::Result;
use async_trait::async_trait;

use crate::models::{ProgressReport, ProgressStatus, UserId};

/// Accessor for the signed-in identity.
pub trait CurrentUser: Send + Sync {
    fn current_user(&self) -> Option<UserId>;
}

/// Persistence of per-user viewing progress.
///
/// Every call is best-effort: the player logs failures and moves on.
#[async_trait]
pub trait ProgressService: Send + Sync {
    /// Open a new viewing session for a video
    async fn start_session(&self, video_id: i64, collection_id: Option<i64>) -> Result<()>;

    async fn report_progress(&self, report: &ProgressReport) -> Result<()>;

    /// Last stored position, or `None` when the user never watched the video
    async fn get_status(&self, video_id: i64, collection_id: Option<i64>) -> Result<Option<ProgressStatus>>;
}

/// A user accessor that never has anyone signed in. Tracking becomes a no-op.
#[derive(Debug, Default, Clone, Copy)]
pub struct Anonymous;

impl CurrentUser for Anonymous {
    fn current_user(&self) -> Option<UserId> {
        None
    }
}

/// A fixed signed-in user, for hosts that resolve identity up front.
#[derive(Debug, Clone)]
pub struct SignedIn(pub UserId);

impl CurrentUser for SignedIn {
    fn current_user(&self) -> Option<UserId> {
        Some(self.0.clone())
    }
}
