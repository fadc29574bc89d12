pub mod progress_api;
pub mod traits;

pub use progress_api::HttpProgressService;
pub use traits::{Anonymous, CurrentUser, ProgressService, SignedIn};
