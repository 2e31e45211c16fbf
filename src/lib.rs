#![forbid(unsafe_code)]

pub mod error;
pub mod git;
mod paths;
pub mod project;
pub mod settings;
pub mod store;

pub use error::{Effect, Error, Transience};
pub type Result<T> = std::result::Result<T, Error>;

// Re-export the main types at crate root for convenience
pub use git::{
    Git2Client, GitClient, PendingConfirmation, ProjectSyncWorkflow, PullOutcome,
    SharedOriginPolicy, SyncError, SyncOutcome,
};
pub use project::Project;
pub use settings::{ProjectSettings, SortBy, SortDirection};
pub use store::SettingsStore;
