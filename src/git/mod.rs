//! Git integration module.
//!
//! Provides:
//! - GitClient contract and the git2-backed implementation
//! - ProjectSyncWorkflow clone/pull state machine with a destructive
//!   confirmation gate

pub mod client;
pub mod error;
pub mod sync;

pub use client::{DEFAULT_BRANCH, Git2Client, GitClient, PullOutcome};
pub use error::SyncError;
pub use sync::{PendingConfirmation, ProjectSyncWorkflow, SharedOriginPolicy, SyncOutcome};
