//! Git sync error types.

use std::path::PathBuf;

use thiserror::Error;

use crate::error::{Effect, Transience};

/// Errors that can occur while syncing a project with its origin.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum SyncError {
    #[error("failed to open repository at {0}: {1}")]
    OpenRepo(PathBuf, #[source] git2::Error),

    /// Remote/transport failure. `message` and `description` are surfaced
    /// to the user verbatim.
    #[error("{message}: {description}")]
    Transport { message: String, description: String },

    #[error("no local branch to check out")]
    NoLocalBranch,

    #[error("failed to check out working tree: {0}")]
    Checkout(#[source] git2::Error),

    #[error("failed to commit local state: {0}")]
    Commit(#[source] git2::Error),

    #[error("failed to push to origin: {0}")]
    Push(#[source] git2::Error),

    #[error("git operation failed: {0}")]
    Git(#[from] git2::Error),
}

impl SyncError {
    /// Whether retrying this sync may succeed. Retries are always
    /// user-initiated re-invocations, never automatic.
    pub fn transience(&self) -> Transience {
        match self {
            SyncError::Transport { .. } | SyncError::Push(_) => Transience::Retryable,

            SyncError::OpenRepo(_, _)
            | SyncError::NoLocalBranch
            | SyncError::Checkout(_)
            | SyncError::Commit(_) => Transience::Permanent,

            SyncError::Git(_) => Transience::Unknown,
        }
    }

    /// What we know about side effects when this error is returned.
    pub fn effect(&self) -> Effect {
        match self {
            // Fetch failures leave the working tree untouched.
            SyncError::OpenRepo(_, _) | SyncError::NoLocalBranch | SyncError::Transport { .. } => {
                Effect::None
            }

            // A commit may exist locally by the time a push fails.
            SyncError::Commit(_) | SyncError::Push(_) => Effect::Some,

            SyncError::Checkout(_) | SyncError::Git(_) => Effect::Unknown,
        }
    }
}
