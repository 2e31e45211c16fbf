use thiserror::Error;

use crate::git::SyncError;
use crate::store::ArchiveError;

/// Whether retrying this operation may succeed.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Transience {
    /// Retry will never help without changing inputs/state.
    Permanent,
    /// Retry may help (transient contention/outage).
    Retryable,
    /// Unknown if retry will help.
    Unknown,
}

impl Transience {
    pub fn is_retryable(self) -> bool {
        matches!(self, Transience::Retryable)
    }
}

/// What we know about side effects when an error is returned.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Effect {
    /// Definitely no side effects occurred.
    None,
    /// Side effects definitely occurred (locally or remotely).
    Some,
    /// We don't know if side effects occurred.
    Unknown,
}

impl Effect {
    pub fn as_str(self) -> &'static str {
        match self {
            Effect::None => "none",
            Effect::Some => "some",
            Effect::Unknown => "unknown",
        }
    }
}

/// Crate-level convenience error.
///
/// A thin wrapper over the capability errors; no "god error".
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    #[error(transparent)]
    Sync(#[from] SyncError),

    #[error(transparent)]
    Archive(#[from] ArchiveError),
}

impl Error {
    pub fn transience(&self) -> Transience {
        match self {
            Error::Sync(e) => e.transience(),
            Error::Archive(e) => e.transience(),
        }
    }

    pub fn effect(&self) -> Effect {
        match self {
            Error::Sync(e) => e.effect(),
            Error::Archive(e) => e.effect(),
        }
    }
}
