//! Data directory helpers for the settings archive.

use std::path::PathBuf;

/// Base directory for persistent data.
///
/// Uses `NOTEGIT_DATA_DIR` if set, otherwise `$XDG_DATA_HOME/notegit` or
/// `~/.local/share/notegit`.
pub(crate) fn data_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("NOTEGIT_DATA_DIR")
        && !dir.trim().is_empty()
    {
        return PathBuf::from(dir);
    }

    std::env::var("XDG_DATA_HOME")
        .ok()
        .filter(|s| !s.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| {
            dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("/tmp"))
                .join(".local")
                .join("share")
        })
        .join("notegit")
}

/// Archive holding every project's serialized settings.
pub(crate) fn settings_archive_path() -> PathBuf {
    data_dir().join("projects.settings")
}
