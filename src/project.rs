//! Project entity and its settings-blob contract.
//!
//! The settings store treats blobs as opaque; the project is the only side
//! that encodes and decodes them.

use std::path::{Path, PathBuf};

use crate::settings::ProjectSettings;

/// A logical collection of notes with its own settings and optional
/// git-backed remote.
#[derive(Debug, Clone)]
pub struct Project {
    location: PathBuf,
    label: String,
    is_cloud: bool,
    settings: ProjectSettings,
}

impl Project {
    pub fn new(location: impl Into<PathBuf>) -> Self {
        let location = location.into();
        let label = location
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| location.display().to_string());
        Self {
            location,
            label,
            is_cloud: false,
            settings: ProjectSettings::default(),
        }
    }

    /// A cloud project shares the process-wide default origin.
    pub fn cloud(location: impl Into<PathBuf>) -> Self {
        let mut project = Self::new(location);
        project.is_cloud = true;
        project
    }

    /// Identity key: the directory holding the project's notes.
    pub fn location(&self) -> &Path {
        &self.location
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn is_cloud(&self) -> bool {
        self.is_cloud
    }

    pub fn settings(&self) -> &ProjectSettings {
        &self.settings
    }

    pub fn settings_mut(&mut self) -> &mut ProjectSettings {
        &mut self.settings
    }

    /// Serialized settings, `None` while the settings are still pristine
    /// defaults (matching the archive's "only projects with settings" rule).
    pub fn settings_blob(&self) -> Option<Vec<u8>> {
        if self.settings.is_default() {
            return None;
        }
        match serde_json::to_vec(&self.settings) {
            Ok(blob) => Some(blob),
            Err(e) => {
                tracing::warn!(
                    project = %self.location.display(),
                    "failed to encode settings: {e}"
                );
                None
            }
        }
    }

    /// Apply a previously serialized blob. A malformed blob is logged and
    /// leaves the current settings untouched.
    pub fn load_settings(&mut self, blob: &[u8]) {
        match serde_json::from_slice(blob) {
            Ok(settings) => self.settings = settings,
            Err(e) => {
                tracing::warn!(
                    project = %self.location.display(),
                    "ignoring unreadable settings blob: {e}"
                );
            }
        }
    }

    /// Git repository directory for this project's working copy.
    pub fn repo_dir(&self) -> PathBuf {
        self.location.join(".git")
    }

    /// Existence only; a broken partial clone still counts and routes
    /// through the confirm-and-reclone path.
    pub fn is_repo_exist(&self) -> bool {
        self.repo_dir().exists()
    }
}
