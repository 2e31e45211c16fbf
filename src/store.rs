//! Settings archive: best-effort persistence of per-project settings.
//!
//! One file holds every project's serialized settings, keyed by location.
//! The archive is rebuilt in full on each save. Failures are logged and
//! swallowed: settings are non-critical preferences, and losing them must
//! never take the app down.
//!
//! Wire format: JSONL, one record per line, sorted by location. The settings
//! blob is embedded as a raw JSON value so the store never interprets it.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::value::RawValue;
use thiserror::Error;

use crate::error::{Effect, Transience};
use crate::paths;
use crate::project::Project;

/// Errors from archive I/O. Internal helpers return them; the public store
/// surface swallows and logs them.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum ArchiveError {
    #[error("failed to read archive at {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write archive at {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to encode archive record for {location}: {reason}")]
    Encode { location: PathBuf, reason: String },
}

impl ArchiveError {
    /// Whether retrying this operation may succeed.
    pub fn transience(&self) -> Transience {
        match self {
            ArchiveError::Read { .. } | ArchiveError::Write { .. } => Transience::Retryable,
            ArchiveError::Encode { .. } => Transience::Permanent,
        }
    }

    /// What we know about side effects when this error is returned.
    pub fn effect(&self) -> Effect {
        match self {
            // The temp-file-then-persist write either lands or doesn't.
            ArchiveError::Write { .. } => Effect::Unknown,
            ArchiveError::Read { .. } | ArchiveError::Encode { .. } => Effect::None,
        }
    }
}

#[derive(Serialize, Deserialize)]
struct ArchiveRecord {
    location: PathBuf,
    settings: Box<RawValue>,
}

/// Durable round-trip of per-project settings. Data shape and durability
/// only; no business logic.
pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    /// Store backed by the default archive path under the data directory.
    pub fn new() -> Self {
        Self {
            path: paths::settings_archive_path(),
        }
    }

    /// Store pinned to an explicit archive path.
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Rebuild and overwrite the archive from every project that carries
    /// non-default settings. If no project does, no file is written.
    ///
    /// Best-effort: failures are logged at warn, never surfaced. Callers
    /// invoke this synchronously after each settings mutation.
    pub fn save<'a>(&self, projects: impl IntoIterator<Item = &'a Project>) {
        let mut records = Vec::new();
        for project in projects {
            let Some(blob) = project.settings_blob() else {
                continue;
            };
            match record_from_blob(project.location(), blob) {
                Ok(record) => records.push(record),
                Err(e) => tracing::warn!("skipping settings record: {e}"),
            }
        }

        if records.is_empty() {
            return;
        }

        if let Err(e) = self.write_records(&mut records) {
            tracing::warn!("settings archive write failed: {e}");
        }
    }

    /// Load the archive and hand each matching project its blob.
    ///
    /// A missing or unreadable archive is a silent no-op (first run).
    /// Malformed lines and records for unknown locations are skipped
    /// individually.
    pub fn restore(&self, projects: &mut [Project]) {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(_) => return,
        };

        for line in contents.lines() {
            if line.trim().is_empty() {
                continue;
            }
            let record: ArchiveRecord = match serde_json::from_str(line) {
                Ok(record) => record,
                Err(e) => {
                    tracing::warn!("skipping unreadable archive line: {e}");
                    continue;
                }
            };
            if let Some(project) = projects
                .iter_mut()
                .find(|p| p.location() == record.location)
            {
                project.load_settings(record.settings.get().as_bytes());
            }
        }
    }

    fn write_records(&self, records: &mut [ArchiveRecord]) -> Result<(), ArchiveError> {
        records.sort_by(|a, b| a.location.cmp(&b.location));

        let mut output = String::new();
        for record in records.iter() {
            let line = serde_json::to_string(record).map_err(|e| ArchiveError::Encode {
                location: record.location.clone(),
                reason: e.to_string(),
            })?;
            output.push_str(&line);
            output.push('\n');
        }

        let dir = self.path.parent().unwrap_or_else(|| Path::new("."));
        fs::create_dir_all(dir).map_err(|e| ArchiveError::Write {
            path: self.path.clone(),
            source: e,
        })?;

        let temp = tempfile::NamedTempFile::new_in(dir).map_err(|e| ArchiveError::Write {
            path: self.path.clone(),
            source: e,
        })?;
        fs::write(temp.path(), output.as_bytes()).map_err(|e| ArchiveError::Write {
            path: self.path.clone(),
            source: e,
        })?;
        temp.persist(&self.path).map_err(|e| ArchiveError::Write {
            path: self.path.clone(),
            source: e.error,
        })?;
        Ok(())
    }
}

impl Default for SettingsStore {
    fn default() -> Self {
        Self::new()
    }
}

fn record_from_blob(location: &Path, blob: Vec<u8>) -> Result<ArchiveRecord, ArchiveError> {
    let text = String::from_utf8(blob).map_err(|e| ArchiveError::Encode {
        location: location.to_owned(),
        reason: e.to_string(),
    })?;
    let settings = RawValue::from_string(text).map_err(|e| ArchiveError::Encode {
        location: location.to_owned(),
        reason: e.to_string(),
    })?;
    Ok(ArchiveRecord {
        location: location.to_owned(),
        settings,
    })
}
