/// Media file entity as seen by the playback core
use super::ids::{FileId, FolderId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Resolvable location of a media file
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MediaLocation {
    path: PathBuf,
}

impl MediaLocation {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Lowercased file extension, used as a container hint
    #[must_use]
    pub fn extension(&self) -> Option<String> {
        self.path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase)
    }
}

impl std::fmt::Display for MediaLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.path.display())
    }
}

/// Completion statistics for a file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaybackRecord {
    pub last_played_at: Option<DateTime<Utc>>,
    pub completion_count: u32,
}

impl PlaybackRecord {
    /// Count one completed play at `at`
    pub fn record_completion(&mut self, at: DateTime<Utc>) {
        self.completion_count = self.completion_count.saturating_add(1);
        self.last_played_at = Some(at);
    }
}

/// A media file known to the library
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaFile {
    pub id: FileId,
    pub location: MediaLocation,
    pub title: String,
    pub folder: FolderId,
    /// Last known duration in seconds
    pub cached_duration: Option<f64>,
    /// Last persisted playback position in seconds
    pub playback_position: f64,
    pub record: PlaybackRecord,
    /// Reason the last load failed, cleared on success
    pub load_error: Option<String>,
}

impl MediaFile {
    /// Create a file entry with a fresh id; the title defaults to the file stem
    pub fn new(location: MediaLocation, folder: FolderId) -> Self {
        let title = location
            .path()
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("Untitled")
            .to_string();
        Self {
            id: FileId::generate(),
            location,
            title,
            folder,
            cached_duration: None,
            playback_position: 0.0,
            record: PlaybackRecord::default(),
            load_error: None,
        }
    }

    /// Position to resume from: the stored position, or 0 when it is at or
    /// past the cached duration.
    #[must_use]
    pub fn resume_position(&self) -> f64 {
        let pos = self.playback_position.max(0.0);
        match self.cached_duration {
            Some(d) if d > 0.0 && pos >= d => 0.0,
            _ => pos,
        }
    }
}
