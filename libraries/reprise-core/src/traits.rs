//! Collaborator traits the playback core depends on
//!
//! These abstract the persistence side of the system so the coordinator can
//! run against SQLite in the application and against in-memory fakes in tests.

use crate::error::Result;
use crate::types::{FileId, FolderId, MediaFile, Segment, SegmentId};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Media file records: location, cached duration, resume position and
/// completion statistics.
#[async_trait]
pub trait MediaLibrary: Send + Sync {
    /// Get a file by ID
    async fn file(&self, id: &FileId) -> Result<Option<MediaFile>>;

    /// Store the resume position in seconds
    async fn update_playback_position(&self, id: &FileId, position: f64) -> Result<()>;

    /// Cache the probed duration in seconds
    async fn update_cached_duration(&self, id: &FileId, duration: f64) -> Result<()>;

    /// Record (or clear, with `None`) the reason the last load failed
    async fn set_load_error(&self, id: &FileId, error: Option<String>) -> Result<()>;

    /// Increment the completion count and stamp the last-played time
    async fn record_completion(&self, id: &FileId, at: DateTime<Utc>) -> Result<()>;
}

/// Ordered file listing for a folder. Queried on demand, never cached.
#[async_trait]
pub trait FolderListing: Send + Sync {
    async fn ordered_files(&self, folder: &FolderId) -> Result<Vec<FileId>>;
}

/// Segment persistence
#[async_trait]
pub trait SegmentRepository: Send + Sync {
    /// Segments of a file, sorted by index
    async fn segments_for_file(&self, file_id: &FileId) -> Result<Vec<Segment>>;

    async fn insert_segment(&self, segment: &Segment) -> Result<()>;

    /// Remove a segment and apply the index changes closing its gap.
    ///
    /// Both happen or neither does.
    async fn delete_segment(&self, id: &SegmentId, reindex: &[(SegmentId, u32)]) -> Result<()>;

    async fn rename_segment(&self, id: &SegmentId, label: &str) -> Result<()>;
}

/// Listening-time accounting.
///
/// Implementations own their buffering and failure handling; the
/// coordinator only feeds them.
#[async_trait]
pub trait SessionTracker: Send + Sync {
    async fn start_session_if_needed(&self);

    /// Add seconds of listening time
    async fn add_listening_time(&self, delta: f64);

    /// Flush buffered time
    async fn persist_progress(&self);

    async fn end_session_if_idle(&self);
}
