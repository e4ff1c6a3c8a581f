use crate::{media_files, segments, sessions};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reprise_core::{
    error::Result, FileId, FolderId, FolderListing, MediaFile, MediaLibrary, MediaLocation,
    Segment, SegmentId, SegmentRepository, SessionTracker,
};
use sqlx::SqlitePool;
use std::path::Path;
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// Media library, folder listing and segment persistence over `SQLite`
#[derive(Clone)]
pub struct SqliteLibrary {
    pool: SqlitePool,
}

impl SqliteLibrary {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Register a file on disk. Its folder is the parent directory, so
    /// files next to each other share a play queue.
    pub async fn register_path(&self, path: &Path) -> Result<MediaFile> {
        let folder = path
            .parent()
            .map(|p| p.to_string_lossy().into_owned())
            .unwrap_or_default();
        let file = MediaFile::new(MediaLocation::new(path), FolderId::new(folder));
        let stored = media_files::register(&self.pool, &file).await?;
        debug!(file = %stored.id, path = %stored.location, "Registered media file");
        Ok(stored)
    }

    pub async fn folder_files(&self, folder: &FolderId) -> Result<Vec<MediaFile>> {
        media_files::get_by_folder(&self.pool, folder).await
    }

    pub async fn file_by_path(&self, path: &Path) -> Result<Option<MediaFile>> {
        media_files::get_by_path(&self.pool, &path.to_string_lossy()).await
    }
}

#[async_trait]
impl MediaLibrary for SqliteLibrary {
    async fn file(&self, id: &FileId) -> Result<Option<MediaFile>> {
        media_files::get_by_id(&self.pool, id).await
    }

    async fn update_playback_position(&self, id: &FileId, position: f64) -> Result<()> {
        media_files::update_playback_position(&self.pool, id, position).await
    }

    async fn update_cached_duration(&self, id: &FileId, duration: f64) -> Result<()> {
        media_files::update_cached_duration(&self.pool, id, duration).await
    }

    async fn set_load_error(&self, id: &FileId, error: Option<String>) -> Result<()> {
        media_files::set_load_error(&self.pool, id, error.as_deref()).await
    }

    async fn record_completion(&self, id: &FileId, at: DateTime<Utc>) -> Result<()> {
        media_files::record_completion(&self.pool, id, at).await
    }
}

#[async_trait]
impl FolderListing for SqliteLibrary {
    async fn ordered_files(&self, folder: &FolderId) -> Result<Vec<FileId>> {
        media_files::ordered_ids(&self.pool, folder).await
    }
}

#[async_trait]
impl SegmentRepository for SqliteLibrary {
    async fn segments_for_file(&self, file_id: &FileId) -> Result<Vec<Segment>> {
        segments::get_by_file(&self.pool, file_id).await
    }

    async fn insert_segment(&self, segment: &Segment) -> Result<()> {
        segments::create(&self.pool, segment).await
    }

    async fn delete_segment(&self, id: &SegmentId, reindex: &[(SegmentId, u32)]) -> Result<()> {
        segments::delete(&self.pool, id, reindex).await
    }

    async fn rename_segment(&self, id: &SegmentId, label: &str) -> Result<()> {
        segments::rename(&self.pool, id, label).await
    }
}

#[derive(Default)]
struct SessionState {
    session: Option<String>,
    pending: f64,
}

/// Session tracker buffering listening time in memory.
///
/// Deltas accumulate until `persist_progress` or `end_session_if_idle`
/// writes them. Database failures are logged and the buffer is kept for
/// the next flush.
pub struct SqliteSessionTracker {
    pool: SqlitePool,
    state: Mutex<SessionState>,
}

impl SqliteSessionTracker {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            pool,
            state: Mutex::new(SessionState::default()),
        }
    }

    /// Seconds added since the last flush
    pub async fn pending(&self) -> f64 {
        self.state.lock().await.pending
    }

    async fn flush(&self, state: &mut SessionState) {
        if state.pending <= 0.0 {
            return;
        }
        let Some(id) = state.session.as_deref() else {
            return;
        };
        match sessions::add_time(&self.pool, id, state.pending).await {
            Ok(()) => {
                debug!(session = id, seconds = state.pending, "Listening time flushed");
                state.pending = 0.0;
            }
            Err(e) => warn!(session = id, error = %e, "Failed to persist listening time"),
        }
    }
}

#[async_trait]
impl SessionTracker for SqliteSessionTracker {
    async fn start_session_if_needed(&self) {
        let mut state = self.state.lock().await;
        if state.session.is_some() {
            return;
        }
        match sessions::start(&self.pool).await {
            Ok(id) => {
                debug!(session = %id, "Listening session started");
                state.session = Some(id);
            }
            Err(e) => warn!(error = %e, "Failed to start listening session"),
        }
    }

    async fn add_listening_time(&self, delta: f64) {
        if delta > 0.0 {
            self.state.lock().await.pending += delta;
        }
    }

    async fn persist_progress(&self) {
        let mut state = self.state.lock().await;
        self.flush(&mut state).await;
    }

    async fn end_session_if_idle(&self) {
        let mut state = self.state.lock().await;
        self.flush(&mut state).await;
        let Some(id) = state.session.take() else {
            return;
        };
        if let Err(e) = sessions::end(&self.pool, &id).await {
            warn!(session = %id, error = %e, "Failed to end listening session");
        } else {
            debug!(session = %id, "Listening session ended");
        }
    }
}
