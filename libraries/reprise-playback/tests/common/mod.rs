//! Shared fixtures: in-memory collaborators and a coordinator harness

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reprise_core::{
    FileId, FolderId, FolderListing, MediaFile, MediaLibrary, MediaLocation, RepriseError, Result,
    Segment, SegmentId, SegmentRepository, SessionTracker,
};
use reprise_engine::{ClockBackend, EngineConfig, MediaBackend, PlaybackEngine};
use reprise_playback::{
    Collaborators, CoordinatorConfig, CoordinatorEvent, LoadPhase, PlaybackCoordinator,
    SelectOptions,
};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;

// ===== Media library =====

#[derive(Default)]
pub struct MemoryLibrary {
    files: Mutex<Vec<MediaFile>>,
    pub position_writes: AtomicUsize,
}

impl MemoryLibrary {
    pub fn add(&self, file: MediaFile) {
        self.files.lock().unwrap().push(file);
    }

    pub fn get(&self, id: &FileId) -> MediaFile {
        self.files
            .lock()
            .unwrap()
            .iter()
            .find(|f| &f.id == id)
            .cloned()
            .expect("file registered")
    }

    pub fn update(&self, id: &FileId, change: impl FnOnce(&mut MediaFile)) {
        if let Some(file) = self.files.lock().unwrap().iter_mut().find(|f| &f.id == id) {
            change(file);
        }
    }
}

#[async_trait]
impl MediaLibrary for MemoryLibrary {
    async fn file(&self, id: &FileId) -> Result<Option<MediaFile>> {
        Ok(self.files.lock().unwrap().iter().find(|f| &f.id == id).cloned())
    }

    async fn update_playback_position(&self, id: &FileId, position: f64) -> Result<()> {
        self.position_writes.fetch_add(1, Ordering::SeqCst);
        self.update(id, |f| f.playback_position = position);
        Ok(())
    }

    async fn update_cached_duration(&self, id: &FileId, duration: f64) -> Result<()> {
        self.update(id, |f| f.cached_duration = Some(duration));
        Ok(())
    }

    async fn set_load_error(&self, id: &FileId, error: Option<String>) -> Result<()> {
        self.update(id, |f| f.load_error = error);
        Ok(())
    }

    async fn record_completion(&self, id: &FileId, at: DateTime<Utc>) -> Result<()> {
        self.update(id, |f| f.record.record_completion(at));
        Ok(())
    }
}

#[async_trait]
impl FolderListing for MemoryLibrary {
    async fn ordered_files(&self, folder: &FolderId) -> Result<Vec<FileId>> {
        Ok(self
            .files
            .lock()
            .unwrap()
            .iter()
            .filter(|f| &f.folder == folder)
            .map(|f| f.id.clone())
            .collect())
    }
}

// ===== Segments =====

#[derive(Default)]
pub struct MemorySegments {
    rows: Mutex<Vec<Segment>>,
    pub inserts: AtomicUsize,
    /// Makes deletes fail without touching the rows
    pub fail_deletes: AtomicBool,
}

impl MemorySegments {
    pub fn stored(&self, file: &FileId) -> Vec<Segment> {
        let mut rows: Vec<Segment> = self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|s| &s.file_id == file)
            .cloned()
            .collect();
        rows.sort_by_key(|s| s.index);
        rows
    }
}

#[async_trait]
impl SegmentRepository for MemorySegments {
    async fn segments_for_file(&self, file_id: &FileId) -> Result<Vec<Segment>> {
        Ok(self.stored(file_id))
    }

    async fn insert_segment(&self, segment: &Segment) -> Result<()> {
        self.inserts.fetch_add(1, Ordering::SeqCst);
        self.rows.lock().unwrap().push(segment.clone());
        Ok(())
    }

    async fn delete_segment(&self, id: &SegmentId, reindex: &[(SegmentId, u32)]) -> Result<()> {
        if self.fail_deletes.load(Ordering::SeqCst) {
            return Err(RepriseError::Storage("segments table locked".to_string()));
        }
        let mut rows = self.rows.lock().unwrap();
        rows.retain(|s| &s.id != id);
        for (id, index) in reindex {
            if let Some(row) = rows.iter_mut().find(|s| &s.id == id) {
                row.index = *index;
            }
        }
        Ok(())
    }

    async fn rename_segment(&self, id: &SegmentId, label: &str) -> Result<()> {
        if let Some(row) = self.rows.lock().unwrap().iter_mut().find(|s| &s.id == id) {
            row.label = label.to_string();
        }
        Ok(())
    }
}

// ===== Sessions =====

#[derive(Debug, Clone, PartialEq)]
pub enum SessionCall {
    Start,
    Listen(f64),
    Persist,
    End,
}

#[derive(Default)]
pub struct RecordingSessions {
    calls: Mutex<Vec<SessionCall>>,
}

impl RecordingSessions {
    pub fn calls(&self) -> Vec<SessionCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn listened(&self) -> f64 {
        self.calls()
            .iter()
            .map(|c| match c {
                SessionCall::Listen(d) => *d,
                _ => 0.0,
            })
            .sum()
    }

    pub fn reset(&self) {
        self.calls.lock().unwrap().clear();
    }

    fn record(&self, call: SessionCall) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl SessionTracker for RecordingSessions {
    async fn start_session_if_needed(&self) {
        self.record(SessionCall::Start);
    }

    async fn add_listening_time(&self, delta: f64) {
        self.record(SessionCall::Listen(delta));
    }

    async fn persist_progress(&self) {
        self.record(SessionCall::Persist);
    }

    async fn end_session_if_idle(&self) {
        self.record(SessionCall::End);
    }
}

// ===== Backend =====

/// Clock backend that records which files were opened
pub struct CountingBackend {
    inner: ClockBackend,
    pub opened: Arc<Mutex<Vec<PathBuf>>>,
    pub closes: Arc<AtomicUsize>,
}

impl MediaBackend for CountingBackend {
    fn open(&mut self, location: &MediaLocation) -> reprise_engine::Result<()> {
        self.opened.lock().unwrap().push(location.path().to_path_buf());
        self.inner.open(location)
    }

    fn duration(&mut self) -> Option<f64> {
        self.inner.duration()
    }

    fn is_ready(&self) -> bool {
        self.inner.is_ready()
    }

    fn position(&self) -> f64 {
        self.inner.position()
    }

    fn play(&mut self) -> bool {
        self.inner.play()
    }

    fn pause(&mut self) {
        self.inner.pause();
    }

    fn is_playing(&self) -> bool {
        self.inner.is_playing()
    }

    fn seek(&mut self, time: f64) -> bool {
        self.inner.seek(time)
    }

    fn set_volume(&mut self, level: f32) {
        self.inner.set_volume(level);
    }

    fn reached_end(&self) -> bool {
        self.inner.reached_end()
    }

    fn close(&mut self) {
        self.closes.fetch_add(1, Ordering::SeqCst);
        self.inner.close();
    }
}

// ===== Harness =====

pub const FOLDER: &str = "lectures";

pub struct Harness {
    pub dir: TempDir,
    pub library: Arc<MemoryLibrary>,
    pub segments: Arc<MemorySegments>,
    pub sessions: Arc<RecordingSessions>,
    pub opened: Arc<Mutex<Vec<PathBuf>>>,
    pub closes: Arc<AtomicUsize>,
    pub coordinator: PlaybackCoordinator,
}

impl Harness {
    /// Files named `names` in one folder, each lasting `duration` seconds
    pub fn new(duration: f64, names: &[&str]) -> Self {
        Self::with_config(duration, names, CoordinatorConfig::default())
    }

    pub fn with_config(duration: f64, names: &[&str], config: CoordinatorConfig) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let library = Arc::new(MemoryLibrary::default());
        for name in names {
            let path = dir.path().join(format!("{name}.mp3"));
            std::fs::write(&path, b"stub").unwrap();
            let mut file = MediaFile::new(MediaLocation::new(path), FolderId::new(FOLDER));
            file.id = FileId::new(*name);
            library.add(file);
        }

        let segments = Arc::new(MemorySegments::default());
        let sessions = Arc::new(RecordingSessions::default());
        let opened = Arc::new(Mutex::new(Vec::new()));
        let closes = Arc::new(AtomicUsize::new(0));

        let backend = CountingBackend {
            inner: ClockBackend::fixed(duration),
            opened: opened.clone(),
            closes: closes.clone(),
        };
        let (engine, events) = PlaybackEngine::spawn(Box::new(backend), EngineConfig::default());

        let collaborators = Collaborators {
            library: library.clone(),
            folders: library.clone(),
            segments: segments.clone(),
            sessions: sessions.clone(),
        };
        let coordinator = PlaybackCoordinator::new(engine, events, collaborators, config);

        Self {
            dir,
            library,
            segments,
            sessions,
            opened,
            closes,
            coordinator,
        }
    }

    /// Bare coordinator over the given session tracker, for expectation tests
    pub fn coordinator_with_sessions(
        duration: f64,
        names: &[&str],
        sessions: Arc<dyn SessionTracker>,
    ) -> (TempDir, PlaybackCoordinator) {
        let dir = tempfile::tempdir().unwrap();
        let library = Arc::new(MemoryLibrary::default());
        for name in names {
            let path = dir.path().join(format!("{name}.mp3"));
            std::fs::write(&path, b"stub").unwrap();
            let mut file = MediaFile::new(MediaLocation::new(path), FolderId::new(FOLDER));
            file.id = FileId::new(*name);
            library.add(file);
        }
        let (engine, events) = PlaybackEngine::spawn(
            Box::new(ClockBackend::fixed(duration)),
            EngineConfig::default(),
        );
        let collaborators = Collaborators {
            library: library.clone(),
            folders: library,
            segments: Arc::new(MemorySegments::default()),
            sessions,
        };
        let coordinator =
            PlaybackCoordinator::new(engine, events, collaborators, CoordinatorConfig::default());
        (dir, coordinator)
    }

    pub fn id(name: &str) -> FileId {
        FileId::new(name)
    }

    /// Select `name` and pump until it is loaded
    pub async fn load(&mut self, name: &str) {
        self.coordinator
            .select_file(&Self::id(name), SelectOptions::default())
            .await
            .unwrap();
        self.wait_ready().await;
    }

    pub async fn wait_ready(&mut self) {
        pump_until(&mut self.coordinator, |c| c.phase() == LoadPhase::Ready).await;
    }

    pub fn opened_names(&self) -> Vec<String> {
        self.opened
            .lock()
            .unwrap()
            .iter()
            .filter_map(|p| p.file_stem().and_then(|s| s.to_str()).map(String::from))
            .collect()
    }
}

/// Pump until `pred` holds, failing after a minute of virtual time
pub async fn pump_until(
    coordinator: &mut PlaybackCoordinator,
    mut pred: impl FnMut(&PlaybackCoordinator) -> bool,
) {
    tokio::time::timeout(Duration::from_secs(60), async {
        while !pred(coordinator) {
            coordinator.pump().await;
        }
    })
    .await
    .expect("condition not reached");
}

/// All `TimeUpdated` values in order
pub fn times(events: &[CoordinatorEvent]) -> Vec<f64> {
    events
        .iter()
        .filter_map(|e| match e {
            CoordinatorEvent::TimeUpdated { time } => Some(*time),
            _ => None,
        })
        .collect()
}
