//! Playback coordinator
//!
//! The only component a front end talks to. It owns all observable state
//! (current file, time, duration, loop points, play flag, current segment),
//! issues commands to the engine and reconciles what comes back.
//!
//! The coordinator is confined to one task. Engine callbacks, load
//! outcomes and end-of-media notifications are queued and applied when the
//! owner calls [`PlaybackCoordinator::pump`], so state is never touched
//! from two places at once.

use crate::error::{PlaybackError, Result};
use crate::events::{CoordinatorEvent, PlaybackSnapshot};
use crate::generation::Generation;
use crate::queue::PlaybackQueue;
use crate::segments::{SaveOutcome, SegmentStore};
use crate::types::{
    CoordinatorConfig, Direction, LoadPhase, PlayState, SelectOptions, MAX_VOLUME, MIN_VOLUME,
};
use chrono::Utc;
use reprise_core::{
    clamp_time, FileId, FolderListing, LoopEdit, LoopRange, MediaFile, MediaLibrary,
    MediaLocation, RepeatMode, RepriseError, Segment, SegmentId, SegmentRepository,
    SessionTracker,
};
use reprise_engine::{
    EngineCallback, EngineEvent, EngineEvents, EngineHandle, LoadToken, PlaybackHandle,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, trace, warn};

/// External collaborators of the coordinator
#[derive(Clone)]
pub struct Collaborators {
    pub library: Arc<dyn MediaLibrary>,
    pub folders: Arc<dyn FolderListing>,
    pub segments: Arc<dyn SegmentRepository>,
    pub sessions: Arc<dyn SessionTracker>,
}

/// Result of a debounced load task
#[derive(Debug)]
struct LoadOutcome {
    token: LoadToken,
    result: reprise_engine::Result<PlaybackHandle>,
}

/// Something the coordinator has to react to; see
/// [`PlaybackCoordinator::next_inbound`].
#[derive(Debug)]
pub struct Inbound(InboundKind);

#[derive(Debug)]
enum InboundKind {
    Load(LoadOutcome),
    Callback(EngineCallback),
    Ended(LoadToken),
    EngineClosed,
}

pub struct PlaybackCoordinator {
    config: CoordinatorConfig,
    engine: EngineHandle,
    engine_events: EngineEvents,
    engine_closed: bool,
    library: Arc<dyn MediaLibrary>,
    sessions: Arc<dyn SessionTracker>,
    queue: PlaybackQueue,
    segments: SegmentStore,

    generation: Generation,
    inbox_tx: mpsc::UnboundedSender<LoadOutcome>,
    inbox_rx: mpsc::UnboundedReceiver<LoadOutcome>,
    load_task: Option<JoinHandle<()>>,
    playback: Option<PlaybackHandle>,
    phase: LoadPhase,

    current: Option<MediaFile>,
    current_time: f64,
    duration: Option<f64>,
    /// Resume target handed to the in-flight load
    resume_at: f64,
    loop_range: LoopRange,
    loop_enabled: bool,
    play_state: PlayState,
    autoplay_pending: bool,
    volume: f32,
    last_tick: Option<f64>,
    last_persisted: Option<f64>,

    pending_events: Vec<CoordinatorEvent>,
    shut_down: bool,
}

impl PlaybackCoordinator {
    pub fn new(
        engine: EngineHandle,
        engine_events: EngineEvents,
        collaborators: Collaborators,
        config: CoordinatorConfig,
    ) -> Self {
        let (inbox_tx, inbox_rx) = mpsc::unbounded_channel();
        let volume = config.volume.clamp(MIN_VOLUME, MAX_VOLUME);
        if engine.set_volume(volume).is_err() {
            warn!("Playback engine is not running");
        }

        Self {
            queue: PlaybackQueue::new(collaborators.folders, config.repeat_mode),
            segments: SegmentStore::new(collaborators.segments),
            library: collaborators.library,
            sessions: collaborators.sessions,
            loop_enabled: config.loop_enabled,
            volume,
            config,
            engine,
            engine_events,
            engine_closed: false,
            generation: Generation::new(),
            inbox_tx,
            inbox_rx,
            load_task: None,
            playback: None,
            phase: LoadPhase::Idle,
            current: None,
            current_time: 0.0,
            duration: None,
            resume_at: 0.0,
            loop_range: LoopRange::default(),
            play_state: PlayState::default(),
            autoplay_pending: false,
            last_tick: None,
            last_persisted: None,
            pending_events: Vec::new(),
            shut_down: false,
        }
    }

    // ===== Pumping =====

    /// Wait for the next load outcome, engine callback or end of media.
    ///
    /// Cancel-safe: dropping the future loses nothing.
    pub async fn next_inbound(&mut self) -> Inbound {
        let events_open = !self.engine_closed;
        let kind = tokio::select! {
            biased;
            Some(outcome) = self.inbox_rx.recv() => InboundKind::Load(outcome),
            callback = self.engine_events.recv(), if events_open => match callback {
                Some(callback) => InboundKind::Callback(callback),
                None => InboundKind::EngineClosed,
            },
            token = wait_for_end(&mut self.playback) => InboundKind::Ended(token),
        };
        Inbound(kind)
    }

    /// Apply something received from [`Self::next_inbound`]
    pub async fn handle(&mut self, inbound: Inbound) {
        match inbound.0 {
            InboundKind::Load(outcome) => self.on_load_outcome(outcome).await,
            InboundKind::Callback(callback) => self.on_callback(callback).await,
            InboundKind::Ended(token) => self.on_end_of_media(token).await,
            InboundKind::EngineClosed => {
                warn!("Playback engine stopped; callbacks will no longer arrive");
                self.engine_closed = true;
            }
        }
    }

    /// Receive and apply one inbound item
    pub async fn pump(&mut self) {
        let inbound = self.next_inbound().await;
        self.handle(inbound).await;
    }

    /// Keep pumping until `duration` has elapsed
    pub async fn pump_for(&mut self, duration: Duration) {
        let deadline = Instant::now() + duration;
        while let Ok(inbound) = tokio::time::timeout_at(deadline, self.next_inbound()).await {
            self.handle(inbound).await;
        }
    }

    /// Take the events queued since the last drain
    pub fn drain_events(&mut self) -> Vec<CoordinatorEvent> {
        std::mem::take(&mut self.pending_events)
    }

    // ===== Observable state =====

    pub fn snapshot(&self) -> PlaybackSnapshot {
        PlaybackSnapshot {
            file_id: self.current.as_ref().map(|f| f.id.clone()),
            title: self.current.as_ref().map(|f| f.title.clone()),
            phase: self.phase,
            current_time: self.current_time,
            duration: self.duration,
            is_playing: self.is_playing(),
            loop_range: self.loop_range,
            loop_enabled: self.loop_enabled,
            has_valid_loop_range: self.has_valid_loop_range(),
            current_segment: self.segments.current_id().cloned(),
            repeat_mode: self.queue.mode(),
            volume: self.volume,
            load_error: self.current.as_ref().and_then(|f| f.load_error.clone()),
        }
    }

    pub fn current_file(&self) -> Option<&MediaFile> {
        self.current.as_ref()
    }

    pub fn current_time(&self) -> f64 {
        self.current_time
    }

    pub fn duration(&self) -> Option<f64> {
        self.duration
    }

    pub fn is_playing(&self) -> bool {
        self.play_state.is_playing()
    }

    pub fn phase(&self) -> LoadPhase {
        self.phase
    }

    pub fn loop_range(&self) -> LoopRange {
        self.loop_range
    }

    pub fn loop_enabled(&self) -> bool {
        self.loop_enabled
    }

    pub fn has_valid_loop_range(&self) -> bool {
        self.loop_range.is_valid()
    }

    pub fn volume(&self) -> f32 {
        self.volume
    }

    pub fn repeat_mode(&self) -> RepeatMode {
        self.queue.mode()
    }

    pub fn segments(&self) -> &[Segment] {
        self.segments.segments()
    }

    pub fn current_segment(&self) -> Option<&Segment> {
        self.segments.current()
    }

    // ===== File selection =====

    /// Select a file and schedule a debounced load.
    ///
    /// Any in-flight load is cancelled and everything it might still report
    /// becomes stale. Returns once state is reset; the load completes later
    /// through [`Self::pump`].
    pub async fn select_file(&mut self, file_id: &FileId, options: SelectOptions) -> Result<()> {
        let file = self
            .library
            .file(file_id)
            .await?
            .ok_or_else(|| RepriseError::not_found("MediaFile", file_id.as_str()))?;

        // Outgoing file keeps its position
        self.persist_position(true).await;

        let token = self.generation.advance(file.id.clone());
        let resume_at = if options.from_start {
            0.0
        } else {
            file.resume_position()
        };
        info!(file = %file.id, token = %token, resume_at, "Selecting file");

        self.playback = None;
        self.duration = file.cached_duration;
        self.current_time = clamp_time(resume_at, self.duration);
        self.resume_at = self.current_time;
        self.last_tick = None;
        self.last_persisted = Some(self.current_time);
        self.loop_range.clear();
        self.autoplay_pending = options.autoplay;
        self.update_play_state(|state| *state = PlayState::default());
        if options.autoplay {
            self.update_play_state(|state| state.intend(true));
        }
        self.queue.set_current(file.id.clone(), file.folder.clone());

        let location = file.location.clone();
        self.emit(CoordinatorEvent::FileChanged {
            file_id: file.id.clone(),
        });
        self.emit(CoordinatorEvent::LoopChanged {
            range: self.loop_range,
        });
        self.emit(CoordinatorEvent::TimeUpdated {
            time: self.current_time,
        });
        if let Some(duration) = self.duration {
            self.emit(CoordinatorEvent::DurationChanged { duration });
        }
        self.current = Some(file);
        self.set_phase(LoadPhase::Loading);

        if let Err(e) = self.segments.load_for(file_id).await {
            warn!(file = %file_id, "Failed to load segments: {}", e);
            self.segments.clear();
        }
        self.emit(CoordinatorEvent::SegmentsChanged);
        self.emit(CoordinatorEvent::CurrentSegmentChanged { segment_id: None });

        self.spawn_load(token, location, self.resume_at);
        Ok(())
    }

    /// Select a user-chosen file with the configured autoplay behaviour
    pub async fn open(&mut self, file_id: &FileId) -> Result<()> {
        let options = SelectOptions {
            from_start: false,
            autoplay: self.config.autoplay_on_select,
        };
        self.select_file(file_id, options).await
    }

    fn spawn_load(&mut self, token: LoadToken, location: MediaLocation, resume_at: f64) {
        let previous = self.load_task.take();
        if let Some(previous) = &previous {
            previous.abort();
        }

        let engine = self.engine.clone();
        let inbox = self.inbox_tx.clone();
        let debounce = self.config.load_debounce();

        self.load_task = Some(tokio::spawn(async move {
            if let Some(previous) = previous {
                // Resolves as soon as the abort lands
                let _ = previous.await;
            }
            tokio::time::sleep(debounce).await;

            let result = match engine.teardown().await {
                Ok(()) => engine.load(location, resume_at, token.clone()).await,
                Err(e) => Err(e),
            };
            let _ = inbox.send(LoadOutcome { token, result });
        }));
    }

    /// Drop the current selection and release the engine resource
    pub async fn clear_selection(&mut self) {
        if let Some(task) = self.load_task.take() {
            task.abort();
        }
        self.persist_position(true).await;
        if self.is_playing() {
            self.sessions.persist_progress().await;
        }
        self.generation.clear();
        if let Err(e) = self.engine.teardown().await {
            debug!("Teardown on clear failed: {}", e);
        }

        self.playback = None;
        self.current = None;
        self.duration = None;
        self.current_time = 0.0;
        self.last_tick = None;
        self.last_persisted = None;
        self.autoplay_pending = false;
        self.loop_range.clear();
        self.update_play_state(|state| *state = PlayState::default());
        self.queue.clear_current();
        self.segments.clear();
        self.set_phase(LoadPhase::Idle);
        self.emit(CoordinatorEvent::LoopChanged {
            range: self.loop_range,
        });
        self.emit(CoordinatorEvent::SegmentsChanged);
    }

    async fn on_load_outcome(&mut self, outcome: LoadOutcome) {
        if !self.generation.admit(&outcome.token) {
            return;
        }
        self.load_task = None;
        let token = outcome.token;

        match outcome.result {
            Ok(handle) => {
                info!(token = %token, "Loaded");
                self.playback = Some(handle);
                self.set_phase(LoadPhase::Ready);

                let mut cleared_error = false;
                if let Some(file) = self.current.as_mut() {
                    cleared_error = file.load_error.take().is_some();
                }
                if cleared_error {
                    if let Err(e) = self.library.set_load_error(token.file_id(), None).await {
                        warn!(file = %token.file_id(), "Failed to clear load error: {}", e);
                    }
                }
                self.emit(CoordinatorEvent::Loaded {
                    file_id: token.file_id().clone(),
                });

                // A seek issued while loading overrides the resume point
                if (self.current_time - self.resume_at).abs() > f64::EPSILON {
                    let target = self.current_time;
                    self.jump_to(target).await;
                }

                if self.autoplay_pending {
                    self.autoplay_pending = false;
                    self.play().await;
                }
            }
            Err(e) => {
                let message = e.to_string();
                warn!(token = %token, "Load failed: {}", message);
                self.playback = None;
                self.autoplay_pending = false;
                self.update_play_state(|state| *state = PlayState::default());
                self.set_phase(LoadPhase::Failed);

                if let Some(file) = self.current.as_mut() {
                    file.load_error = Some(message.clone());
                }
                if let Err(e) = self
                    .library
                    .set_load_error(token.file_id(), Some(message.clone()))
                    .await
                {
                    warn!(file = %token.file_id(), "Failed to record load error: {}", e);
                }
                self.emit(CoordinatorEvent::LoadFailed {
                    file_id: token.file_id().clone(),
                    error: message,
                });
            }
        }
    }

    // ===== Transport =====

    /// Start playback. Returns whether the engine started (or, while a load
    /// is in flight, that playback will start once it completes).
    pub async fn play(&mut self) -> bool {
        match self.phase {
            LoadPhase::Loading => {
                self.autoplay_pending = true;
                self.update_play_state(|state| state.intend(true));
                return true;
            }
            LoadPhase::Idle | LoadPhase::Failed => return false,
            LoadPhase::Ready => {}
        }
        let Some(token) = self.generation.current().cloned() else {
            return false;
        };

        self.update_play_state(|state| state.intend(true));
        self.sessions.start_session_if_needed().await;

        let started = self.engine.play(&token).await;
        if started {
            self.last_tick = None;
            self.update_play_state(|state| state.confirm(true));
        } else {
            debug!(token = %token, "Engine refused to play");
            self.update_play_state(PlayState::reject);
        }
        started
    }

    pub async fn pause(&mut self) -> bool {
        match self.phase {
            LoadPhase::Loading => {
                self.autoplay_pending = false;
                self.update_play_state(|state| state.intend(false));
                return true;
            }
            LoadPhase::Idle | LoadPhase::Failed => return false,
            LoadPhase::Ready => {}
        }
        let Some(token) = self.generation.current().cloned() else {
            return false;
        };

        self.update_play_state(|state| state.intend(false));
        let paused = self.engine.pause(&token).await;
        if paused {
            self.update_play_state(|state| state.confirm(false));
        } else {
            self.update_play_state(PlayState::reject);
        }

        self.sessions.persist_progress().await;
        self.persist_position(true).await;
        paused
    }

    pub async fn toggle_play_pause(&mut self) -> bool {
        if self.is_playing() {
            self.pause().await
        } else {
            self.play().await
        }
    }

    /// Seek, returning the clamped target
    pub async fn seek(&mut self, time: f64) -> f64 {
        if self.current.is_none() {
            return self.current_time;
        }
        let target = self.jump_to(time).await;
        self.persist_position(false).await;
        target
    }

    /// Set volume, clamped to `[0, 2]`. Non-finite levels are ignored.
    pub fn set_volume(&mut self, level: f32) -> f32 {
        if !level.is_finite() {
            return self.volume;
        }
        let volume = level.clamp(MIN_VOLUME, MAX_VOLUME);
        if let Err(e) = self.engine.set_volume(volume) {
            warn!("Failed to set volume: {}", e);
        }
        if (volume - self.volume).abs() > f32::EPSILON {
            self.volume = volume;
            self.emit(CoordinatorEvent::VolumeChanged { volume });
        }
        volume
    }

    /// Move the playhead: optimistic local update, then the engine.
    async fn jump_to(&mut self, time: f64) -> f64 {
        let target = clamp_time(time, self.duration);
        self.current_time = target;
        self.last_tick = None;
        self.emit(CoordinatorEvent::TimeUpdated { time: target });

        if self.phase == LoadPhase::Ready {
            if let Some(token) = self.generation.current().cloned() {
                if self.engine.seek(&token, target).await {
                    self.discard_queued_ticks().await;
                }
            }
        }
        target
    }

    /// Samples queued before a seek was applied describe the old position.
    async fn discard_queued_ticks(&mut self) {
        while let Ok(callback) = self.engine_events.try_recv() {
            if !self.generation.admit(&callback.token) {
                continue;
            }
            match callback.payload {
                EngineEvent::Tick(time) => trace!(time, "Discarding pre-seek sample"),
                EngineEvent::DurationLoaded(duration) => self.on_duration(duration).await,
                EngineEvent::PlaybackStateChanged(playing) => {
                    self.update_play_state(|state| state.confirm(playing));
                }
            }
        }
    }

    // ===== Engine callbacks =====

    async fn on_callback(&mut self, callback: EngineCallback) {
        if !self.generation.admit(&callback.token) {
            return;
        }
        match callback.payload {
            EngineEvent::DurationLoaded(duration) => self.on_duration(duration).await,
            EngineEvent::Tick(time) => {
                self.on_time_update(time).await;
                self.on_loop_check(time).await;
            }
            EngineEvent::PlaybackStateChanged(playing) => {
                trace!(playing, "Engine reported play state");
                self.update_play_state(|state| state.confirm(playing));
            }
        }
    }

    async fn on_duration(&mut self, duration: f64) {
        self.duration = Some(duration);
        self.emit(CoordinatorEvent::DurationChanged { duration });

        if let Some(file) = self.current.as_mut() {
            if file.cached_duration != Some(duration) {
                file.cached_duration = Some(duration);
                if let Err(e) = self.library.update_cached_duration(&file.id, duration).await {
                    warn!(file = %file.id, "Failed to cache duration: {}", e);
                }
            }
        }

        let clamped = clamp_time(self.current_time, self.duration);
        if clamped != self.current_time {
            self.current_time = clamped;
            self.emit(CoordinatorEvent::TimeUpdated { time: clamped });
        }
    }

    async fn on_time_update(&mut self, time: f64) {
        let previous = self.last_tick.replace(time);
        if self.play_state.is_playing() {
            if let Some(previous) = previous {
                let delta = time - previous;
                if delta > 0.0 && delta <= self.config.max_listening_delta {
                    self.sessions.add_listening_time(delta).await;
                }
            }
        }

        if time != self.current_time {
            self.current_time = time;
            self.emit(CoordinatorEvent::TimeUpdated { time });
        }
        self.persist_position(false).await;
    }

    async fn on_loop_check(&mut self, time: f64) {
        if !self.loop_enabled || !self.loop_range.has_passed_end(time) {
            return;
        }
        let Some((start, end)) = self.loop_range.bounds() else {
            return;
        };
        debug!(time, start, end, "Loop boundary reached");
        let was_playing = self.play_state.is_playing();
        let to = self.jump_to(start).await;
        self.emit(CoordinatorEvent::LoopWrapped { to });

        // B at the media end: the engine paused in the same sample
        if was_playing && !self.play_state.is_playing() {
            debug!(start, "Media ended at loop end; resuming from A");
            self.play().await;
        }
    }

    async fn on_end_of_media(&mut self, token: LoadToken) {
        if !self.generation.admit(&token) {
            return;
        }
        let file_id = token.file_id().clone();

        if self.loop_enabled {
            if let Some((start, _)) = self.loop_range.bounds() {
                debug!(file = %file_id, start, "End of media inside loop; wrapping");
                let to = self.jump_to(start).await;
                self.emit(CoordinatorEvent::LoopWrapped { to });
                self.play().await;
                return;
            }
        }

        let mode = self.queue.mode();
        info!(file = %file_id, mode = %mode, "End of media");

        let now = Utc::now();
        if let Some(file) = self.current.as_mut() {
            file.record.record_completion(now);
        }
        if let Err(e) = self.library.record_completion(&file_id, now).await {
            warn!(file = %file_id, "Failed to record completion: {}", e);
        }
        if let Some(duration) = self.duration {
            self.current_time = duration;
        }
        self.persist_position(true).await;
        self.emit(CoordinatorEvent::FileFinished {
            file_id: file_id.clone(),
        });

        match mode {
            RepeatMode::Off => self.stop_at_end().await,
            RepeatMode::RepeatOne => {
                self.jump_to(0.0).await;
                self.play().await;
            }
            RepeatMode::RepeatAll | RepeatMode::Shuffle | RepeatMode::AutoPlayNext => {
                match self.queue.next_file().await {
                    Ok(Some(next)) => {
                        info!(from = %file_id, to = %next, mode = %mode, "Advancing queue");
                        let options = SelectOptions::queue_advance();
                        if let Err(e) = self.select_file(&next, options).await {
                            warn!(file = %next, "Failed to advance queue: {}", e);
                            self.stop_at_end().await;
                        }
                    }
                    Ok(None) => {
                        info!(mode = %mode, "Queue finished");
                        self.stop_at_end().await;
                        self.emit(CoordinatorEvent::QueueFinished);
                    }
                    Err(e) => {
                        warn!("Failed to list folder: {}", e);
                        self.stop_at_end().await;
                    }
                }
            }
        }
    }

    async fn stop_at_end(&mut self) {
        self.update_play_state(|state| state.confirm(false));
        self.sessions.persist_progress().await;
    }

    // ===== Loop points =====

    /// Set A at the current time
    pub fn set_point_a(&mut self) -> LoopEdit {
        let edit = self.loop_range.set_point_a(self.current_time);
        self.emit(CoordinatorEvent::LoopChanged {
            range: self.loop_range,
        });
        edit
    }

    /// Set B at the current time; anchors A instead when A is unset
    pub fn set_point_b(&mut self) -> LoopEdit {
        let edit = self.loop_range.set_point_b(self.current_time);
        if edit != LoopEdit::Rejected {
            self.emit(CoordinatorEvent::LoopChanged {
                range: self.loop_range,
            });
        }
        edit
    }

    pub fn clear_loop(&mut self) {
        self.loop_range.clear();
        self.emit(CoordinatorEvent::LoopChanged {
            range: self.loop_range,
        });
    }

    pub fn set_loop_enabled(&mut self, enabled: bool) {
        if self.loop_enabled != enabled {
            self.loop_enabled = enabled;
            self.emit(CoordinatorEvent::LoopEnabledChanged { enabled });
        }
    }

    pub fn toggle_loop_enabled(&mut self) -> bool {
        self.set_loop_enabled(!self.loop_enabled);
        self.loop_enabled
    }

    // ===== Segments =====

    /// Save the current A-B range as a segment.
    ///
    /// Returns `None` without side effects when the range is not valid.
    pub async fn save_segment(&mut self, label: Option<String>) -> Result<Option<Segment>> {
        if self.current.is_none() {
            return Err(PlaybackError::NoFileSelected);
        }
        let start = self.loop_range.point_a().unwrap_or(0.0);
        let end = self.loop_range.point_b().unwrap_or(start);

        match self.segments.save(label, start, end).await {
            Ok(outcome) => {
                if matches!(outcome, SaveOutcome::Created(_)) {
                    self.emit(CoordinatorEvent::SegmentsChanged);
                }
                let segment = outcome.segment().clone();
                self.emit(CoordinatorEvent::CurrentSegmentChanged {
                    segment_id: Some(segment.id.clone()),
                });
                Ok(Some(segment))
            }
            Err(PlaybackError::Core(RepriseError::InvalidRange { start, end })) => {
                debug!(start, end, "Not saving invalid range");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// Jump to a segment and loop it
    pub async fn select_segment(&mut self, id: &SegmentId) -> bool {
        let Some(segment) = self.segments.select(id).cloned() else {
            return false;
        };
        self.apply_segment(segment).await;
        true
    }

    pub async fn next_segment(&mut self) -> Option<Segment> {
        self.step_segment(Direction::Next).await
    }

    pub async fn prev_segment(&mut self) -> Option<Segment> {
        self.step_segment(Direction::Previous).await
    }

    async fn step_segment(&mut self, direction: Direction) -> Option<Segment> {
        let segment = self.segments.navigate(direction).cloned()?;
        self.apply_segment(segment.clone()).await;
        Some(segment)
    }

    /// Loop points from the segment, seek to its start, make sure it plays
    async fn apply_segment(&mut self, segment: Segment) {
        debug!(segment = %segment.id, label = %segment.label, "Applying segment");
        self.loop_range = LoopRange::new(Some(segment.start_time), Some(segment.end_time));
        self.emit(CoordinatorEvent::LoopChanged {
            range: self.loop_range,
        });
        self.emit(CoordinatorEvent::CurrentSegmentChanged {
            segment_id: Some(segment.id.clone()),
        });

        self.seek(segment.start_time).await;
        if !self.is_playing() {
            self.play().await;
        }
    }

    pub async fn delete_segment(&mut self, id: &SegmentId) -> Result<bool> {
        let before = self.segments.current_id().cloned();
        let removed = self.segments.delete(id).await?;
        if removed.is_none() {
            return Ok(false);
        }
        self.emit(CoordinatorEvent::SegmentsChanged);
        let after = self.segments.current_id().cloned();
        if before != after {
            self.emit(CoordinatorEvent::CurrentSegmentChanged { segment_id: after });
        }
        Ok(true)
    }

    pub async fn rename_segment(&mut self, id: &SegmentId, label: &str) -> Result<bool> {
        let renamed = self.segments.rename(id, label).await?;
        if renamed {
            self.emit(CoordinatorEvent::SegmentsChanged);
        }
        Ok(renamed)
    }

    // ===== Queue =====

    pub fn set_loop_mode(&mut self, mode: RepeatMode) {
        if self.queue.mode() != mode {
            self.queue.set_mode(mode);
            self.emit(CoordinatorEvent::RepeatModeChanged { mode });
        }
    }

    /// Skip to the next file in the folder, without wrapping
    pub async fn play_next_in_queue(&mut self) -> Result<Option<FileId>> {
        self.skip(Direction::Next).await
    }

    /// Skip to the previous file in the folder, without wrapping
    pub async fn play_prev_in_queue(&mut self) -> Result<Option<FileId>> {
        self.skip(Direction::Previous).await
    }

    async fn skip(&mut self, direction: Direction) -> Result<Option<FileId>> {
        let Some(target) = self.queue.neighbour(direction).await? else {
            return Ok(None);
        };
        let options = SelectOptions {
            from_start: false,
            autoplay: self.is_playing(),
        };
        self.select_file(&target, options).await?;
        Ok(Some(target))
    }

    // ===== Lifecycle =====

    /// Tear down the engine resource, flush progress and end the session
    pub async fn shutdown(mut self) {
        if let Some(task) = self.load_task.take() {
            task.abort();
        }
        self.persist_position(true).await;
        self.sessions.persist_progress().await;
        if let Err(e) = self.engine.teardown().await {
            debug!("Teardown on shutdown failed: {}", e);
        }
        self.sessions.end_session_if_idle().await;
        self.shut_down = true;
        info!("Playback coordinator shut down");
    }

    // ===== Internals =====

    async fn persist_position(&mut self, force: bool) {
        let Some(file) = self.current.as_mut() else {
            return;
        };
        let position = self.current_time;
        if !force {
            if let Some(last) = self.last_persisted {
                if (position - last).abs() < self.config.position_persist_interval {
                    return;
                }
            }
        }
        self.last_persisted = Some(position);
        file.playback_position = position;
        if let Err(e) = self.library.update_playback_position(&file.id, position).await {
            warn!(file = %file.id, "Failed to persist position: {}", e);
        }
    }

    fn update_play_state(&mut self, change: impl FnOnce(&mut PlayState)) {
        let before = self.play_state.is_playing();
        change(&mut self.play_state);
        let after = self.play_state.is_playing();
        if before != after {
            self.emit(CoordinatorEvent::PlayingChanged { playing: after });
        }
    }

    fn set_phase(&mut self, phase: LoadPhase) {
        if self.phase != phase {
            self.phase = phase;
            self.emit(CoordinatorEvent::PhaseChanged { phase });
        }
    }

    fn emit(&mut self, event: CoordinatorEvent) {
        self.pending_events.push(event);
    }
}

impl Drop for PlaybackCoordinator {
    fn drop(&mut self) {
        if self.shut_down {
            return;
        }
        if let Some(task) = self.load_task.take() {
            task.abort();
        }
        self.engine.fire_teardown();
    }
}

async fn wait_for_end(playback: &mut Option<PlaybackHandle>) -> LoadToken {
    match playback {
        Some(handle) => {
            handle.ended().await;
            handle.token().clone()
        }
        None => std::future::pending().await,
    }
}
