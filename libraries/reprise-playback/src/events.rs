//! Coordinator events
//!
//! Observable state changes are queued as events; the front end drains
//! them after each pump of the coordinator.

use crate::types::LoadPhase;
use reprise_core::{FileId, LoopRange, RepeatMode, SegmentId};
use serde::{Deserialize, Serialize};

/// Events emitted by the playback coordinator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CoordinatorEvent {
    /// A new file was selected and is loading
    FileChanged { file_id: FileId },

    /// The selected file finished loading
    Loaded { file_id: FileId },

    /// The selected file could not be loaded
    LoadFailed { file_id: FileId, error: String },

    /// Duration became known
    DurationChanged { duration: f64 },

    /// Current time moved (tick, seek or loop correction)
    TimeUpdated { time: f64 },

    /// Observable play/pause flag changed
    PlayingChanged { playing: bool },

    /// A loop point was set or cleared
    LoopChanged { range: LoopRange },

    /// Loop enforcement switched on or off
    LoopEnabledChanged { enabled: bool },

    /// Playback jumped back to A at the end of the range
    LoopWrapped { to: f64 },

    /// Segment list changed (load, save, delete, rename)
    SegmentsChanged,

    /// Current segment changed
    CurrentSegmentChanged { segment_id: Option<SegmentId> },

    /// The current file played to its end
    FileFinished { file_id: FileId },

    /// End of media with nothing left to play
    QueueFinished,

    VolumeChanged { volume: f32 },

    RepeatModeChanged { mode: RepeatMode },

    PhaseChanged { phase: LoadPhase },
}

/// Observable coordinator state at one instant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaybackSnapshot {
    pub file_id: Option<FileId>,
    pub title: Option<String>,
    pub phase: LoadPhase,
    pub current_time: f64,
    pub duration: Option<f64>,
    pub is_playing: bool,
    pub loop_range: LoopRange,
    pub loop_enabled: bool,
    pub has_valid_loop_range: bool,
    pub current_segment: Option<SegmentId>,
    pub repeat_mode: RepeatMode,
    pub volume: f32,
    pub load_error: Option<String>,
}
