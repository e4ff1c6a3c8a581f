//! Core types for playback coordination

use reprise_core::RepeatMode;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for the playback coordinator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoordinatorConfig {
    /// Delay before a selected file is actually loaded (default: 120 ms)
    pub load_debounce_ms: u64,

    /// Minimum position change in seconds between persisted positions
    /// (default: 1.0)
    pub position_persist_interval: f64,

    /// Largest tick-to-tick delta counted as listening time (default: 1.0)
    pub max_listening_delta: f64,

    /// Start playing when the user selects a file (default: false)
    pub autoplay_on_select: bool,

    /// Whether a valid A-B range is enforced (default: true)
    pub loop_enabled: bool,

    /// Initial volume, 0.0 to 2.0 (default: 1.0)
    pub volume: f32,

    /// Initial repeat mode (default: none)
    pub repeat_mode: RepeatMode,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            load_debounce_ms: 120,
            position_persist_interval: 1.0,
            max_listening_delta: 1.0,
            autoplay_on_select: false,
            loop_enabled: true,
            volume: 1.0,
            repeat_mode: RepeatMode::Off,
        }
    }
}

impl CoordinatorConfig {
    pub fn load_debounce(&self) -> Duration {
        Duration::from_millis(self.load_debounce_ms)
    }
}

/// Volume bounds: silent to 200%
pub const MIN_VOLUME: f32 = 0.0;
pub const MAX_VOLUME: f32 = 2.0;

/// Options for selecting a file
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SelectOptions {
    /// Ignore the stored resume position
    pub from_start: bool,
    /// Start playing once loaded
    pub autoplay: bool,
}

impl SelectOptions {
    /// Queue-driven transition: from the top, playing
    pub fn queue_advance() -> Self {
        Self {
            from_start: true,
            autoplay: true,
        }
    }
}

/// Direction for queue and segment stepping
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Next,
    Previous,
}

/// Optimistic play/pause flag.
///
/// `intended` is set the moment a command is issued; `confirmed` is what
/// the engine last reported. The observable value prefers the intent until
/// the engine confirms or rejects it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlayState {
    intended: Option<bool>,
    confirmed: bool,
}

impl PlayState {
    pub fn is_playing(&self) -> bool {
        self.intended.unwrap_or(self.confirmed)
    }

    pub fn intend(&mut self, playing: bool) {
        self.intended = Some(playing);
    }

    /// Engine reported an actual state
    pub fn confirm(&mut self, playing: bool) {
        self.confirmed = playing;
        self.intended = None;
    }

    /// Command failed; fall back to the last confirmed state
    pub fn reject(&mut self) {
        self.intended = None;
    }

    pub fn is_pending(&self) -> bool {
        self.intended.is_some()
    }
}

/// Lifecycle of the current file slot
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum LoadPhase {
    /// Nothing selected
    #[default]
    Idle,
    /// Selected, load in flight
    Loading,
    /// Loaded and controllable
    Ready,
    /// Last load failed; a new selection may retry
    Failed,
}
