//! Media backends
//!
//! A backend is the platform primitive that actually renders a file. The
//! engine task is its only owner, so implementations need `Send` but not
//! `Sync` and never see concurrent calls.

mod clock;

pub use clock::{ClockBackend, DurationSource};

use crate::error::Result;
use reprise_core::MediaLocation;

/// Platform playback primitive driven by the engine
pub trait MediaBackend: Send {
    /// Open `location`, replacing anything previously opened
    ///
    /// # Errors
    /// Returns an error if the resource cannot be opened
    fn open(&mut self, location: &MediaLocation) -> Result<()>;

    /// Duration in seconds, once known. Polled every sample until `Some`.
    fn duration(&mut self) -> Option<f64>;

    /// Whether the resource accepts seeks
    fn is_ready(&self) -> bool;

    /// Elapsed time in seconds
    fn position(&self) -> f64;

    /// Start or resume. Returns false if nothing startable is open.
    fn play(&mut self) -> bool;

    fn pause(&mut self);

    fn is_playing(&self) -> bool;

    /// Jump to `time`, already clamped by the engine
    fn seek(&mut self, time: f64) -> bool;

    fn set_volume(&mut self, level: f32);

    /// Whether playback has reached the end of the media
    fn reached_end(&self) -> bool;

    /// Release the opened resource. Safe to call repeatedly.
    fn close(&mut self);
}
