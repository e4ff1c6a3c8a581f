//! Headless clock backend
//!
//! Renders nothing: elapsed time advances on a monotonic clock while
//! "playing". Duration comes either from a fixed value or from a Symphonia
//! probe running on a background thread, so `open` never blocks on I/O.

use super::MediaBackend;
use crate::error::Result;
use crate::probe::probe_duration;
use crossbeam_channel::{bounded, Receiver, TryRecvError};
use reprise_core::{clamp_time, MediaLocation};
use std::path::PathBuf;
use tokio::time::Instant;
use tracing::{debug, warn};

/// Where the clock backend gets durations from
#[derive(Debug, Clone, PartialEq)]
pub enum DurationSource {
    /// Every file lasts this many seconds and is ready immediately
    Fixed(f64),
    /// Read the container headers on a background thread
    Probe,
}

enum DurationState {
    Known(Option<f64>),
    Probing(Receiver<Result<Option<f64>>>),
}

struct Opened {
    path: PathBuf,
    duration: DurationState,
    /// Position at the last play/pause/seek
    base: f64,
    /// Set while playing
    started_at: Option<Instant>,
}

impl Opened {
    fn known_duration(&self) -> Option<f64> {
        match self.duration {
            DurationState::Known(d) => d,
            DurationState::Probing(_) => None,
        }
    }

    fn position(&self) -> f64 {
        let elapsed = self
            .started_at
            .map(|at| at.elapsed().as_secs_f64())
            .unwrap_or(0.0);
        clamp_time(self.base + elapsed, self.known_duration())
    }
}

/// Media backend driven by a monotonic clock
pub struct ClockBackend {
    source: DurationSource,
    opened: Option<Opened>,
    volume: f32,
}

impl ClockBackend {
    pub fn new(source: DurationSource) -> Self {
        Self {
            source,
            opened: None,
            volume: 1.0,
        }
    }

    /// Every file lasts `seconds`
    pub fn fixed(seconds: f64) -> Self {
        Self::new(DurationSource::Fixed(seconds))
    }

    /// Durations are probed from the files themselves
    pub fn probing() -> Self {
        Self::new(DurationSource::Probe)
    }

    pub fn volume(&self) -> f32 {
        self.volume
    }

    fn poll_probe(opened: &mut Opened) {
        let DurationState::Probing(rx) = &opened.duration else {
            return;
        };
        match rx.try_recv() {
            Ok(Ok(duration)) => {
                debug!(path = %opened.path.display(), ?duration, "Duration probed");
                opened.duration = DurationState::Known(duration);
            }
            Ok(Err(e)) => {
                warn!(path = %opened.path.display(), "Duration probe failed: {}", e);
                opened.duration = DurationState::Known(None);
            }
            Err(TryRecvError::Empty) => {}
            Err(TryRecvError::Disconnected) => {
                opened.duration = DurationState::Known(None);
            }
        }
    }
}

impl MediaBackend for ClockBackend {
    fn open(&mut self, location: &MediaLocation) -> Result<()> {
        self.close();

        let duration = match &self.source {
            DurationSource::Fixed(seconds) => DurationState::Known(Some(*seconds)),
            DurationSource::Probe => {
                let (tx, rx) = bounded(1);
                let path = location.path().to_path_buf();
                std::thread::spawn(move || {
                    let _ = tx.send(probe_duration(&path));
                });
                DurationState::Probing(rx)
            }
        };

        self.opened = Some(Opened {
            path: location.path().to_path_buf(),
            duration,
            base: 0.0,
            started_at: None,
        });
        Ok(())
    }

    fn duration(&mut self) -> Option<f64> {
        let opened = self.opened.as_mut()?;
        Self::poll_probe(opened);
        opened.known_duration()
    }

    fn is_ready(&self) -> bool {
        matches!(
            self.opened,
            Some(Opened {
                duration: DurationState::Known(_),
                ..
            })
        )
    }

    fn position(&self) -> f64 {
        self.opened.as_ref().map(Opened::position).unwrap_or(0.0)
    }

    fn play(&mut self) -> bool {
        let Some(opened) = self.opened.as_mut() else {
            return false;
        };
        if opened.started_at.is_none() {
            opened.started_at = Some(Instant::now());
        }
        true
    }

    fn pause(&mut self) {
        if let Some(opened) = self.opened.as_mut() {
            opened.base = opened.position();
            opened.started_at = None;
        }
    }

    fn is_playing(&self) -> bool {
        self.opened
            .as_ref()
            .is_some_and(|o| o.started_at.is_some())
    }

    fn seek(&mut self, time: f64) -> bool {
        let Some(opened) = self.opened.as_mut() else {
            return false;
        };
        opened.base = clamp_time(time, opened.known_duration());
        if opened.started_at.is_some() {
            opened.started_at = Some(Instant::now());
        }
        true
    }

    fn set_volume(&mut self, level: f32) {
        self.volume = level;
    }

    fn reached_end(&self) -> bool {
        self.opened.as_ref().is_some_and(|o| {
            matches!(o.known_duration(), Some(d) if d > 0.0 && o.position() >= d)
        })
    }

    fn close(&mut self) {
        if let Some(opened) = self.opened.take() {
            debug!(path = %opened.path.display(), "Closed");
        }
    }
}
