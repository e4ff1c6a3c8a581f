//! Reprise - Playback Coordination
//!
//! This crate provides:
//! - The playback coordinator: observable state, optimistic play/pause,
//!   debounced cancellable loads, A-B loop enforcement, end-of-media policy
//! - A folder-scoped play queue with five repeat modes
//! - A segment store keeping saved ranges contiguously indexed
//! - A generation guard that drops callbacks from superseded loads
//!
//! # Architecture
//!
//! The coordinator never touches the media resource. It talks to a
//! `reprise_engine::EngineHandle` and applies engine callbacks when its
//! owner pumps it:
//!
//! ```rust,no_run
//! use reprise_engine::{ClockBackend, EngineConfig, PlaybackEngine};
//! use reprise_playback::{Collaborators, CoordinatorConfig, PlaybackCoordinator};
//! # use reprise_core::FileId;
//!
//! # async fn demo(collaborators: Collaborators, file: FileId) -> reprise_playback::Result<()> {
//! let (engine, events) = PlaybackEngine::spawn(
//!     Box::new(ClockBackend::probing()),
//!     EngineConfig::default(),
//! );
//! let mut coordinator =
//!     PlaybackCoordinator::new(engine, events, collaborators, CoordinatorConfig::default());
//!
//! coordinator.open(&file).await?;
//! coordinator.play().await;
//!
//! loop {
//!     coordinator.pump().await;
//!     for event in coordinator.drain_events() {
//!         println!("{event:?}");
//!     }
//! }
//! # }
//! ```

mod coordinator;
mod error;
mod events;
mod generation;
pub mod queue;
mod segments;
mod shuffle;
pub mod types;

// Public exports
pub use coordinator::{Collaborators, Inbound, PlaybackCoordinator};
pub use error::{PlaybackError, Result};
pub use events::{CoordinatorEvent, PlaybackSnapshot};
pub use generation::Generation;
pub use queue::PlaybackQueue;
pub use segments::{SaveOutcome, SegmentStore};
pub use types::{CoordinatorConfig, Direction, LoadPhase, PlayState, SelectOptions};
