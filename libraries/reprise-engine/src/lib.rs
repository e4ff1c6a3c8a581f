//! Reprise Playback Engine
//!
//! Background-isolated owner of the single media playback resource.
//!
//! # Architecture
//!
//! - [`PlaybackEngine`] runs as a tokio task that exclusively owns a
//!   [`MediaBackend`]. All operations are serialized through its command
//!   channel.
//! - [`EngineHandle`] is the cloneable, async client used by callers.
//! - Callbacks ([`EngineEvent`]) come back tagged with the [`LoadToken`] of
//!   the load they belong to.
//! - [`ClockBackend`] is a headless backend that advances a clock while
//!   playing and probes container durations with Symphonia.
//!
//! # Example
//!
//! ```rust,no_run
//! use reprise_core::{FileId, MediaLocation};
//! use reprise_engine::{ClockBackend, EngineConfig, LoadToken, PlaybackEngine};
//!
//! # async fn demo() -> reprise_engine::Result<()> {
//! let (engine, mut events) = PlaybackEngine::spawn(
//!     Box::new(ClockBackend::probing()),
//!     EngineConfig::default(),
//! );
//!
//! let token = LoadToken::new(FileId::new("lecture"), 1);
//! let handle = engine
//!     .load(MediaLocation::new("/audio/lecture.mp3"), 45.0, token.clone())
//!     .await?;
//! engine.play(&token).await;
//!
//! while let Some(callback) = events.recv().await {
//!     println!("{:?}", callback.payload);
//! }
//! # drop(handle);
//! # Ok(())
//! # }
//! ```

pub mod access;
pub mod backend;
mod config;
mod engine;
mod error;
pub mod probe;
mod token;

pub use backend::{ClockBackend, DurationSource, MediaBackend};
pub use config::EngineConfig;
pub use engine::{
    Control, EngineCallback, EngineCommand, EngineEvent, EngineEvents, EngineHandle,
    LoadRequest, PlaybackEngine, PlaybackHandle,
};
pub use error::{EngineError, Result};
pub use token::{LoadToken, Tagged};
