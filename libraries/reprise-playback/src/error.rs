//! Error types for playback coordination

use reprise_core::RepriseError;
use reprise_engine::EngineError;
use thiserror::Error;

/// Playback errors
#[derive(Debug, Error)]
pub enum PlaybackError {
    /// Operation needs a selected file
    #[error("No file selected")]
    NoFileSelected,

    /// Collaborator failure (library, segments, listing)
    #[error(transparent)]
    Core(#[from] RepriseError),

    /// Engine failure
    #[error(transparent)]
    Engine(#[from] EngineError),
}

/// Result type for playback operations
pub type Result<T> = std::result::Result<T, PlaybackError>;
