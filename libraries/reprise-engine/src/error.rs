/// Playback engine errors
use thiserror::Error;

/// Result type for engine operations
pub type Result<T> = std::result::Result<T, EngineError>;

/// Engine errors
#[derive(Debug, Error)]
pub enum EngineError {
    /// File missing or access denied
    #[error("Resource unavailable: {0}")]
    ResourceUnavailable(String),

    /// Container could not be probed
    #[error("Failed to probe media: {0}")]
    Probe(String),

    /// Operation needs a loaded resource
    #[error("Nothing is loaded")]
    NothingLoaded,

    /// The engine task has exited
    #[error("Playback engine is no longer running")]
    EngineGone,
}

impl From<EngineError> for reprise_core::RepriseError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::ResourceUnavailable(msg) => Self::ResourceUnavailable(msg),
            other => Self::Playback(other.to_string()),
        }
    }
}
