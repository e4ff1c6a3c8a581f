/// Core error types for Reprise
use thiserror::Error;

/// Result type alias using `RepriseError`
pub type Result<T> = std::result::Result<T, RepriseError>;

/// Core error type for Reprise
#[derive(Error, Debug)]
pub enum RepriseError {
    /// Media file is missing or access to it was denied
    #[error("Resource unavailable: {0}")]
    ResourceUnavailable(String),

    /// A time range whose end is not strictly after its start
    #[error("Invalid range: start {start:.3}s must be before end {end:.3}s")]
    InvalidRange { start: f64, end: f64 },

    /// Entity not found
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// Playback engine failures
    #[error("Playback error: {0}")]
    Playback(String),

    /// Storage-related errors
    #[error("Storage error: {0}")]
    Storage(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// I/O errors
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Database errors (for storage implementations)
    #[error("Database error: {0}")]
    Database(String),
}

impl RepriseError {
    /// Create a storage error
    pub fn storage(msg: impl Into<String>) -> Self {
        Self::Storage(msg.into())
    }

    /// Create a not found error
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    /// Create a resource unavailable error
    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self::ResourceUnavailable(msg.into())
    }

    /// Create an invalid input error
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }
}

#[cfg(feature = "sqlx-support")]
impl From<sqlx::Error> for RepriseError {
    fn from(err: sqlx::Error) -> Self {
        Self::Database(err.to_string())
    }
}
