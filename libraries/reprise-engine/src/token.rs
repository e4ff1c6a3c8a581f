//! Load-generation tokens
//!
//! Every load is stamped with a [`LoadToken`]. Commands aimed at a loaded
//! resource and every callback coming back from the engine carry the token
//! in a [`Tagged`] wrapper, so either side can discard traffic that belongs
//! to a superseded load.

use reprise_core::FileId;
use std::fmt;

/// Identifies one load of one file
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LoadToken {
    file_id: FileId,
    generation: u64,
}

impl LoadToken {
    pub fn new(file_id: FileId, generation: u64) -> Self {
        Self {
            file_id,
            generation,
        }
    }

    pub fn file_id(&self) -> &FileId {
        &self.file_id
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}

impl fmt::Display for LoadToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.file_id, self.generation)
    }
}

/// A payload bound to the load it belongs to
#[derive(Debug, Clone, PartialEq)]
pub struct Tagged<T> {
    pub token: LoadToken,
    pub payload: T,
}

impl<T> Tagged<T> {
    pub fn new(token: LoadToken, payload: T) -> Self {
        Self { token, payload }
    }

    /// Whether this belongs to `current`
    pub fn is_for(&self, current: Option<&LoadToken>) -> bool {
        current == Some(&self.token)
    }

    pub fn into_payload(self) -> T {
        self.payload
    }
}
