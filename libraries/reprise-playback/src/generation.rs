//! Load-generation guard
//!
//! Every selection advances the generation. Engine callbacks and load
//! outcomes pass through [`Generation::admit`] and are discarded unless
//! they carry the current token.

use reprise_core::FileId;
use reprise_engine::LoadToken;
use tracing::trace;

#[derive(Debug, Default)]
pub struct Generation {
    counter: u64,
    current: Option<LoadToken>,
}

impl Generation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new generation for `file_id`
    pub fn advance(&mut self, file_id: FileId) -> LoadToken {
        self.counter += 1;
        let token = LoadToken::new(file_id, self.counter);
        self.current = Some(token.clone());
        token
    }

    pub fn current(&self) -> Option<&LoadToken> {
        self.current.as_ref()
    }

    /// Whether `token` belongs to the current generation
    pub fn admit(&self, token: &LoadToken) -> bool {
        let admitted = self.current.as_ref() == Some(token);
        if !admitted {
            trace!(token = %token, "Dropping stale callback");
        }
        admitted
    }

    /// Forget the current generation; everything in flight becomes stale
    pub fn clear(&mut self) {
        self.current = None;
    }
}
