//! Exclusive file-access grants
//!
//! A grant is acquired before a file is handed to the backend and held for
//! as long as the resource is loaded. Dropping it releases access.

use crate::error::{EngineError, Result};
use reprise_core::MediaLocation;
use std::fs::File;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::trace;

/// Proof that a media file could be opened for reading
#[derive(Debug)]
pub struct AccessGrant {
    path: PathBuf,
    _handle: File,
}

impl AccessGrant {
    /// Acquire read access to `location`
    ///
    /// # Errors
    /// `ResourceUnavailable` when the file is missing, is a directory or
    /// cannot be opened.
    pub fn acquire(location: &MediaLocation) -> Result<Self> {
        let path = location.path();
        let handle = File::open(path).map_err(|e| unavailable(path, &e))?;
        let meta = handle.metadata().map_err(|e| unavailable(path, &e))?;
        if meta.is_dir() {
            return Err(EngineError::ResourceUnavailable(format!(
                "{} is a directory",
                path.display()
            )));
        }
        trace!(path = %path.display(), "Access granted");
        Ok(Self {
            path: path.to_path_buf(),
            _handle: handle,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for AccessGrant {
    fn drop(&mut self) {
        trace!(path = %self.path.display(), "Access released");
    }
}

fn unavailable(path: &Path, err: &std::io::Error) -> EngineError {
    let reason = match err.kind() {
        ErrorKind::NotFound => "file not found".to_string(),
        ErrorKind::PermissionDenied => "access denied".to_string(),
        _ => err.to_string(),
    };
    EngineError::ResourceUnavailable(format!("{}: {}", path.display(), reason))
}
