//! Folder-scoped play queue
//!
//! Sequencing policy only: given the ordered files of the current folder
//! and a repeat mode, decide what comes next. The file list is fetched
//! from the [`FolderListing`] on every query and never cached.

use crate::error::Result;
use crate::shuffle::pick_other;
use crate::types::Direction;
use rand::Rng;
use reprise_core::{FileId, FolderId, FolderListing, RepeatMode};
use std::sync::Arc;
use tracing::debug;

/// File to play after `current` ends under `mode`.
///
/// `Off` and `RepeatOne` never consult the folder and yield `None`. When
/// `current` is not in the list the sequence starts from the first file.
pub fn next_after<R: Rng + ?Sized>(
    files: &[FileId],
    current: Option<&FileId>,
    mode: RepeatMode,
    rng: &mut R,
) -> Option<FileId> {
    if files.is_empty() {
        return None;
    }
    let position = current.and_then(|c| files.iter().position(|f| f == c));

    match mode {
        RepeatMode::Off | RepeatMode::RepeatOne => None,
        RepeatMode::RepeatAll => {
            let next = position.map_or(0, |i| (i + 1) % files.len());
            files.get(next).cloned()
        }
        RepeatMode::AutoPlayNext => {
            let next = position.map_or(0, |i| i + 1);
            files.get(next).cloned()
        }
        RepeatMode::Shuffle => pick_other(files, current, rng),
    }
}

/// Linear step without wraparound, for user-driven skips.
///
/// Returns `None` at the list boundaries. With `current` missing, `Next`
/// starts at the first file and `Previous` has nowhere to go.
pub fn step(files: &[FileId], current: Option<&FileId>, direction: Direction) -> Option<FileId> {
    let position = current.and_then(|c| files.iter().position(|f| f == c));
    let target = match (position, direction) {
        (None, Direction::Next) => Some(0),
        (None, Direction::Previous) => None,
        (Some(i), Direction::Next) => Some(i + 1),
        (Some(i), Direction::Previous) => i.checked_sub(1),
    };
    target.and_then(|i| files.get(i).cloned())
}

/// Repeat mode plus the currently playing file, over a live folder listing
pub struct PlaybackQueue {
    listing: Arc<dyn FolderListing>,
    mode: RepeatMode,
    current: Option<(FileId, FolderId)>,
}

impl PlaybackQueue {
    pub fn new(listing: Arc<dyn FolderListing>, mode: RepeatMode) -> Self {
        Self {
            listing,
            mode,
            current: None,
        }
    }

    pub fn mode(&self) -> RepeatMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: RepeatMode) {
        debug!(from = %self.mode, to = %mode, "Repeat mode changed");
        self.mode = mode;
    }

    pub fn current(&self) -> Option<&FileId> {
        self.current.as_ref().map(|(id, _)| id)
    }

    pub fn set_current(&mut self, file: FileId, folder: FolderId) {
        self.current = Some((file, folder));
    }

    pub fn clear_current(&mut self) {
        self.current = None;
    }

    /// Next file under the current repeat mode
    pub async fn next_file(&self) -> Result<Option<FileId>> {
        let Some((file, folder)) = &self.current else {
            return Ok(None);
        };
        if !self.mode.uses_queue() {
            return Ok(None);
        }
        let files = self.listing.ordered_files(folder).await?;
        Ok(next_after(&files, Some(file), self.mode, &mut rand::thread_rng()))
    }

    /// Neighbour of the current file, ignoring the repeat mode
    pub async fn neighbour(&self, direction: Direction) -> Result<Option<FileId>> {
        let Some((file, folder)) = &self.current else {
            return Ok(None);
        };
        let files = self.listing.ordered_files(folder).await?;
        Ok(step(&files, Some(file), direction))
    }
}
