//! Segment store
//!
//! In-memory view of the current file's segments backed by a
//! [`SegmentRepository`]. Persistence happens first; the in-memory list is
//! only changed once the repository accepted the write, so indices stay
//! contiguous (`0..N`) on both sides.

use crate::error::Result;
use crate::types::Direction;
use reprise_core::{FileId, RepriseError, Segment, SegmentId, SegmentRepository, TimeRange};
use std::sync::Arc;
use tracing::{debug, info};

/// Result of a save
#[derive(Debug, Clone, PartialEq)]
pub enum SaveOutcome {
    Created(Segment),
    /// A segment with the exact same range already existed
    Existing(Segment),
}

impl SaveOutcome {
    pub fn segment(&self) -> &Segment {
        match self {
            Self::Created(s) | Self::Existing(s) => s,
        }
    }
}

pub struct SegmentStore {
    repository: Arc<dyn SegmentRepository>,
    file: Option<FileId>,
    segments: Vec<Segment>,
    current: Option<SegmentId>,
}

impl SegmentStore {
    pub fn new(repository: Arc<dyn SegmentRepository>) -> Self {
        Self {
            repository,
            file: None,
            segments: Vec::new(),
            current: None,
        }
    }

    /// Replace the in-memory list with the segments of `file`
    pub async fn load_for(&mut self, file: &FileId) -> Result<()> {
        let mut segments = self.repository.segments_for_file(file).await?;
        segments.sort_by_key(|s| s.index);
        debug!(file = %file, count = segments.len(), "Segments loaded");
        self.file = Some(file.clone());
        self.segments = segments;
        self.current = None;
        Ok(())
    }

    pub fn clear(&mut self) {
        self.file = None;
        self.segments.clear();
        self.current = None;
    }

    /// Segments sorted by index
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn get(&self, id: &SegmentId) -> Option<&Segment> {
        self.segments.iter().find(|s| &s.id == id)
    }

    pub fn current(&self) -> Option<&Segment> {
        self.current.as_ref().and_then(|id| self.get(id))
    }

    pub fn current_id(&self) -> Option<&SegmentId> {
        self.current.as_ref()
    }

    /// Save `[start, end)` for the loaded file.
    ///
    /// # Errors
    /// `InvalidRange` unless `start < end`; nothing is persisted then.
    pub async fn save(
        &mut self,
        label: Option<String>,
        start: f64,
        end: f64,
    ) -> Result<SaveOutcome> {
        let Some(range) = TimeRange::new(start, end) else {
            return Err(RepriseError::InvalidRange { start, end }.into());
        };
        let Some(file) = self.file.clone() else {
            return Err(RepriseError::invalid_input("no file loaded for segments").into());
        };

        if let Some(existing) = self.segments.iter().find(|s| s.matches(range)) {
            debug!(segment = %existing.id, "Range already saved");
            let existing = existing.clone();
            self.current = Some(existing.id.clone());
            return Ok(SaveOutcome::Existing(existing));
        }

        let index = self
            .segments
            .iter()
            .map(|s| s.index + 1)
            .max()
            .unwrap_or(0);
        let label = label
            .map(|l| l.trim().to_string())
            .filter(|l| !l.is_empty())
            .unwrap_or_else(|| format!("Segment {}", index + 1));

        let segment = Segment::new(file, label, range, index);
        self.repository.insert_segment(&segment).await?;
        info!(segment = %segment.id, index, "Segment saved");

        self.segments.push(segment.clone());
        self.current = Some(segment.id.clone());
        Ok(SaveOutcome::Created(segment))
    }

    /// Delete a segment and close the index gap it leaves.
    ///
    /// Returns the removed segment, or `None` if it was not loaded.
    pub async fn delete(&mut self, id: &SegmentId) -> Result<Option<Segment>> {
        let Some(position) = self.segments.iter().position(|s| &s.id == id) else {
            return Ok(None);
        };
        let removed_index = self.segments[position].index;

        let updates: Vec<(SegmentId, u32)> = self
            .segments
            .iter()
            .filter(|s| s.index > removed_index)
            .map(|s| (s.id.clone(), s.index - 1))
            .collect();

        self.repository.delete_segment(id, &updates).await?;

        let removed = self.segments.remove(position);
        for segment in &mut self.segments {
            if segment.index > removed_index {
                segment.index -= 1;
            }
        }

        if self.current.as_ref() == Some(id) {
            self.current = self.segments.first().map(|s| s.id.clone());
        }
        info!(segment = %removed.id, "Segment deleted");
        Ok(Some(removed))
    }

    pub async fn rename(&mut self, id: &SegmentId, label: &str) -> Result<bool> {
        let label = label.trim();
        if label.is_empty() || self.get(id).is_none() {
            return Ok(false);
        }
        self.repository.rename_segment(id, label).await?;
        if let Some(segment) = self.segments.iter_mut().find(|s| &s.id == id) {
            segment.label = label.to_string();
        }
        Ok(true)
    }

    /// Mark a segment current
    pub fn select(&mut self, id: &SegmentId) -> Option<&Segment> {
        let position = self.segments.iter().position(|s| &s.id == id)?;
        self.current = Some(id.clone());
        self.segments.get(position)
    }

    /// Move the current pointer one step, clamped at both ends.
    ///
    /// With nothing current the first segment is selected.
    pub fn navigate(&mut self, direction: Direction) -> Option<&Segment> {
        let position = self
            .current
            .as_ref()
            .and_then(|id| self.segments.iter().position(|s| &s.id == id));
        let target = match (position, direction) {
            (None, _) => 0,
            (Some(i), Direction::Next) => (i + 1).min(self.segments.len().saturating_sub(1)),
            (Some(i), Direction::Previous) => i.saturating_sub(1),
        };
        let segment = self.segments.get(target)?;
        self.current = Some(segment.id.clone());
        Some(segment)
    }

    pub fn clear_current(&mut self) {
        self.current = None;
    }
}
