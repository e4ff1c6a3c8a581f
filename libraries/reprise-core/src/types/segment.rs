/// Saved, labeled time ranges within a media file
use super::ids::{FileId, SegmentId};
use serde::{Deserialize, Serialize};

/// A half-open time range with `start < end`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeRange {
    pub start: f64,
    pub end: f64,
}

impl TimeRange {
    /// Returns `None` unless `start < end` and both are finite
    #[must_use]
    pub fn new(start: f64, end: f64) -> Option<Self> {
        (start.is_finite() && end.is_finite() && start < end).then_some(Self { start, end })
    }

    #[must_use]
    pub fn span(&self) -> f64 {
        self.end - self.start
    }
}

/// A saved segment. `index` is 0-based and contiguous per file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub id: SegmentId,
    pub file_id: FileId,
    pub label: String,
    pub start_time: f64,
    pub end_time: f64,
    pub index: u32,
}

impl Segment {
    /// Create a segment with a fresh id
    pub fn new(file_id: FileId, label: impl Into<String>, range: TimeRange, index: u32) -> Self {
        Self {
            id: SegmentId::generate(),
            file_id,
            label: label.into(),
            start_time: range.start,
            end_time: range.end,
            index,
        }
    }

    #[must_use]
    pub fn range(&self) -> TimeRange {
        TimeRange {
            start: self.start_time,
            end: self.end_time,
        }
    }

    /// Exact timestamp match, used for deduplication
    #[must_use]
    pub fn matches(&self, range: TimeRange) -> bool {
        self.start_time == range.start && self.end_time == range.end
    }

    #[must_use]
    pub fn duration(&self) -> f64 {
        self.end_time - self.start_time
    }
}
