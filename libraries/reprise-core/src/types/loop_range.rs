/// A-B repeat range
use serde::{Deserialize, Serialize};

/// Outcome of editing a loop point
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopEdit {
    /// The point was stored as requested
    Applied,
    /// B was requested with no A set, so A was anchored at that time instead
    AnchoredA,
    /// B was not strictly after A; nothing changed
    Rejected,
}

/// A user-defined `[A, B)` playback range that repeats automatically.
///
/// The range is valid only when both points are set and `B > A`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct LoopRange {
    point_a: Option<f64>,
    point_b: Option<f64>,
}

impl LoopRange {
    /// Build a range from two points without validation
    #[must_use]
    pub fn new(point_a: Option<f64>, point_b: Option<f64>) -> Self {
        Self { point_a, point_b }
    }

    #[must_use]
    pub fn point_a(&self) -> Option<f64> {
        self.point_a
    }

    #[must_use]
    pub fn point_b(&self) -> Option<f64> {
        self.point_b
    }

    /// Set A, clearing B when it no longer lies after the new A.
    pub fn set_point_a(&mut self, time: f64) -> LoopEdit {
        self.point_a = Some(time);
        if matches!(self.point_b, Some(b) if b <= time) {
            self.point_b = None;
        }
        LoopEdit::Applied
    }

    /// Set B. With A unset, A is anchored at `time` and B stays unset.
    pub fn set_point_b(&mut self, time: f64) -> LoopEdit {
        match self.point_a {
            None => {
                self.point_a = Some(time);
                LoopEdit::AnchoredA
            }
            Some(a) if time > a => {
                self.point_b = Some(time);
                LoopEdit::Applied
            }
            Some(_) => LoopEdit::Rejected,
        }
    }

    pub fn clear(&mut self) {
        self.point_a = None;
        self.point_b = None;
    }

    /// Both points set and `B > A`
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.bounds().is_some()
    }

    /// `(A, B)` when the range is valid
    #[must_use]
    pub fn bounds(&self) -> Option<(f64, f64)> {
        match (self.point_a, self.point_b) {
            (Some(a), Some(b)) if b > a => Some((a, b)),
            _ => None,
        }
    }

    /// Whether `time` has reached the end of a valid range
    #[must_use]
    pub fn has_passed_end(&self, time: f64) -> bool {
        matches!(self.bounds(), Some((_, b)) if time >= b)
    }
}
