//! Vertical slice of the diagram being traversed.

use crate::model::YPos;

/// Inclusive y range `[from, to]`.
///
/// # Invariants
/// - `from <= to`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VisibleRange {
    from: YPos,
    to: YPos,
}

impl VisibleRange {
    /// Create a range; swapped bounds are put in order.
    pub fn new(from: YPos, to: YPos) -> Self {
        if from <= to {
            Self { from, to }
        } else {
            Self { from: to, to: from }
        }
    }

    /// Top (inclusive).
    pub fn from(&self) -> YPos {
        self.from
    }

    /// Bottom (inclusive).
    pub fn to(&self) -> YPos {
        self.to
    }

    /// Whether `y` lies within the range.
    pub fn contains(&self, y: YPos) -> bool {
        y >= self.from && y <= self.to
    }

    /// Whether `[top, bottom]` intersects the range.
    pub fn overlaps(&self, top: YPos, bottom: YPos) -> bool {
        top <= self.to && bottom >= self.from
    }
}
