//! Vertical placement policy.

use super::identifiers::YPos;

/// How entity positions are assigned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LayoutPolicy {
    /// All lifelines share one advancing coordinate.
    #[default]
    Synchronized,
    /// Each lifeline advances its own coordinate.
    FreeRunning,
}

/// The model's clock.
///
/// In synchronized mode `global_y` is where the next entity of *any*
/// lifeline goes. In free-running mode it only tracks the lowest point
/// reached, for the diagram height. Either way it never decreases.
#[derive(Debug, Clone, Default)]
pub struct Timeline {
    policy: LayoutPolicy,
    global_y: YPos,
}

impl Timeline {
    /// Fresh clock at the origin.
    pub fn new(policy: LayoutPolicy) -> Self {
        Self {
            policy,
            global_y: YPos::ZERO,
        }
    }

    /// Active policy.
    pub fn policy(&self) -> LayoutPolicy {
        self.policy
    }

    /// Current global coordinate.
    pub fn global_y(&self) -> YPos {
        self.global_y
    }

    /// Where a lifeline born now starts its local cursor.
    pub fn birth_position(&self) -> YPos {
        match self.policy {
            LayoutPolicy::Synchronized => self.global_y,
            LayoutPolicy::FreeRunning => YPos::ZERO,
        }
    }

    /// Reserve `extent` pixels for a new entity.
    ///
    /// `cursor` is the lifeline's local coordinate; it ends up just below the
    /// placed entity in both policies.
    pub fn place(&mut self, cursor: &mut YPos, extent: u64) -> YPos {
        match self.policy {
            LayoutPolicy::Synchronized => {
                let y = self.global_y;
                self.global_y = y.advanced(extent);
                *cursor = self.global_y;
                y
            }
            LayoutPolicy::FreeRunning => {
                let y = *cursor;
                *cursor = y.advanced(extent);
                self.global_y = self.global_y.max(*cursor);
                y
            }
        }
    }
}
