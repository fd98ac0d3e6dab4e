//! Lane pool: compact, reusable horizontal slots.

use super::identifiers::Lane;
use std::collections::BTreeSet;

/// Set of lanes held by live lifelines.
#[derive(Debug, Clone, Default)]
pub struct LanePool {
    in_use: BTreeSet<Lane>,
    high_water: Option<Lane>,
}

impl LanePool {
    /// Empty pool.
    pub fn new() -> Self {
        Self::default()
    }

    /// Take the smallest lane not currently held.
    pub fn acquire(&mut self) -> Lane {
        // in_use is sorted, so the first gap in 0,1,2,... is the answer
        let mut candidate = 0u32;
        for lane in &self.in_use {
            if lane.get() != candidate {
                break;
            }
            candidate += 1;
        }
        let lane = Lane::new(candidate);
        self.in_use.insert(lane);
        self.high_water = Some(self.high_water.map_or(lane, |hw| hw.max(lane)));
        lane
    }

    /// Give a lane back. Returns false if it was not held.
    pub fn release(&mut self, lane: Lane) -> bool {
        self.in_use.remove(&lane)
    }

    /// Number of lanes currently held.
    pub fn in_use_count(&self) -> usize {
        self.in_use.len()
    }

    /// Highest lane ever handed out (drawn history may still occupy it).
    pub fn high_water(&self) -> Option<Lane> {
        self.high_water
    }
}
