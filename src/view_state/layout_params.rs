//! Fixed diagram geometry.

use crate::model::Lane;

/// Horizontal anchor within a call bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Anchor {
    /// Left edge.
    Left,
    /// Middle.
    Center,
    /// Right edge.
    Right,
}

impl Anchor {
    fn fraction(self) -> f64 {
        match self {
            Anchor::Left => 0.0,
            Anchor::Center => 0.5,
            Anchor::Right => 1.0,
        }
    }
}

/// Parameters every layout computation is a pure function of.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutParams {
    /// Horizontal space per lane.
    pub lane_width: f64,
    /// Width of one call bar; nested bars step right by this much.
    pub bar_width: f64,
    /// Left margin before lane 0.
    pub margin: f64,
    /// Title box size.
    pub title_width: f64,
    /// Title box height.
    pub title_height: f64,
    /// Label font size.
    pub font_size: f64,
    /// Maximum distance for a click to select a primitive.
    pub pick_threshold: f64,
}

impl Default for LayoutParams {
    fn default() -> Self {
        Self {
            lane_width: 160.0,
            bar_width: 8.0,
            margin: 20.0,
            title_width: 120.0,
            title_height: 26.0,
            font_size: 12.0,
            pick_threshold: 4.0,
        }
    }
}

impl LayoutParams {
    /// Title boxes start this far left of the lane origin.
    pub const TITLE_INDENT: f64 = 10.0;

    /// x where depth-0 bars of `lane` start.
    pub fn lane_origin(&self, lane: Lane) -> f64 {
        self.margin + f64::from(lane.get()) * self.lane_width
    }

    /// Horizontal span `[left, right]` owned by `lane`.
    pub fn lane_span(&self, lane: Lane) -> (f64, f64) {
        let left = self.lane_origin(lane) - Self::TITLE_INDENT;
        (left, left + self.lane_width)
    }

    /// x of a bar at `depth` in `lane`.
    pub fn bar_xpos(&self, depth: usize, lane: Lane, anchor: Anchor) -> f64 {
        self.lane_origin(lane) + (depth as f64 + anchor.fraction()) * self.bar_width
    }

    /// Diagram width needed for lanes `0..=highest`.
    pub fn width_for(&self, highest: Option<Lane>) -> f64 {
        match highest {
            Some(lane) => self.margin + f64::from(lane.get() + 1) * self.lane_width,
            None => 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bar_xpos_steps_by_bar_width() {
        let p = LayoutParams::default();
        let lane = Lane::new(0);
        assert_eq!(p.bar_xpos(0, lane, Anchor::Left), 20.0);
        assert_eq!(p.bar_xpos(0, lane, Anchor::Center), 24.0);
        assert_eq!(p.bar_xpos(0, lane, Anchor::Right), 28.0);
        assert_eq!(p.bar_xpos(2, lane, Anchor::Left), 36.0);
    }

    #[test]
    fn lanes_are_lane_width_apart() {
        let p = LayoutParams::default();
        let a = p.bar_xpos(1, Lane::new(0), Anchor::Left);
        let b = p.bar_xpos(1, Lane::new(3), Anchor::Left);
        assert_eq!(b - a, 3.0 * p.lane_width);
    }

    #[test]
    fn width_covers_highest_lane() {
        let p = LayoutParams::default();
        assert_eq!(p.width_for(None), 0.0);
        assert_eq!(p.width_for(Some(Lane::new(1))), 340.0);
    }
}
