//! View-state layer: layout, traversal and hit-testing.
//!
//! Everything here is a pure function of the model plus a viewport. Nothing
//! is stored on the model during a walk; the [`traversal::RenderContext`]
//! carries the offset, the mode and the selection.
//!
//! # Module Structure
//!
//! - `types`: Point, Rect, Viewport and segment distance
//! - `visible_range`: VisibleRange - inclusive y slice being walked
//! - `layout_params`: LayoutParams - lane/bar geometry and `bar_xpos`
//! - `primitives`: DrawPrimitive, Style builder, DrawSink
//! - `hit_test`: HitTestResult and the Picker used in pick mode
//! - `traversal`: the shared paint/pick walk

pub mod layout_params;
pub mod primitives;
pub mod traversal;
pub mod types;
pub mod visible_range;

pub use hit_test::{HitTestResult, Picker};
pub use layout_params::{Anchor, LayoutParams};
pub use primitives::{Color, DrawPrimitive, DrawSink, Style, StyleBuilder};
pub use traversal::{RenderContext, TraversalMode};
pub use types::{distance_to_segment, Point, Rect, Viewport};
pub use visible_range::VisibleRange;
