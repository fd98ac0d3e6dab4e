//! Layout dimension constants for TUI rendering.
//!
//! The diagram is laid out in model pixels; the terminal shows it at a
//! fixed scale so that lane widths and entity extents stay readable.

use std::time::Duration;

/// Model pixels covered by one terminal column.
pub const PX_PER_COLUMN: f64 = 4.0;

/// Model pixels covered by one terminal row.
///
/// Entity extents are multiples of ten, so each step lands on its own row.
pub const PX_PER_ROW: f64 = 10.0;

/// Height of the status bar in lines.
pub const STATUS_BAR_HEIGHT: u16 = 1;

/// Upper bound for the inspector pane, borders included.
pub const INSPECTOR_MAX_HEIGHT: u16 = 10;

/// Columns moved by one horizontal scroll step.
pub const SCROLL_STEP_COLUMNS: u16 = 4;

/// Rows moved by one vertical scroll step.
pub const SCROLL_STEP_ROWS: u16 = 1;

/// How long the event loop waits for input before checking the model.
pub const EVENT_POLL: Duration = Duration::from_millis(100);
