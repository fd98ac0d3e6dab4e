//! Status bar and selection inspector.

use super::constants::INSPECTOR_MAX_HEIGHT;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};

/// Snapshot of what the status bar shows.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusInfo {
    /// Lifelines in the model.
    pub lifelines: usize,
    /// Model revision.
    pub revision: u64,
    /// Top of the viewport.
    pub scroll_y: f64,
    /// Diagram height.
    pub height: f64,
    /// Whether new lines pull the view down.
    pub following: bool,
    /// Transient message (save result and similar).
    pub message: Option<String>,
}

impl StatusInfo {
    /// Render as a single styled line.
    pub fn to_line(&self) -> Line<'static> {
        let dim = Style::default().fg(Color::DarkGray);
        let mut spans = vec![
            Span::styled(" vizexec ", Style::default().add_modifier(Modifier::BOLD)),
            Span::styled("│ ", dim),
            Span::raw(format!("{} lifelines ", self.lifelines)),
            Span::styled("│ ", dim),
            Span::raw(format!("y {:.0}/{:.0} ", self.scroll_y, self.height)),
            Span::styled(format!("rev {} ", self.revision), dim),
            Span::styled("│ ", dim),
        ];
        if self.following {
            spans.push(Span::styled("FOLLOW ", Style::default().fg(Color::Green)));
        } else {
            spans.push(Span::styled("PAUSED ", Style::default().fg(Color::Gray)));
        }
        spans.push(Span::styled("│ ", dim));
        match &self.message {
            Some(message) => spans.push(Span::styled(
                message.clone(),
                Style::default().fg(Color::Yellow),
            )),
            None => spans.push(Span::styled("w save  f follow  q quit", dim)),
        }
        Line::from(spans)
    }
}

/// Inspector paragraph for the selection text.
pub fn inspector(text: &str) -> Paragraph<'static> {
    let lines: Vec<Line<'static>> = text.lines().map(|l| Line::raw(l.to_string())).collect();
    Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title(" Selection "))
        .wrap(Wrap { trim: false })
}

/// Rows the inspector needs for `text`, borders included.
pub fn inspector_height(text: &str) -> u16 {
    let lines = u16::try_from(text.lines().count()).unwrap_or(u16::MAX);
    lines.saturating_add(2).min(INSPECTOR_MAX_HEIGHT)
}

/// Screen regions of one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameAreas {
    /// Diagram canvas.
    pub diagram: Rect,
    /// Inspector, when something is selected.
    pub inspector: Option<Rect>,
    /// Bottom status line.
    pub status: Rect,
}

/// Split the frame into diagram, optional inspector and status bar.
pub fn split_frame(area: Rect, inspector_rows: Option<u16>) -> FrameAreas {
    let inspector_rows = inspector_rows.unwrap_or(0);
    let [diagram, inspector, status] = Layout::vertical([
        Constraint::Min(1),
        Constraint::Length(inspector_rows),
        Constraint::Length(super::constants::STATUS_BAR_HEIGHT),
    ])
    .areas(area);
    FrameAreas {
        diagram,
        inspector: (inspector_rows > 0).then_some(inspector),
        status,
    }
}
