//! Terminal viewer (impure shell).
//!
//! The viewer owns no diagram state of its own. Every frame it locks the
//! shared model, asks it to draw the visible slice into a primitive list and
//! hands that list to the canvas widget. Clicks are forwarded to the model
//! as a pending pick and resolved on the next draw.

pub mod canvas;
pub mod constants;
pub mod keys;
pub mod panels;

pub use canvas::{cell_to_screen, viewport_for, DiagramWidget};
pub use keys::{KeyBindings, ViewerAction};
pub use panels::{inspector, inspector_height, split_frame, FrameAreas, StatusInfo};

use crate::model::{InputError, SequenceModel, SharedModel};
use constants::{EVENT_POLL, PX_PER_COLUMN, PX_PER_ROW, SCROLL_STEP_COLUMNS, SCROLL_STEP_ROWS};
use crossterm::{
    event::{self, Event, KeyEvent, KeyEventKind, MouseButton, MouseEvent, MouseEventKind},
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    ExecutableCommand,
};
use ratatui::{backend::CrosstermBackend, layout::Rect as TermRect, Terminal};
use std::io::{self, Stdout};
use std::path::PathBuf;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Errors that can occur during TUI operations
#[derive(Debug, Error)]
pub enum TuiError {
    /// IO error during terminal operations
    #[error("Terminal IO error: {0}")]
    Io(#[from] io::Error),

    /// Input source error
    #[error("Input error: {0}")]
    Input(#[from] InputError),
}

/// Settings the viewer needs from the resolved configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewerOptions {
    /// Destination of the `w` key.
    pub save_path: PathBuf,
}

/// Main TUI application
///
/// Generic over backend to support testing with TestBackend
pub struct TuiApp<B>
where
    B: ratatui::backend::Backend,
{
    terminal: Terminal<B>,
    model: SharedModel,
    key_bindings: KeyBindings,
    save_path: PathBuf,
    scroll_x: f64,
    scroll_y: f64,
    following: bool,
    last_revision: Option<u64>,
    /// Last rendered diagram area (for click mapping and paging)
    last_diagram_area: Option<TermRect>,
    message: Option<String>,
}

impl TuiApp<CrosstermBackend<Stdout>> {
    /// Create and initialize a new TUI application
    ///
    /// Sets up terminal in raw mode with alternate screen and mouse capture.
    pub fn new(model: SharedModel, options: ViewerOptions) -> Result<Self, TuiError> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        stdout.execute(EnterAlternateScreen)?;
        stdout.execute(crossterm::event::EnableMouseCapture)?;
        let terminal = Terminal::new(CrosstermBackend::new(stdout))?;
        Ok(Self::with_terminal(terminal, model, options))
    }

    /// Run the main event loop
    ///
    /// Returns when user quits (q or Ctrl+C). Input events redraw at once;
    /// otherwise the model revision is checked every poll interval and the
    /// screen is redrawn only when it moved.
    pub fn run(&mut self) -> Result<(), TuiError> {
        self.draw()?;

        loop {
            if event::poll(EVENT_POLL)? {
                match event::read()? {
                    Event::Key(key) if key.kind != KeyEventKind::Release => {
                        if self.handle_key(key) {
                            return Ok(());
                        }
                        self.draw()?;
                    }
                    Event::Mouse(mouse) => {
                        self.handle_mouse(mouse);
                        self.draw()?;
                    }
                    Event::Resize(width, height) => {
                        debug!("Handling resize to {}x{}", width, height);
                        self.draw()?;
                    }
                    _ => {}
                }
            } else if self.needs_redraw() {
                self.draw()?;
            }
        }
    }
}

impl<B> TuiApp<B>
where
    B: ratatui::backend::Backend,
{
    /// Build the viewer over an already initialised terminal.
    pub fn with_terminal(
        terminal: Terminal<B>,
        model: SharedModel,
        options: ViewerOptions,
    ) -> Self {
        Self {
            terminal,
            model,
            key_bindings: KeyBindings::default(),
            save_path: options.save_path,
            scroll_x: 0.0,
            scroll_y: 0.0,
            following: true,
            last_revision: None,
            last_diagram_area: None,
            message: None,
        }
    }

    /// Whether the model changed since the last frame.
    pub fn needs_redraw(&self) -> bool {
        self.last_revision != Some(self.model.revision())
    }

    /// Top-left of the viewport in model pixels.
    pub fn scroll(&self) -> (f64, f64) {
        (self.scroll_x, self.scroll_y)
    }

    /// Whether new lines pull the view down.
    pub fn is_following(&self) -> bool {
        self.following
    }

    /// Status bar message, if any.
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    /// Backend access, for inspecting rendered buffers.
    pub fn terminal(&self) -> &Terminal<B> {
        &self.terminal
    }

    /// Handle a single keyboard event
    ///
    /// Returns true if app should quit
    pub fn handle_key(&mut self, key: KeyEvent) -> bool {
        let Some(action) = self.key_bindings.get(key) else {
            return false;
        };
        self.message = None;

        let page = self.page_height();
        let row = f64::from(SCROLL_STEP_ROWS) * PX_PER_ROW;
        let column = f64::from(SCROLL_STEP_COLUMNS) * PX_PER_COLUMN;
        match action {
            ViewerAction::Quit => return true,
            ViewerAction::ScrollUp => self.scroll_by(0.0, -row),
            ViewerAction::ScrollDown => self.scroll_by(0.0, row),
            ViewerAction::ScrollLeft => self.scroll_by(-column, 0.0),
            ViewerAction::ScrollRight => self.scroll_by(column, 0.0),
            ViewerAction::PageUp => self.scroll_by(0.0, -page),
            ViewerAction::PageDown => self.scroll_by(0.0, page),
            ViewerAction::ScrollToTop => {
                self.following = false;
                self.scroll_y = 0.0;
            }
            ViewerAction::ScrollToBottom => {
                self.following = true;
            }
            ViewerAction::ToggleFollow => {
                self.following = !self.following;
            }
            ViewerAction::SaveJournal => self.save_journal(),
            ViewerAction::ClearSelection => self.model.lock().set_selected_object(None),
        }
        false
    }

    /// Handle a single mouse event
    ///
    /// Left clicks inside the diagram become a pick on the next draw; the
    /// wheel scrolls vertically.
    pub fn handle_mouse(&mut self, mouse: MouseEvent) {
        let wheel = f64::from(SCROLL_STEP_ROWS * 3) * PX_PER_ROW;
        match mouse.kind {
            MouseEventKind::ScrollUp => self.scroll_by(0.0, -wheel),
            MouseEventKind::ScrollDown => self.scroll_by(0.0, wheel),
            MouseEventKind::Down(MouseButton::Left) => {
                let Some(area) = self.last_diagram_area else {
                    return;
                };
                if let Some(point) = cell_to_screen(area, mouse.column, mouse.row) {
                    debug!(x = point.x, y = point.y, "Click");
                    self.model.lock().set_click_point(point.x, point.y);
                }
            }
            _ => {}
        }
    }

    /// Render the current frame
    pub fn draw(&mut self) -> Result<(), TuiError> {
        let size = self.terminal.size()?;
        let frame_area = TermRect::new(0, 0, size.width.max(1), size.height);

        let shared = self.model.clone();
        let mut model = shared.lock();
        let revision = model.revision();
        let rows_before = selection_text(&model).as_deref().map(inspector_height);
        let mut areas = split_frame(frame_area, rows_before);
        self.clamp_scroll(&model, areas.diagram);

        let mut primitives = Vec::new();
        model.draw(
            viewport_for(areas.diagram, self.scroll_x, self.scroll_y),
            &mut primitives,
        );

        // A click may have changed the selection and with it the inspector size
        let info = selection_text(&model);
        let rows_after = info.as_deref().map(inspector_height);
        if rows_after != rows_before {
            areas = split_frame(frame_area, rows_after);
            self.clamp_scroll(&model, areas.diagram);
            primitives.clear();
            model.draw(
                viewport_for(areas.diagram, self.scroll_x, self.scroll_y),
                &mut primitives,
            );
        }

        let status = StatusInfo {
            lifelines: model.lifelines().len(),
            revision,
            scroll_y: self.scroll_y,
            height: model.get_height(),
            following: self.following,
            message: self.message.clone(),
        };
        drop(model);

        self.last_revision = Some(revision);
        self.last_diagram_area = Some(areas.diagram);

        self.terminal.draw(|frame| {
            frame.render_widget(DiagramWidget::new(&primitives), areas.diagram);
            if let (Some(area), Some(text)) = (areas.inspector, info.as_deref()) {
                frame.render_widget(inspector(text), area);
            }
            frame.render_widget(ratatui::widgets::Paragraph::new(status.to_line()), areas.status);
        })?;

        Ok(())
    }

    fn page_height(&self) -> f64 {
        let rows = self.last_diagram_area.map_or(1, |area| area.height.max(1));
        f64::from(rows) * PX_PER_ROW
    }

    fn scroll_by(&mut self, dx: f64, dy: f64) {
        if dy != 0.0 {
            self.following = false;
        }
        self.scroll_x = (self.scroll_x + dx).max(0.0);
        self.scroll_y = (self.scroll_y + dy).max(0.0);
    }

    fn clamp_scroll(&mut self, model: &SequenceModel, area: TermRect) {
        let view = viewport_for(area, 0.0, 0.0);
        let max_x = (model.get_width() - view.width).max(0.0);
        let max_y = (model.get_height() - view.height).max(0.0);
        self.scroll_x = self.scroll_x.clamp(0.0, max_x);
        self.scroll_y = if self.following {
            max_y
        } else {
            self.scroll_y.clamp(0.0, max_y)
        };
    }

    fn save_journal(&mut self) {
        let result = self.model.lock().save_journal(&self.save_path);
        self.message = Some(match result {
            Ok(()) => {
                info!(path = %self.save_path.display(), "Journal saved");
                format!("saved to {}", self.save_path.display())
            }
            Err(error) => {
                warn!(path = %self.save_path.display(), "Journal save failed: {}", error);
                format!("save failed: {}", error)
            }
        });
    }
}

fn selection_text(model: &SequenceModel) -> Option<String> {
    model
        .get_selected_object()
        .and_then(|object| model.get_info_text(object))
}

/// Initialize and run the viewer over a shared model.
///
/// This is the main entry point for the TUI. It handles terminal
/// setup, runs the event loop, and ensures cleanup on exit.
///
/// Note: Logging must be initialized by caller before calling this function.
pub fn run_viewer(model: SharedModel, options: ViewerOptions) -> Result<(), TuiError> {
    let result = TuiApp::new(model, options).and_then(|mut app| app.run());

    // Always restore terminal state
    restore_terminal()?;

    result
}

/// Restore terminal to normal state
///
/// Disables raw mode, mouse capture, and leaves alternate screen
fn restore_terminal() -> Result<(), TuiError> {
    disable_raw_mode()?;
    io::stdout().execute(crossterm::event::DisableMouseCapture)?;
    io::stdout().execute(LeaveAlternateScreen)?;
    Ok(())
}
