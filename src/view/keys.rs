//! Keyboard bindings for the viewer.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use std::collections::HashMap;

/// What the user wants, independent of the key that asked for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ViewerAction {
    /// Leave the viewer.
    Quit,
    /// One row up.
    ScrollUp,
    /// One row down.
    ScrollDown,
    /// A few columns left.
    ScrollLeft,
    /// A few columns right.
    ScrollRight,
    /// One screen up.
    PageUp,
    /// One screen down.
    PageDown,
    /// Jump to the top of the diagram.
    ScrollToTop,
    /// Jump to the bottom and keep following new lines.
    ScrollToBottom,
    /// Toggle following new lines.
    ToggleFollow,
    /// Write the journal to the configured save path.
    SaveJournal,
    /// Drop the current selection.
    ClearSelection,
}

/// Maps key events to viewer actions.
#[derive(Debug, Clone)]
pub struct KeyBindings {
    bindings: HashMap<KeyEvent, ViewerAction>,
}

impl KeyBindings {
    /// Look up the action for a key event.
    pub fn get(&self, key: KeyEvent) -> Option<ViewerAction> {
        self.bindings.get(&KeyEvent::new(key.code, key.modifiers)).copied()
    }
}

impl Default for KeyBindings {
    fn default() -> Self {
        use ViewerAction::*;

        let plain = |code| KeyEvent::new(code, KeyModifiers::NONE);
        let entries = [
            (plain(KeyCode::Char('q')), Quit),
            (KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL), Quit),
            // Vim-style scrolling
            (plain(KeyCode::Char('k')), ScrollUp),
            (plain(KeyCode::Char('j')), ScrollDown),
            (plain(KeyCode::Char('h')), ScrollLeft),
            (plain(KeyCode::Char('l')), ScrollRight),
            (plain(KeyCode::Char('g')), ScrollToTop),
            (KeyEvent::new(KeyCode::Char('G'), KeyModifiers::SHIFT), ScrollToBottom),
            (plain(KeyCode::Char('G')), ScrollToBottom),
            // Arrow keys and paging
            (plain(KeyCode::Up), ScrollUp),
            (plain(KeyCode::Down), ScrollDown),
            (plain(KeyCode::Left), ScrollLeft),
            (plain(KeyCode::Right), ScrollRight),
            (plain(KeyCode::PageUp), PageUp),
            (plain(KeyCode::PageDown), PageDown),
            (KeyEvent::new(KeyCode::Char('u'), KeyModifiers::CONTROL), PageUp),
            (KeyEvent::new(KeyCode::Char('d'), KeyModifiers::CONTROL), PageDown),
            (plain(KeyCode::Home), ScrollToTop),
            (plain(KeyCode::End), ScrollToBottom),
            (plain(KeyCode::Char('f')), ToggleFollow),
            (plain(KeyCode::Char('w')), SaveJournal),
            (plain(KeyCode::Esc), ClearSelection),
        ];

        Self {
            bindings: entries.into_iter().collect(),
        }
    }
}
