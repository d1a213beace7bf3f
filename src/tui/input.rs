//! Input dispatch layer for Elm Architecture (TEA) pattern.
//!
//! Maps key events to messages based on current app mode.
//! Handles the `gg` chord with a non-blocking state machine.

use super::{App, Message};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use std::time::Instant;

/// Pending first key of a chord.
#[derive(Debug, Default)]
pub struct InputState {
    pub pending: Option<KeyCode>,
    pub pending_since: Option<Instant>,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if there's a pending chord that has timed out (500ms).
    pub fn has_timed_out(&self) -> bool {
        if let Some(since) = self.pending_since {
            since.elapsed().as_millis() > 500
        } else {
            false
        }
    }

    pub fn clear(&mut self) {
        self.pending = None;
        self.pending_since = None;
    }

    pub fn set_pending(&mut self, key: KeyCode) {
        self.pending = Some(key);
        self.pending_since = Some(Instant::now());
    }
}

/// Map a key event to a message for the current mode.
pub fn dispatch(app: &App, input: &mut InputState, key: KeyEvent) -> Message {
    if let Some(pending) = input.pending.take() {
        input.pending_since = None;
        return handle_chord(pending, key.code);
    }

    if app.search_mode {
        dispatch_search_mode(key)
    } else if app.show_help {
        dispatch_help_modal(key)
    } else {
        dispatch_normal_mode(app, input, key)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Mode-specific dispatch functions
// ─────────────────────────────────────────────────────────────────────────────

fn dispatch_normal_mode(app: &App, input: &mut InputState, key: KeyEvent) -> Message {
    match key.code {
        KeyCode::Char('q') => Message::Quit,
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => Message::Quit,
        KeyCode::Char('j') | KeyCode::Down => Message::MoveDown,
        KeyCode::Char('k') | KeyCode::Up => Message::MoveUp,
        KeyCode::Char('G') | KeyCode::End => Message::GotoBottom,
        KeyCode::Home => Message::GotoTop,
        KeyCode::Char('g') => {
            input.set_pending(KeyCode::Char('g'));
            Message::None
        }
        KeyCode::Char('d') if key.modifiers.contains(KeyModifiers::CONTROL) => Message::PageDown,
        KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => Message::PageUp,
        KeyCode::PageDown => Message::PageDown,
        KeyCode::PageUp => Message::PageUp,
        KeyCode::Char('/') => Message::EnterSearch,
        KeyCode::Esc if !app.panel.query().is_empty() => Message::ClearSearch,
        KeyCode::Enter | KeyCode::Char('f') => Message::FocusTab,
        KeyCode::Char('x') | KeyCode::Delete => Message::CloseTab,
        KeyCode::Char('X') => Message::CloseGroup,
        KeyCode::Char('D') => Message::CloseOthers,
        KeyCode::Char('r') => Message::Refresh,
        KeyCode::Char('?') => Message::ToggleHelp,
        _ => Message::None,
    }
}

fn dispatch_search_mode(key: KeyEvent) -> Message {
    match key.code {
        KeyCode::Esc => Message::ExitSearch,
        KeyCode::Enter => Message::ConfirmSearch,
        KeyCode::Backspace => Message::SearchBackspace,
        KeyCode::Down => Message::MoveDown,
        KeyCode::Up => Message::MoveUp,
        KeyCode::Char(c) => Message::SearchInput(c),
        _ => Message::None,
    }
}

fn dispatch_help_modal(key: KeyEvent) -> Message {
    match key.code {
        KeyCode::Esc | KeyCode::Char('?') | KeyCode::Char('q') => Message::ToggleHelp,
        _ => Message::None,
    }
}

fn handle_chord(first: KeyCode, second: KeyCode) -> Message {
    match (first, second) {
        (KeyCode::Char('g'), KeyCode::Char('g')) => Message::GotoTop,
        _ => Message::None,
    }
}
