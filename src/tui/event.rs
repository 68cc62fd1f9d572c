//! Event handling for the TUI.

use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyModifiers};

use crate::error::SkymarkError;
use crate::tui::app::App;

/// Action to take after handling an event.
pub enum Action {
    /// Quit the application.
    Quit,
    /// Refresh the queue view.
    Refresh,
    /// Drain the queue now.
    Sync,
    /// Retry the selected failed item.
    Retry,
}

/// Poll for terminal events and translate them.
///
/// Returns an action to take, or None if no action is needed.
///
/// # Errors
///
/// Returns an error if event polling fails.
pub fn handle_events(app: &mut App<'_>) -> Result<Option<Action>, SkymarkError> {
    if !event::poll(Duration::from_millis(100))
        .map_err(|e| SkymarkError::Config(format!("Event poll failed: {e}")))?
    {
        return Ok(None);
    }

    match event::read().map_err(|e| SkymarkError::Config(format!("Event read failed: {e}")))? {
        Event::Key(key) => Ok(handle_key(app, key)),
        _ => Ok(None),
    }
}

/// Translate a single key press.
fn handle_key(app: &mut App<'_>, key: KeyEvent) -> Option<Action> {
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        return Some(Action::Quit);
    }

    // 'g' starts a two-key chord; anything else cancels it
    if key.code == KeyCode::Char('g') {
        app.handle_g();
        return None;
    }
    app.cancel_pending();

    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => Some(Action::Quit),

        // Navigation - vim style
        KeyCode::Char('j') | KeyCode::Down => {
            app.select_next();
            None
        }
        KeyCode::Char('k') | KeyCode::Up => {
            app.select_previous();
            None
        }
        KeyCode::Char('G') | KeyCode::End => {
            app.select_last();
            None
        }
        KeyCode::Home => {
            app.select_first();
            None
        }

        // Actions
        KeyCode::Char('s') => Some(Action::Sync),
        KeyCode::Char('y') => Some(Action::Retry),
        KeyCode::Char('r') => Some(Action::Refresh),

        KeyCode::Char('?') => {
            app.status = Some("j/k:nav | s:sync | y:retry | r:refresh | q:quit".to_string());
            None
        }

        _ => None,
    }
}
