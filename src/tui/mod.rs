//! Terminal User Interface (TUI) for skymark.
//!
//! Provides an interactive dashboard for the offline sync queue.
//! Built with ratatui and crossterm.

mod app;
mod event;
mod ui;

pub use app::App;

use std::io::{self, Stdout};

use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::prelude::*;

use crate::backend::{BackendClient, Session};
use crate::config::Config;
use crate::error::SkymarkError;
use crate::features::sync::{HttpProbe, SyncQueue};
use crate::storage::{Database, KvStore};

type Tui = Terminal<CrosstermBackend<Stdout>>;

/// Run the queue dashboard.
///
/// # Errors
///
/// Returns an error if no session is stored or the TUI fails to
/// initialize or run.
pub fn run(config: &Config) -> Result<(), SkymarkError> {
    let db = Database::open()?;
    let session = Session::require(&KvStore::new(&db))?;
    let queue = SyncQueue::with_database(db);

    let client = BackendClient::new(&config.backend)?.with_session(&session);
    let probe = HttpProbe::new(&config.backend, config.sync.probe_timeout_secs)?;

    let mut terminal = setup_terminal()?;
    let mut app = App::new(&queue, &client, &probe, &session.user_id)?;
    let result = run_app(&mut terminal, &mut app);
    restore_terminal(&mut terminal);

    result
}

fn setup_terminal() -> Result<Tui, SkymarkError> {
    enable_raw_mode()
        .map_err(|e| SkymarkError::Config(format!("Failed to enable raw mode: {e}")))?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)
        .map_err(|e| SkymarkError::Config(format!("Failed to setup terminal: {e}")))?;

    Terminal::new(CrosstermBackend::new(stdout))
        .map_err(|e| SkymarkError::Config(format!("Failed to create terminal: {e}")))
}

fn restore_terminal(terminal: &mut Tui) {
    disable_raw_mode().ok();
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )
    .ok();
    terminal.show_cursor().ok();
}

/// Run the main application loop.
fn run_app(terminal: &mut Tui, app: &mut App<'_>) -> Result<(), SkymarkError> {
    loop {
        terminal
            .draw(|frame| ui::render(frame, app))
            .map_err(|e| SkymarkError::Config(format!("Failed to draw: {e}")))?;

        if let Some(action) = event::handle_events(app)? {
            match action {
                event::Action::Quit => break,
                event::Action::Refresh => app.refresh()?,
                event::Action::Sync => app.sync_now()?,
                event::Action::Retry => app.retry_selected()?,
            }
        }
    }

    Ok(())
}
