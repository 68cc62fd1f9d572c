//! UI rendering for the TUI.

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::Span,
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState},
    Frame,
};

use crate::features::sync::{QueueItem, QueueStatus};
use crate::tui::app::App;

/// Render the application UI.
pub fn render(frame: &mut Frame<'_>, app: &App<'_>) {
    // Create layout: header, table, status bar
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(0),    // Table
            Constraint::Length(1), // Status bar
        ])
        .split(frame.area());

    render_header(frame, app, chunks[0]);
    render_table(frame, app, chunks[1]);
    render_status_bar(frame, app, chunks[2]);
}

/// Render the header with queue counts.
fn render_header(frame: &mut Frame<'_>, app: &App<'_>, area: Rect) {
    let title = format!(
        " Sync Queue - {} pending / {} failed / {} synced ",
        app.stats.pending, app.stats.failed, app.stats.synced
    );

    let header = Paragraph::new(title)
        .style(
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Cyan)),
        );

    frame.render_widget(header, area);
}

fn status_cell(status: QueueStatus) -> Cell<'static> {
    let (text, color) = match status {
        QueueStatus::Pending => ("pending", Color::White),
        QueueStatus::Synced => ("synced", Color::Green),
        QueueStatus::Failed => ("failed", Color::Red),
    };
    Cell::from(Span::styled(text, Style::default().fg(color)))
}

fn item_row(item: &QueueItem) -> Row<'_> {
    let error = item
        .last_error
        .as_deref()
        .map(|e| e.chars().take(40).collect::<String>())
        .unwrap_or_default();

    Row::new(vec![
        Cell::from(format!("#{}", item.id.unwrap_or_default()))
            .style(Style::default().fg(Color::DarkGray)),
        Cell::from(item.kind.to_string()),
        Cell::from(item.table.clone()).style(Style::default().fg(Color::Blue)),
        Cell::from(item.created_at.format("%m-%d %H:%M").to_string())
            .style(Style::default().fg(Color::Yellow)),
        Cell::from(item.attempts.to_string()),
        status_cell(item.status),
        Cell::from(error).style(Style::default().fg(Color::Red)),
    ])
}

/// Render the queue items as a table.
fn render_table(frame: &mut Frame<'_>, app: &App<'_>, area: Rect) {
    let header = Row::new(vec!["ID", "Op", "Table", "Created", "Tries", "Status", "Error"])
        .style(Style::default().add_modifier(Modifier::BOLD));

    let rows = app.items.iter().map(item_row);

    let table = Table::new(
        rows,
        [
            Constraint::Length(6),
            Constraint::Length(7),
            Constraint::Length(14),
            Constraint::Length(12),
            Constraint::Length(6),
            Constraint::Length(8),
            Constraint::Min(10),
        ],
    )
    .header(header)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White)),
    )
    .highlight_style(Style::default().bg(Color::DarkGray));

    let mut state = TableState::default();
    state.select(Some(app.selected));

    frame.render_stateful_widget(table, area, &mut state);
}

/// Render the status bar.
fn render_status_bar(frame: &mut Frame<'_>, app: &App<'_>, area: Rect) {
    let status_text = app
        .status
        .as_deref()
        .unwrap_or("j/k:nav | s:sync | y:retry | r:refresh | ?:help | q:quit");

    let status = Paragraph::new(status_text).style(Style::default().fg(Color::DarkGray));

    frame.render_widget(status, area);
}
