//! Sync queue command implementation.
//!
//! Handles sync queue management commands.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use colored::Colorize;

use crate::backend::BackendClient;
use crate::cli::args::{OutputFormat, SyncCommands};
use crate::config::{Config, Paths};
use crate::error::SkymarkError;
use crate::features::sync::{
    format_drain_report, ConnectivityProbe, HttpProbe, QueueStatus, SyncDriver, SyncQueue,
    SyncService, SyncServiceConfig,
};
use crate::output::to_json;
use crate::storage::{Database, KvStore, KEY_LAST_SYNC};

use super::require_session;

/// Execute sync subcommands.
///
/// # Errors
///
/// Returns an error if local storage, the backend, or output formatting
/// fails.
pub fn sync(
    config: &Config,
    cmd: SyncCommands,
    format: OutputFormat,
) -> Result<String, SkymarkError> {
    match cmd {
        SyncCommands::Status => show_status(format),
        SyncCommands::Run => run_sync(config, format),
        SyncCommands::List { status, limit } => list_operations(status, limit, format),
        SyncCommands::Retry { id, all } => retry_operations(config, id, all, format),
        SyncCommands::Clear => clear_operations(format),
        SyncCommands::Watch => watch(config),
    }
}

/// Show queue status.
fn show_status(format: OutputFormat) -> Result<String, SkymarkError> {
    let db = Database::open()?;
    let session = require_session(&db)?;
    let last_sync = KvStore::new(&db).get(KEY_LAST_SYNC)?;
    let queue = SyncQueue::with_database(db);
    let stats = queue.stats(&session.user_id)?;

    match format {
        OutputFormat::Json => to_json(&serde_json::json!({
            "pending": stats.pending,
            "synced": stats.synced,
            "failed": stats.failed,
            "oldest_pending": stats.oldest_pending.map(|t| t.to_rfc3339()),
            "last_sync_at": last_sync,
        })),
        OutputFormat::Pretty => {
            let mut lines = Vec::new();

            lines.push("Sync Queue Status".bold().to_string());
            lines.push("─".repeat(40));

            lines.push(format!(
                "  Pending:  {} {}",
                stats.pending,
                if stats.pending > 0 {
                    "operations waiting".dimmed()
                } else {
                    "".dimmed()
                }
            ));

            lines.push(format!(
                "  Synced:   {} {}",
                stats.synced,
                "operations".dimmed()
            ));

            lines.push(format!(
                "  Failed:   {} {}",
                stats.failed,
                if stats.failed > 0 {
                    "operations need attention".red()
                } else {
                    "".normal()
                }
            ));

            if let Some(oldest) = stats.oldest_pending {
                let age = Utc::now().signed_duration_since(oldest);
                let age_str = if age.num_hours() > 0 {
                    format!("{} hours ago", age.num_hours())
                } else if age.num_minutes() > 0 {
                    format!("{} minutes ago", age.num_minutes())
                } else {
                    "just now".to_string()
                };
                lines.push(format!("  Oldest:   {}", age_str.dimmed()));
            }

            if let Some(last_sync) = last_sync {
                lines.push(format!("  Last sync: {}", last_sync.dimmed()));
            }

            if stats.pending > 0 {
                lines.push(String::new());
                lines.push(
                    "Run 'skymark sync run' to replay pending operations"
                        .dimmed()
                        .to_string(),
                );
            }

            Ok(lines.join("\n"))
        }
    }
}

/// Replay pending operations now.
fn run_sync(config: &Config, format: OutputFormat) -> Result<String, SkymarkError> {
    let db = Database::open()?;
    let session = require_session(&db)?;
    let queue = SyncQueue::with_database(db);

    let client = BackendClient::new(&config.backend)?.with_session(&session);
    let probe = HttpProbe::new(&config.backend, config.sync.probe_timeout_secs)?;
    if !probe.is_online() {
        return Err(SkymarkError::Network(
            "backend is unreachable; try again when online".to_string(),
        ));
    }

    let driver = SyncDriver::new(&client, &queue);
    let report = driver.drain(&session.user_id)?;

    KvStore::new(queue.database()).set(KEY_LAST_SYNC, &Utc::now().to_rfc3339())?;

    match format {
        OutputFormat::Json => to_json(&report),
        OutputFormat::Pretty => {
            if report.processed == 0 {
                Ok("No pending operations to sync.".to_string())
            } else {
                Ok(format_drain_report(&report))
            }
        }
    }
}

/// List queued operations.
fn list_operations(
    status_filter: Option<String>,
    limit: usize,
    format: OutputFormat,
) -> Result<String, SkymarkError> {
    let db = Database::open()?;
    let session = require_session(&db)?;
    let queue = SyncQueue::with_database(db);

    let status = status_filter
        .as_deref()
        .map_or(QueueStatus::Pending, QueueStatus::from_string);

    let items = queue.by_status(&session.user_id, status)?;

    match format {
        OutputFormat::Json => to_json(&items),
        OutputFormat::Pretty => {
            if items.is_empty() {
                return Ok(format!("No {status} operations in queue."));
            }

            let mut lines = Vec::new();

            lines.push(format!(
                "{} Operations ({})",
                status.to_string().to_uppercase(),
                items.len()
            ));
            lines.push("─".repeat(70));

            lines.push(format!(
                "{:<6} {:<8} {:<14} {:<17} {:<9} {}",
                "ID", "Op", "Table", "Created", "Attempts", "Status"
            ));
            lines.push("─".repeat(70));

            for item in items.iter().take(limit) {
                let id = item.id.map(|i| i.to_string()).unwrap_or_default();
                let created = item.created_at.format("%Y-%m-%d %H:%M").to_string();
                let status_str = match item.status {
                    QueueStatus::Pending => "⏳".to_string(),
                    QueueStatus::Synced => "✓".green().to_string(),
                    QueueStatus::Failed => "✗".red().to_string(),
                };

                lines.push(format!(
                    "{:<6} {:<8} {:<14} {:<17} {:<9} {}",
                    id, item.kind, item.table, created, item.attempts, status_str
                ));

                if let Some(error) = &item.last_error {
                    let short_error = if error.len() > 60 {
                        format!("{}...", &error[..57])
                    } else {
                        error.clone()
                    };
                    lines.push(format!("       {}", short_error.red()));
                }
            }

            Ok(lines.join("\n"))
        }
    }
}

/// Retry failed operations.
fn retry_operations(
    config: &Config,
    id: Option<i64>,
    all: bool,
    format: OutputFormat,
) -> Result<String, SkymarkError> {
    let db = Database::open()?;
    let session = require_session(&db)?;
    let queue = SyncQueue::with_database(db);

    let reset_ids: Vec<i64> = if let Some(id) = id {
        queue.reset_for_retry(id)?;
        vec![id]
    } else if all {
        let failed = queue.failed_items(&session.user_id)?;
        let mut ids = Vec::new();
        for item in failed {
            if let Some(item_id) = item.id {
                queue.reset_for_retry(item_id)?;
                ids.push(item_id);
            }
        }
        ids
    } else {
        return Err(SkymarkError::Invalid(
            "specify a queue item id or --all".to_string(),
        ));
    };

    // Replay immediately when the backend is reachable; otherwise the
    // reset items wait for the next drain
    let probe = HttpProbe::new(&config.backend, config.sync.probe_timeout_secs)?;
    if probe.is_online() {
        let client = BackendClient::new(&config.backend)?.with_session(&session);
        let driver = SyncDriver::new(&client, &queue);
        let report = driver.drain(&session.user_id)?;
        KvStore::new(queue.database()).set(KEY_LAST_SYNC, &Utc::now().to_rfc3339())?;

        match format {
            OutputFormat::Json => to_json(&serde_json::json!({
                "reset": reset_ids,
                "drained": true,
                "synced": report.synced,
                "failed": report.failed,
            })),
            OutputFormat::Pretty => Ok(format!(
                "Reset {} operation(s)\n{}",
                reset_ids.len(),
                format_drain_report(&report)
            )),
        }
    } else {
        match format {
            OutputFormat::Json => to_json(&serde_json::json!({
                "reset": reset_ids,
                "drained": false,
            })),
            OutputFormat::Pretty => Ok(format!(
                "Reset {} operation(s) to pending; offline, will replay on next sync",
                reset_ids.len()
            )),
        }
    }
}

/// Clear synced operations from the queue.
fn clear_operations(format: OutputFormat) -> Result<String, SkymarkError> {
    let db = Database::open()?;
    let session = require_session(&db)?;
    let queue = SyncQueue::with_database(db);

    let count = queue.clear_synced(&session.user_id)?;

    match format {
        OutputFormat::Json => to_json(&serde_json::json!({ "cleared": count })),
        OutputFormat::Pretty => Ok(format!("Cleared {count} synced operations")),
    }
}

/// Run the background sync service until the user presses Enter.
fn watch(config: &Config) -> Result<String, SkymarkError> {
    let db = Database::open()?;
    let session = require_session(&db)?;
    drop(db);

    let paths = Paths::new()?;
    let client = BackendClient::new(&config.backend)?.with_session(&session);
    let probe = HttpProbe::new(&config.backend, config.sync.probe_timeout_secs)?;

    let mut service = SyncService::new(
        Arc::new(client),
        Arc::new(probe),
        SyncServiceConfig {
            db_path: paths.database,
            interval: Duration::from_secs(config.sync.interval_secs),
        },
        session.user_id,
    );

    service.start()?;
    println!(
        "Watching for connectivity; draining every {}s while online. Press Enter to stop.",
        config.sync.interval_secs
    );

    let mut line = String::new();
    std::io::stdin().read_line(&mut line)?;

    service.stop();
    Ok("Sync service stopped".to_string())
}
