//! Application state for the TUI.

use crate::error::SkymarkError;
use crate::features::sync::{
    ConnectivityProbe, QueueItem, QueueStats, QueueStatus, RemoteStore, SyncDriver, SyncQueue,
};

/// Application state.
pub struct App<'a> {
    /// The sync queue being inspected.
    queue: &'a SyncQueue,
    /// Remote store used for manual drains.
    remote: &'a dyn RemoteStore,
    /// Connectivity probe.
    probe: &'a dyn ConnectivityProbe,
    /// The signed-in user.
    user_id: &'a str,
    /// Queue items on display (pending, then failed, then synced).
    pub items: Vec<QueueItem>,
    /// Queue counts.
    pub stats: QueueStats,
    /// Currently selected index.
    pub selected: usize,
    /// Status message to display.
    pub status: Option<String>,
    /// Pending 'g' key for 'gg' command.
    pub pending_g: bool,
}

impl<'a> App<'a> {
    /// Create a new app instance.
    ///
    /// # Errors
    ///
    /// Returns an error if reading the queue fails.
    pub fn new(
        queue: &'a SyncQueue,
        remote: &'a dyn RemoteStore,
        probe: &'a dyn ConnectivityProbe,
        user_id: &'a str,
    ) -> Result<Self, SkymarkError> {
        let mut app = Self {
            queue,
            remote,
            probe,
            user_id,
            items: Vec::new(),
            stats: QueueStats {
                pending: 0,
                synced: 0,
                failed: 0,
                oldest_pending: None,
            },
            selected: 0,
            status: Some("Press ? for help".to_string()),
            pending_g: false,
        };
        app.refresh()?;
        Ok(app)
    }

    /// Reload queue items and counts.
    ///
    /// # Errors
    ///
    /// Returns an error if reading the queue fails.
    pub fn refresh(&mut self) -> Result<(), SkymarkError> {
        let mut items = self.queue.pending_for(self.user_id)?;
        items.extend(self.queue.by_status(self.user_id, QueueStatus::Failed)?);
        items.extend(self.queue.by_status(self.user_id, QueueStatus::Synced)?);
        self.items = items;
        self.stats = self.queue.stats(self.user_id)?;

        // Adjust selection if it's out of bounds
        if !self.items.is_empty() && self.selected >= self.items.len() {
            self.selected = self.items.len() - 1;
        }

        Ok(())
    }

    /// Get the currently selected item.
    #[must_use]
    pub fn selected_item(&self) -> Option<&QueueItem> {
        self.items.get(self.selected)
    }

    /// Move selection up.
    pub fn select_previous(&mut self) {
        if self.selected > 0 {
            self.selected -= 1;
        }
        self.pending_g = false;
    }

    /// Move selection down.
    pub fn select_next(&mut self) {
        if !self.items.is_empty() && self.selected < self.items.len() - 1 {
            self.selected += 1;
        }
        self.pending_g = false;
    }

    /// Jump to first item.
    pub fn select_first(&mut self) {
        self.selected = 0;
        self.pending_g = false;
    }

    /// Jump to last item.
    pub fn select_last(&mut self) {
        if !self.items.is_empty() {
            self.selected = self.items.len() - 1;
        }
        self.pending_g = false;
    }

    /// Drain the queue now, when the backend is reachable.
    ///
    /// # Errors
    ///
    /// Returns an error if the local database fails.
    pub fn sync_now(&mut self) -> Result<(), SkymarkError> {
        if !self.probe.is_online() {
            self.status = Some("Offline - backend unreachable".to_string());
            return Ok(());
        }

        let driver = SyncDriver::new(self.remote, self.queue);
        let report = driver.drain(self.user_id)?;
        self.status = Some(format!(
            "Synced {} of {} operations",
            report.synced, report.processed
        ));
        self.refresh()
    }

    /// Retry the selected item if it has failed.
    ///
    /// # Errors
    ///
    /// Returns an error if the local database fails.
    pub fn retry_selected(&mut self) -> Result<(), SkymarkError> {
        let Some(item) = self.selected_item() else {
            return Ok(());
        };

        if item.status != QueueStatus::Failed {
            self.status = Some("Only failed items can be retried".to_string());
            return Ok(());
        }

        let Some(item_id) = item.id else {
            return Ok(());
        };

        if self.probe.is_online() {
            let driver = SyncDriver::new(self.remote, self.queue);
            let report = driver.retry_item(self.user_id, item_id)?;
            self.status = Some(format!(
                "Retried item {item_id}: {} synced, {} failed",
                report.synced, report.failed
            ));
        } else {
            self.queue.reset_for_retry(item_id)?;
            self.status = Some(format!("Reset item {item_id}; offline, will replay later"));
        }

        self.refresh()
    }

    /// Handle 'g' key for 'gg' command.
    pub fn handle_g(&mut self) {
        if self.pending_g {
            // Second 'g' - go to top
            self.select_first();
        } else {
            // First 'g' - wait for second
            self.pending_g = true;
            self.status = Some("g-".to_string());
        }
    }

    /// Cancel pending 'g' command.
    pub fn cancel_pending(&mut self) {
        self.pending_g = false;
        self.status = None;
    }
}
