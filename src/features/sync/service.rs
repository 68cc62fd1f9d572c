//! Background sync service.
//!
//! An explicitly constructed service object owned by the composition
//! root. `start()` spawns one worker thread that probes connectivity,
//! drains on an offline-to-online transition, and drains again on a fixed
//! interval while online. `stop()` signals shutdown and joins the thread.
//! The worker opens its own database handle; drains serialize with manual
//! syncs through the shared gate.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use chrono::Utc;

use crate::storage::{Database, KvStore, KEY_LAST_SYNC};

use super::connectivity::ConnectivityProbe;
use super::driver::{RemoteStore, SyncDriver};
use super::queue::SyncQueue;

/// How often the worker wakes to check for shutdown.
const TICK: Duration = Duration::from_millis(100);

/// How often the worker probes connectivity.
const PROBE_EVERY: Duration = Duration::from_secs(10);

/// Settings for the background sync service.
#[derive(Debug, Clone)]
pub struct SyncServiceConfig {
    /// Path of the queue database.
    pub db_path: PathBuf,
    /// Interval between periodic drains while online.
    pub interval: Duration,
}

/// Background sync worker with an explicit start/stop lifecycle.
pub struct SyncService {
    remote: Arc<dyn RemoteStore + Send + Sync>,
    probe: Arc<dyn ConnectivityProbe + Send + Sync>,
    config: SyncServiceConfig,
    user_id: String,
    gate: Arc<Mutex<()>>,
    shutdown: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl SyncService {
    /// Create a stopped service.
    #[must_use]
    pub fn new(
        remote: Arc<dyn RemoteStore + Send + Sync>,
        probe: Arc<dyn ConnectivityProbe + Send + Sync>,
        config: SyncServiceConfig,
        user_id: String,
    ) -> Self {
        Self {
            remote,
            probe,
            config,
            user_id,
            gate: Arc::new(Mutex::new(())),
            shutdown: Arc::new(AtomicBool::new(false)),
            handle: None,
        }
    }

    /// The drain gate, for sharing with manual syncs in the same process.
    #[must_use]
    pub fn gate(&self) -> Arc<Mutex<()>> {
        Arc::clone(&self.gate)
    }

    /// Whether the worker thread is running.
    #[must_use]
    pub const fn is_running(&self) -> bool {
        self.handle.is_some()
    }

    /// Spawn the worker thread. Starting a running service is a no-op.
    ///
    /// # Errors
    ///
    /// Returns an error if the thread cannot be spawned.
    pub fn start(&mut self) -> Result<(), std::io::Error> {
        if self.handle.is_some() {
            return Ok(());
        }

        self.shutdown.store(false, Ordering::SeqCst);

        let remote = Arc::clone(&self.remote);
        let probe = Arc::clone(&self.probe);
        let gate = Arc::clone(&self.gate);
        let shutdown = Arc::clone(&self.shutdown);
        let config = self.config.clone();
        let user_id = self.user_id.clone();

        let handle = std::thread::Builder::new()
            .name("skymark-sync".to_string())
            .spawn(move || run_loop(&remote, &probe, &gate, &shutdown, &config, &user_id))?;

        self.handle = Some(handle);
        tracing::info!(interval = ?self.config.interval, "sync service started");
        Ok(())
    }

    /// Signal shutdown and join the worker.
    ///
    /// An in-flight drain pass runs to completion before the worker
    /// exits; stopping a stopped service is a no-op.
    pub fn stop(&mut self) {
        self.shutdown.store(true, Ordering::SeqCst);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
            tracing::info!("sync service stopped");
        }
    }
}

impl Drop for SyncService {
    fn drop(&mut self) {
        self.stop();
    }
}

fn run_loop(
    remote: &Arc<dyn RemoteStore + Send + Sync>,
    probe: &Arc<dyn ConnectivityProbe + Send + Sync>,
    gate: &Arc<Mutex<()>>,
    shutdown: &AtomicBool,
    config: &SyncServiceConfig,
    user_id: &str,
) {
    let mut was_online = false;
    let mut next_probe = Instant::now();
    let mut next_drain = Instant::now();

    while !shutdown.load(Ordering::SeqCst) {
        if Instant::now() >= next_probe {
            next_probe = Instant::now() + PROBE_EVERY;

            let online = probe.is_online();
            let regained = online && !was_online;
            if regained {
                tracing::info!("connectivity restored");
            }
            was_online = online;

            if online && (regained || Instant::now() >= next_drain) {
                drain_once(remote.as_ref(), gate, config, user_id);
                next_drain = Instant::now() + config.interval;
            }
        }

        std::thread::sleep(TICK);
    }
}

fn drain_once(
    remote: &(dyn RemoteStore + Send + Sync),
    gate: &Arc<Mutex<()>>,
    config: &SyncServiceConfig,
    user_id: &str,
) {
    let db = match Database::open_at(&config.db_path) {
        Ok(db) => db,
        Err(e) => {
            tracing::warn!(error = %e, "sync worker could not open database");
            return;
        }
    };

    let queue = SyncQueue::with_database(db);
    let driver = SyncDriver::with_gate(remote, &queue, Arc::clone(gate));

    match driver.drain(user_id) {
        Ok(report) => {
            if report.processed > 0 {
                tracing::info!(
                    synced = report.synced,
                    failed = report.failed,
                    "drained sync queue"
                );
            }
            let kv = KvStore::new(queue.database());
            if let Err(e) = kv.set(KEY_LAST_SYNC, &Utc::now().to_rfc3339()) {
                tracing::warn!(error = %e, "could not record last sync time");
            }
        }
        Err(e) => tracing::warn!(error = %e, "sync drain failed"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SkymarkError;
    use crate::features::sync::operation::{OpKind, QueueItem, QueueStatus};
    use serde_json::{json, Value};
    use std::sync::atomic::AtomicUsize;

    struct CountingRemote {
        inserts: AtomicUsize,
    }

    impl CountingRemote {
        fn new() -> Self {
            Self {
                inserts: AtomicUsize::new(0),
            }
        }
    }

    impl RemoteStore for CountingRemote {
        fn insert(&self, _table: &str, _payload: &Value) -> Result<(), SkymarkError> {
            self.inserts.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        fn update(&self, _table: &str, _id: &str, _payload: &Value) -> Result<(), SkymarkError> {
            Ok(())
        }

        fn delete(&self, _table: &str, _id: &str) -> Result<(), SkymarkError> {
            Ok(())
        }
    }

    struct AlwaysOnline;

    impl ConnectivityProbe for AlwaysOnline {
        fn is_online(&self) -> bool {
            true
        }
    }

    fn service_config(dir: &tempfile::TempDir) -> SyncServiceConfig {
        SyncServiceConfig {
            db_path: dir.path().join("queue.db"),
            interval: Duration::from_secs(3600),
        }
    }

    #[test]
    fn test_start_drains_queued_items_once_online() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let config = service_config(&temp_dir);

        // Queue an item before the service starts
        let queue = SyncQueue::with_database(Database::open_at(&config.db_path).unwrap());
        let mut item = QueueItem::new("user-1", OpKind::Insert, "annotations", &json!({"id": "a"}));
        queue.enqueue(&mut item).unwrap();

        let remote = Arc::new(CountingRemote::new());
        let mut service = SyncService::new(
            Arc::clone(&remote) as Arc<dyn RemoteStore + Send + Sync>,
            Arc::new(AlwaysOnline),
            config,
            "user-1".to_string(),
        );

        service.start().unwrap();
        assert!(service.is_running());

        // The first probe fires immediately; give the worker a moment
        let deadline = Instant::now() + Duration::from_secs(5);
        while remote.inserts.load(Ordering::SeqCst) == 0 && Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(50));
        }
        service.stop();
        assert!(!service.is_running());

        assert_eq!(remote.inserts.load(Ordering::SeqCst), 1);
        let item = queue.get(item.id.unwrap()).unwrap().unwrap();
        assert_eq!(item.status, QueueStatus::Synced);

        // A completed drain records the last-sync timestamp
        let kv = KvStore::new(queue.database());
        assert!(kv.get(KEY_LAST_SYNC).unwrap().is_some());
    }

    #[test]
    fn test_stop_without_start_is_noop() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let mut service = SyncService::new(
            Arc::new(CountingRemote::new()),
            Arc::new(AlwaysOnline),
            service_config(&temp_dir),
            "user-1".to_string(),
        );

        assert!(!service.is_running());
        service.stop();
        assert!(!service.is_running());
    }

    #[test]
    fn test_start_twice_keeps_one_worker() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let mut service = SyncService::new(
            Arc::new(CountingRemote::new()),
            Arc::new(AlwaysOnline),
            service_config(&temp_dir),
            "user-1".to_string(),
        );

        service.start().unwrap();
        service.start().unwrap();
        assert!(service.is_running());
        service.stop();
    }
}
