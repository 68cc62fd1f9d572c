//! Sync queue for offline operations.
//!
//! When a write is attempted without connectivity it is recorded here as
//! a queue item instead of failing. Once connectivity returns (or on the
//! periodic timer, or on an explicit sync) the driver replays the queue
//! against the backend in the order the items were recorded.
//!
//! Items move `pending -> synced` on a successful replay and
//! `pending -> failed` on a recorded failure. Failed items are never
//! retried automatically; an explicit retry resets one back to pending.

pub mod connectivity;
pub mod driver;
pub mod operation;
pub mod queue;
pub mod service;
pub mod writer;

pub use connectivity::{ConnectivityProbe, HttpProbe};
pub use driver::{format_drain_report, DrainReport, RemoteStore, SyncDriver};
pub use operation::{OpKind, QueueItem, QueueStatus};
pub use queue::{QueueStats, SyncQueue};
pub use service::{SyncService, SyncServiceConfig};
pub use writer::{OfflineWriter, WriteOutcome};
