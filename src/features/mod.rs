//! Feature implementations for skymark.
//!
//! This module contains the implementation of the offline-first write
//! machinery:
//! - Sync queue (durable outbox for mutations recorded offline)
//! - Sync driver and background sync service
//! - Offline-aware write path

pub mod sync;
