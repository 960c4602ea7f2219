//! Engine lifecycle state and statistics.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Lifecycle of the engine: `Uninitialized -> Initializing -> Ready`.
///
/// There is no transition back to `Uninitialized`; a bootstrap that never
/// reaches `Ready` ends the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncState {
    Uninitialized,
    Initializing,
    Ready,
}

impl SyncState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Uninitialized => "uninitialized",
            Self::Initializing => "initializing",
            Self::Ready => "ready",
        }
    }
}

impl fmt::Display for SyncState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Running counters of the engine since startup.
#[derive(Debug, Default)]
pub struct SyncStats {
    pub(crate) notifications_applied: AtomicU64,
    pub(crate) documents_upserted: AtomicU64,
    pub(crate) documents_deleted: AtomicU64,
    pub(crate) documents_skipped: AtomicU64,
    pub(crate) upsert_failures: AtomicU64,
    pub(crate) stale_neighbours: AtomicU64,
    pub(crate) rebuilds_completed: AtomicU64,
}

impl SyncStats {
    pub(crate) fn add(counter: &AtomicU64, n: usize) {
        counter.fetch_add(n as u64, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> SyncStatsSnapshot {
        SyncStatsSnapshot {
            notifications_applied: self.notifications_applied.load(Ordering::Relaxed),
            documents_upserted: self.documents_upserted.load(Ordering::Relaxed),
            documents_deleted: self.documents_deleted.load(Ordering::Relaxed),
            documents_skipped: self.documents_skipped.load(Ordering::Relaxed),
            upsert_failures: self.upsert_failures.load(Ordering::Relaxed),
            stale_neighbours: self.stale_neighbours.load(Ordering::Relaxed),
            rebuilds_completed: self.rebuilds_completed.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of [`SyncStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncStatsSnapshot {
    pub notifications_applied: u64,
    pub documents_upserted: u64,
    pub documents_deleted: u64,
    pub documents_skipped: u64,
    pub upsert_failures: u64,
    /// Documents that embed a changed node and were left for the next rebuild.
    pub stale_neighbours: u64,
    pub rebuilds_completed: u64,
}
