//! Synchronization between the source system and the search index.

mod engine;
mod state;

pub use engine::{ApplyOutcome, EngineConfig, ImportMode, RebuildReport, SyncEngine};
pub use state::{SyncState, SyncStats, SyncStatsSnapshot};
