//! # Terminology Indexer
//!
//! Keeps an OpenSearch index of vocabularies and concepts eventually
//! consistent with the terminology source system.
//!
//! ## Architecture
//!
//! 1. **Bootstrap**: builds the index on startup and registers the webhook
//! 2. **Notify**: HTTP receiver for change notifications and manual reindex
//! 3. **Sync**: full rebuild and incremental update algorithms
//! 4. **Scheduler**: nightly full rebuild as the correctness backstop
//!
//! ## Modules
//!
//! - [`config`]: Settings and dependency initialization
//! - [`sync`]: The synchronization engine
//! - [`notify`]: HTTP surface
//! - [`scheduler`]: Scheduled reconciler
//! - [`bootstrap`]: Startup and shutdown sequencing
//! - [`errors`]: Error types for the engine

pub mod bootstrap;
pub mod config;
pub mod errors;
pub mod notify;
pub mod scheduler;
pub mod sync;

pub use config::{Dependencies, Settings};
pub use errors::SyncError;
pub use sync::{ApplyOutcome, EngineConfig, RebuildReport, SyncEngine, SyncState};

use thiserror::Error;

/// Errors that can occur during indexer initialization or execution.
#[derive(Error, Debug)]
pub enum IndexingError {
    /// Configuration error.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Synchronization error.
    #[error("Sync error: {0}")]
    SyncError(#[from] SyncError),

    /// HTTP server error.
    #[error("Server error: {0}")]
    ServerError(String),
}

impl IndexingError {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }

    /// Create a server error.
    pub fn server(msg: impl Into<String>) -> Self {
        Self::ServerError(msg.into())
    }
}
