//! Error types for the synchronization engine.

use source_client::SourceError;
use terminology_indexer_repository::SearchIndexError;
use thiserror::Error;

use crate::sync::SyncState;

/// Errors that can occur while synchronizing the index with the source system.
#[derive(Error, Debug)]
pub enum SyncError {
    /// Error from the source system client.
    #[error("Source system error: {0}")]
    Source(#[from] SourceError),

    /// Error from the search index.
    #[error("Search index error: {0}")]
    Index(#[from] SearchIndexError),

    /// A document could not be written while building a fresh index.
    #[error("Failed to index document {document_id} during bootstrap: {source}")]
    BootstrapWrite {
        document_id: String,
        source: SearchIndexError,
    },

    /// A full rebuild was requested before the index was bootstrapped.
    #[error("Index not ready (state: {state})")]
    NotReady { state: SyncState },
}

impl SyncError {
    /// Whether the failure was an unreachable endpoint, the only kind the
    /// bootstrap sequence retries.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Source(e) => e.is_unreachable(),
            Self::Index(e) => e.is_connection(),
            Self::BootstrapWrite { source, .. } => source.is_connection(),
            Self::NotReady { .. } => false,
        }
    }
}
