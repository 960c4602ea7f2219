//! Search index provider trait definition.
//!
//! This module defines the abstract interface for index lifecycle and document
//! operations, allowing for different backend implementations.

use async_trait::async_trait;
use serde_json::Value;
use terminology_indexer_shared::IndexDocument;

use crate::errors::SearchIndexError;

/// Abstracts the underlying search index implementation.
///
/// Implementations are injected into the sync engine so that it can be tested
/// against an in-memory index. Every write returns `Ok(())` only for a 2xx
/// answer; callers decide whether an `Err` is fatal or merely logged.
///
/// # Index Lifecycle
///
/// `index_exists`, `create_index`, `create_mapping` and `delete_index` manage
/// the single index the provider was configured with. Settings and mapping
/// documents are passed in by the caller.
#[async_trait]
pub trait SearchIndexProvider: Send + Sync {
    /// Probe whether the index exists.
    ///
    /// Only a 404 answer means "does not exist". Any other answer, including
    /// error statuses, is reported as existing so a flaky backend never
    /// triggers re-creation. Transport failures are returned as
    /// `SearchIndexError::ConnectionError`.
    async fn index_exists(&self) -> Result<bool, SearchIndexError>;

    /// Create the index with the given settings document.
    async fn create_index(&self, settings: &Value) -> Result<(), SearchIndexError>;

    /// Put the field mapping document on the index.
    async fn create_mapping(&self, mapping: &Value) -> Result<(), SearchIndexError>;

    /// Create or overwrite a document, keyed by its id.
    async fn upsert_document(&self, document: &IndexDocument) -> Result<(), SearchIndexError>;

    /// Delete a document by id.
    ///
    /// If the document doesn't exist, the operation is considered successful.
    async fn delete_document(&self, id: &str) -> Result<(), SearchIndexError>;

    /// Delete the whole index.
    ///
    /// If the index doesn't exist, the operation is considered successful.
    async fn delete_index(&self) -> Result<(), SearchIndexError>;
}
