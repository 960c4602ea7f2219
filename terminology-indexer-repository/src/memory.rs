//! In-memory search index.
//!
//! `InMemorySearchIndex` implements `SearchIndexProvider` over a hash map and
//! records every call, allowing tests and local runs without an OpenSearch
//! cluster. Failures can be injected per document id or as connection errors.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use serde_json::Value;
use terminology_indexer_shared::IndexDocument;

use crate::errors::SearchIndexError;
use crate::interfaces::SearchIndexProvider;

/// A call made against the in-memory index, in call order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IndexOperation {
    Exists,
    CreateIndex,
    CreateMapping,
    Upsert(String),
    Delete(String),
    DeleteIndex,
}

#[derive(Default)]
struct IndexState {
    exists: bool,
    settings: Option<Value>,
    mapping: Option<Value>,
    documents: HashMap<String, IndexDocument>,
    operations: Vec<IndexOperation>,
}

/// Search index held in memory.
#[derive(Default)]
pub struct InMemorySearchIndex {
    state: Mutex<IndexState>,
    rejected_ids: Mutex<HashSet<String>>,
    connection_failures: AtomicUsize,
    lose_create_ack: AtomicBool,
}

impl InMemorySearchIndex {
    /// Create an index that does not exist yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an index that already exists (empty).
    pub fn existing() -> Self {
        let index = Self::default();
        index.lock().exists = true;
        index
    }

    /// Reject every upsert of the document with this id with a 400 answer.
    pub fn reject_document(&self, id: impl Into<String>) {
        self.rejected_ids
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(id.into());
    }

    /// Fail the next `count` calls with a connection error.
    pub fn fail_next_connections(&self, count: usize) {
        self.connection_failures.store(count, Ordering::SeqCst);
    }

    /// Create the index on the next `create_index` call but answer it with a
    /// connection error, as when the response times out.
    pub fn lose_next_create_ack(&self) {
        self.lose_create_ack.store(true, Ordering::SeqCst);
    }

    pub fn exists(&self) -> bool {
        self.lock().exists
    }

    pub fn document(&self, id: &str) -> Option<IndexDocument> {
        self.lock().documents.get(id).cloned()
    }

    pub fn documents(&self) -> HashMap<String, IndexDocument> {
        self.lock().documents.clone()
    }

    pub fn document_count(&self) -> usize {
        self.lock().documents.len()
    }

    pub fn mapping(&self) -> Option<Value> {
        self.lock().mapping.clone()
    }

    pub fn settings(&self) -> Option<Value> {
        self.lock().settings.clone()
    }

    pub fn operations(&self) -> Vec<IndexOperation> {
        self.lock().operations.clone()
    }

    /// Insert a document directly, bypassing failure injection and the log.
    pub fn seed(&self, document: IndexDocument) {
        self.lock()
            .documents
            .insert(document.document_id(), document);
    }

    fn lock(&self) -> MutexGuard<'_, IndexState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Consume one injected connection failure, if any, and record the call.
    fn enter(
        &self,
        operation: IndexOperation,
    ) -> Result<MutexGuard<'_, IndexState>, SearchIndexError> {
        let failed = self
            .connection_failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failed {
            return Err(SearchIndexError::connection("connection refused"));
        }

        let mut state = self.lock();
        state.operations.push(operation);
        Ok(state)
    }
}

#[async_trait]
impl SearchIndexProvider for InMemorySearchIndex {
    async fn index_exists(&self) -> Result<bool, SearchIndexError> {
        let state = self.enter(IndexOperation::Exists)?;
        Ok(state.exists)
    }

    async fn create_index(&self, settings: &Value) -> Result<(), SearchIndexError> {
        let mut state = self.enter(IndexOperation::CreateIndex)?;
        if state.exists {
            return Err(SearchIndexError::rejected(
                "create index",
                400,
                "resource_already_exists_exception",
            ));
        }
        state.exists = true;
        state.settings = Some(settings.clone());
        if self.lose_create_ack.swap(false, Ordering::SeqCst) {
            return Err(SearchIndexError::connection("request timed out"));
        }
        Ok(())
    }

    async fn create_mapping(&self, mapping: &Value) -> Result<(), SearchIndexError> {
        let mut state = self.enter(IndexOperation::CreateMapping)?;
        if !state.exists {
            return Err(SearchIndexError::rejected(
                "put mapping",
                404,
                "index_not_found_exception",
            ));
        }
        state.mapping = Some(mapping.clone());
        Ok(())
    }

    async fn upsert_document(&self, document: &IndexDocument) -> Result<(), SearchIndexError> {
        let doc_id = document.document_id();
        let rejected = self
            .rejected_ids
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .contains(&doc_id);

        let mut state = self.enter(IndexOperation::Upsert(doc_id.clone()))?;
        if rejected {
            return Err(SearchIndexError::rejected(
                "upsert document",
                400,
                "mapper_parsing_exception",
            ));
        }
        // Writing to a missing index creates it, as OpenSearch does
        state.exists = true;
        state.documents.insert(doc_id, document.clone());
        Ok(())
    }

    async fn delete_document(&self, id: &str) -> Result<(), SearchIndexError> {
        let mut state = self.enter(IndexOperation::Delete(id.to_string()))?;
        state.documents.remove(id);
        Ok(())
    }

    async fn delete_index(&self) -> Result<(), SearchIndexError> {
        let mut state = self.enter(IndexOperation::DeleteIndex)?;
        state.exists = false;
        state.settings = None;
        state.mapping = None;
        state.documents.clear();
        Ok(())
    }
}
