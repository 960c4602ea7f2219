//! # Terminology Indexer Repository
//!
//! This crate provides the trait for managing the search index and the
//! documents inside it, a concrete implementation for OpenSearch, and an
//! in-memory implementation used by tests and local runs.

pub mod errors;
pub mod interfaces;
pub mod memory;
pub mod opensearch;

pub use errors::SearchIndexError;
pub use interfaces::SearchIndexProvider;
pub use memory::{InMemorySearchIndex, IndexOperation};
pub use opensearch::{IndexDefinition, OpenSearchProvider};
