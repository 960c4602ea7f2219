//! OpenSearch implementation of the search index provider.
//!
//! This module provides a concrete implementation of `SearchIndexProvider`
//! using OpenSearch as the backend, plus the index definition documents.

mod index_config;
mod provider;

pub use index_config::{
    default_index_settings, default_mapping, IndexDefinition, DEFAULT_INDEX_NAME,
};
pub use provider::{OpenSearchConfig, OpenSearchProvider};
