//! # Terminology Indexer Shared
//!
//! Data structures shared across the terminology indexer crates: the source
//! system's node graph, the flattened documents written to the search index,
//! change events delivered by the source system's webhook, and the pure
//! transformer that turns the former into the latter.

pub mod transform;
pub mod types;

pub use transform::{
    create_sort_labels, transform, transform_concept, transform_vocabulary, TransformContext,
    TransformError, DEFAULT_SORT_LANGUAGES,
};
pub use types::change_event::{
    BatchNotification, ChangeEvent, ChangeEventType, ChangedNode, NotificationPayload,
};
pub use types::index_document::{ConceptDocument, IndexDocument, VocabularyDocument};
pub use types::source_node::{
    GraphRef, LocalizedLabels, LocalizedValue, NodeRef, NodeTypeId, NodeTypeRef, SourceNode,
};
