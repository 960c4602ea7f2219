//! Transformation of source nodes into index documents.
//!
//! Everything in this module is pure: related nodes are supplied by the caller
//! through a [`TransformContext`] built for the duration of one synchronization
//! operation. A node that lacks any structural prerequisite produces a
//! [`TransformError`] describing why it is skipped, never a partial document.

mod concept;
mod labels;
mod vocabulary;

use std::collections::HashMap;

use thiserror::Error;
use uuid::Uuid;

use crate::types::index_document::{IndexDocument, VocabularyDocument};
use crate::types::source_node::{NodeTypeId, SourceNode};

pub use concept::transform_concept;
pub use labels::{create_sort_labels, DEFAULT_SORT_LANGUAGES};
pub use vocabulary::transform_vocabulary;

/// Property holding a node's own localized label.
pub const PREF_LABEL: &str = "prefLabel";
/// Property holding a concept's localized definition.
pub const DEFINITION: &str = "definition";
/// Property holding a concept's workflow status.
pub const STATUS: &str = "status";
/// Reference from a concept to the terms carrying its preferred labels.
pub const PREF_LABEL_XL: &str = "prefLabelXl";
/// Reference from a concept to the terms carrying its alternative labels.
pub const ALT_LABEL_XL: &str = "altLabelXl";
/// Reference from a concept to its broader concepts.
pub const BROADER: &str = "broader";

/// Why a node did not produce a document.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransformError {
    #[error("node {node_id} has no graph id")]
    MissingGraph { node_id: Uuid },

    #[error("node {node_id} has no resolvable label")]
    MissingLabel { node_id: Uuid },

    #[error("node {node_id} of type {type_id} is not indexed")]
    UnsupportedType { node_id: Uuid, type_id: String },
}

/// Related-node lookup for one synchronization operation.
///
/// Holds the nodes a document may pull labels from and the vocabulary table
/// (graph id -> vocabulary document) derived from them. The table is rebuilt
/// for every operation and dropped with the context.
pub struct TransformContext<'a> {
    nodes: &'a HashMap<Uuid, SourceNode>,
    vocabularies: HashMap<Uuid, VocabularyDocument>,
}

impl<'a> TransformContext<'a> {
    /// Build a context over `nodes`, deriving the vocabulary table from every
    /// well-formed vocabulary node among them.
    pub fn new(nodes: &'a HashMap<Uuid, SourceNode>) -> Self {
        let mut vocabulary_nodes: Vec<&SourceNode> = nodes
            .values()
            .filter(|node| node.type_id().is_vocabulary())
            .collect();
        vocabulary_nodes.sort_by_key(|node| node.id);

        let mut vocabularies = HashMap::new();
        for node in vocabulary_nodes {
            if let Ok(doc) = transform_vocabulary(node) {
                vocabularies.entry(doc.id).or_insert(doc);
            }
        }

        Self {
            nodes,
            vocabularies,
        }
    }

    pub fn node(&self, id: &Uuid) -> Option<&SourceNode> {
        self.nodes.get(id)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &SourceNode> {
        self.nodes.values()
    }

    pub fn vocabulary(&self, graph_id: &Uuid) -> Option<&VocabularyDocument> {
        self.vocabularies.get(graph_id)
    }

    pub fn vocabulary_count(&self) -> usize {
        self.vocabularies.len()
    }
}

/// Transform any indexable node into its document.
///
/// Concepts become concept documents, vocabulary nodes become vocabulary
/// documents; every other node type is [`TransformError::UnsupportedType`].
pub fn transform(
    node: &SourceNode,
    context: &TransformContext<'_>,
) -> Result<IndexDocument, TransformError> {
    match node.type_id() {
        NodeTypeId::Concept => transform_concept(node, context).map(IndexDocument::from),
        t if t.is_vocabulary() => transform_vocabulary(node).map(IndexDocument::from),
        other => Err(TransformError::UnsupportedType {
            node_id: node.id,
            type_id: other.to_string(),
        }),
    }
}
