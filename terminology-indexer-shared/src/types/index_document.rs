//! Index document types.
//!
//! These are the flattened, denormalized records written to the search index.
//! Concept documents embed a summary of their vocabulary so that a single index
//! lookup returns everything a search result needs.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::source_node::LocalizedLabels;

/// Vocabulary document.
///
/// Stored standalone for vocabulary-level search and embedded inside every
/// concept document of the same graph. The id is the graph id, not the id of
/// the vocabulary node.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VocabularyDocument {
    pub id: Uuid,
    pub label: LocalizedLabels,
    #[serde(default)]
    pub sort_by_label: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified: Option<String>,
}

/// Concept document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ConceptDocument {
    pub id: Uuid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,
    /// Summary of the owning vocabulary; `None` when the vocabulary node was not
    /// part of the lookup table at transform time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vocabulary: Option<VocabularyDocument>,
    pub label: LocalizedLabels,
    #[serde(default)]
    pub alt_label: LocalizedLabels,
    #[serde(default)]
    pub definition: BTreeMap<String, String>,
    #[serde(default)]
    pub broader: Vec<Uuid>,
    #[serde(default)]
    pub narrower: Vec<Uuid>,
    pub has_narrower: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified: Option<String>,
    #[serde(default)]
    pub sort_by_label: BTreeMap<String, String>,
}

/// A document of the search index.
///
/// Both document kinds share one index; `documentType` tells them apart.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "documentType", rename_all = "lowercase")]
pub enum IndexDocument {
    Concept(ConceptDocument),
    Vocabulary(VocabularyDocument),
}

impl IndexDocument {
    pub fn id(&self) -> Uuid {
        match self {
            Self::Concept(doc) => doc.id,
            Self::Vocabulary(doc) => doc.id,
        }
    }

    /// The id used for the document in the search index.
    pub fn document_id(&self) -> String {
        self.id().to_string()
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Concept(_) => "concept",
            Self::Vocabulary(_) => "vocabulary",
        }
    }
}

impl From<ConceptDocument> for IndexDocument {
    fn from(doc: ConceptDocument) -> Self {
        Self::Concept(doc)
    }
}

impl From<VocabularyDocument> for IndexDocument {
    fn from(doc: VocabularyDocument) -> Self {
        Self::Vocabulary(doc)
    }
}
