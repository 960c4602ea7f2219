//! Source node types.
//!
//! A [`SourceNode`] is one record of the source system's node graph as it is
//! returned by the node listing endpoints. The engine only ever reads these;
//! they are fetched on demand and dropped when the operation that fetched them
//! completes.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Localized strings grouped by language, keeping every value in source order.
pub type LocalizedLabels = BTreeMap<String, Vec<String>>;

/// Type identifier of a node.
///
/// Unknown type ids are preserved as [`NodeTypeId::Other`] so that listing
/// endpoints returning new node types never fail to decode.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum NodeTypeId {
    Vocabulary,
    TerminologicalVocabulary,
    Concept,
    Term,
    Collection,
    Other(String),
}

impl NodeTypeId {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Vocabulary => "Vocabulary",
            Self::TerminologicalVocabulary => "TerminologicalVocabulary",
            Self::Concept => "Concept",
            Self::Term => "Term",
            Self::Collection => "Collection",
            Self::Other(other) => other,
        }
    }

    /// Whether nodes of this type describe a whole vocabulary (graph).
    pub fn is_vocabulary(&self) -> bool {
        matches!(self, Self::Vocabulary | Self::TerminologicalVocabulary)
    }
}

impl From<String> for NodeTypeId {
    fn from(value: String) -> Self {
        match value.as_str() {
            "Vocabulary" => Self::Vocabulary,
            "TerminologicalVocabulary" => Self::TerminologicalVocabulary,
            "Concept" => Self::Concept,
            "Term" => Self::Term,
            "Collection" => Self::Collection,
            _ => Self::Other(value),
        }
    }
}

impl From<NodeTypeId> for String {
    fn from(value: NodeTypeId) -> Self {
        value.as_str().to_string()
    }
}

impl std::fmt::Display for NodeTypeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reference to the graph (vocabulary) owning a node.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphRef {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Uuid>,
}

/// The `type` object of a node: type id plus owning graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeTypeRef {
    pub id: NodeTypeId,
    #[serde(default)]
    pub graph: GraphRef,
}

impl NodeTypeRef {
    pub fn new(id: NodeTypeId, graph_id: Option<Uuid>) -> Self {
        Self {
            id,
            graph: GraphRef { id: graph_id },
        }
    }
}

/// A single `{lang, value}` entry of a localized property.
///
/// Properties without a language (e.g. `status`) carry an empty `lang`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalizedValue {
    #[serde(default)]
    pub lang: String,
    #[serde(default)]
    pub value: String,
}

impl LocalizedValue {
    pub fn new(lang: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            lang: lang.into(),
            value: value.into(),
        }
    }

    /// Both language and value are present.
    pub fn is_well_formed(&self) -> bool {
        !self.lang.is_empty() && !self.value.is_empty()
    }
}

/// Pointer from one node to another inside `references` or `referrers`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeRef {
    pub id: Uuid,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub node_type: Option<NodeTypeRef>,
}

/// A node of the source system's graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceNode {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub node_type: NodeTypeRef,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_modified_date: Option<String>,
    #[serde(default)]
    pub properties: BTreeMap<String, Vec<LocalizedValue>>,
    #[serde(default)]
    pub references: BTreeMap<String, Vec<NodeRef>>,
    #[serde(default)]
    pub referrers: BTreeMap<String, Vec<NodeRef>>,
}

impl SourceNode {
    /// Create a node with no properties, references or referrers.
    pub fn new(id: Uuid, type_id: NodeTypeId, graph_id: Option<Uuid>) -> Self {
        Self {
            id,
            node_type: NodeTypeRef::new(type_id, graph_id),
            uri: None,
            code: None,
            last_modified_date: None,
            properties: BTreeMap::new(),
            references: BTreeMap::new(),
            referrers: BTreeMap::new(),
        }
    }

    /// Append a localized value to a property.
    pub fn with_property(
        mut self,
        name: &str,
        lang: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        self.properties
            .entry(name.to_string())
            .or_default()
            .push(LocalizedValue::new(lang, value));
        self
    }

    /// Append a reference to another node.
    pub fn with_reference(mut self, name: &str, target: Uuid) -> Self {
        self.references
            .entry(name.to_string())
            .or_default()
            .push(NodeRef {
                id: target,
                node_type: None,
            });
        self
    }

    /// Append a referrer (a node referencing this one under `name`).
    pub fn with_referrer(mut self, name: &str, source: Uuid) -> Self {
        self.referrers
            .entry(name.to_string())
            .or_default()
            .push(NodeRef {
                id: source,
                node_type: None,
            });
        self
    }

    pub fn type_id(&self) -> &NodeTypeId {
        &self.node_type.id
    }

    pub fn graph_id(&self) -> Option<Uuid> {
        self.node_type.graph.id
    }

    /// Values of a property, empty when the property is absent.
    pub fn property(&self, name: &str) -> &[LocalizedValue] {
        self.properties.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    /// First value of a property regardless of language.
    pub fn first_value(&self, name: &str) -> Option<&str> {
        self.property(name)
            .iter()
            .map(|v| v.value.as_str())
            .find(|v| !v.is_empty())
    }

    /// Ids of the nodes this node references under `name`.
    pub fn reference_ids<'a>(&'a self, name: &str) -> impl Iterator<Item = Uuid> + 'a {
        self.references
            .get(name)
            .into_iter()
            .flatten()
            .map(|r| r.id)
    }

    /// Ids of the nodes referencing this node under `name`.
    pub fn referrer_ids<'a>(&'a self, name: &str) -> impl Iterator<Item = Uuid> + 'a {
        self.referrers.get(name).into_iter().flatten().map(|r| r.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_source_node() {
        let json = r#"{
            "id": "550e8400-e29b-41d4-a716-446655440000",
            "type": {"id": "Concept", "graph": {"id": "6ba7b810-9dad-11d1-80b4-00c04fd430c8"}},
            "uri": "http://uri.example/c1",
            "lastModifiedDate": "2018-03-21T10:36:34.360+02:00",
            "properties": {
                "prefLabel": [{"lang": "fi", "value": "Esimerkki", "regex": "(?s)^.*$"}],
                "status": [{"lang": "", "value": "DRAFT"}]
            },
            "references": {
                "broader": [{"id": "7ba7b810-9dad-11d1-80b4-00c04fd430c8", "type": {"id": "Concept"}}]
            },
            "referrers": {}
        }"#;

        let node: SourceNode = serde_json::from_str(json).unwrap();

        assert_eq!(node.type_id(), &NodeTypeId::Concept);
        assert_eq!(
            node.graph_id().unwrap().to_string(),
            "6ba7b810-9dad-11d1-80b4-00c04fd430c8"
        );
        assert_eq!(node.property("prefLabel")[0].value, "Esimerkki");
        assert_eq!(node.first_value("status"), Some("DRAFT"));
        assert_eq!(node.reference_ids("broader").count(), 1);
        assert_eq!(node.referrer_ids("broader").count(), 0);
    }

    #[test]
    fn test_unknown_type_is_preserved() {
        let json = r#"{"id": "550e8400-e29b-41d4-a716-446655440000", "type": {"id": "Organization"}}"#;
        let node: SourceNode = serde_json::from_str(json).unwrap();

        assert_eq!(node.type_id(), &NodeTypeId::Other("Organization".to_string()));
        assert!(node.graph_id().is_none());
        assert!(node.properties.is_empty());
    }

    #[test]
    fn test_missing_id_fails_to_decode() {
        let json = r#"{"type": {"id": "Concept"}}"#;
        assert!(serde_json::from_str::<SourceNode>(json).is_err());
    }

    #[test]
    fn test_vocabulary_types() {
        assert!(NodeTypeId::Vocabulary.is_vocabulary());
        assert!(NodeTypeId::TerminologicalVocabulary.is_vocabulary());
        assert!(!NodeTypeId::Concept.is_vocabulary());
        assert_eq!(String::from(NodeTypeId::Term), "Term");
    }
}
