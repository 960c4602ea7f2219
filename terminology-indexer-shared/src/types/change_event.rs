//! Change events delivered by the source system's webhook.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::source_node::{NodeTypeId, NodeTypeRef};

/// Kind of change reported for a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChangeEventType {
    #[serde(alias = "NodeSavedEvent")]
    NodeSaved,
    #[serde(alias = "NodeDeletedEvent")]
    NodeDeleted,
}

/// Identifies the changed node. Every field is optional on the wire; missing
/// fields are handled by the engine rather than rejected at parse time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangedNode {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Uuid>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub node_type: Option<NodeTypeRef>,
}

/// A single change of a single node. Transient, consumed once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeEvent {
    pub event_type: ChangeEventType,
    pub node: ChangedNode,
}

impl ChangeEvent {
    pub fn saved(id: Uuid, type_id: NodeTypeId, graph_id: Uuid) -> Self {
        Self {
            event_type: ChangeEventType::NodeSaved,
            node: ChangedNode {
                id: Some(id),
                node_type: Some(NodeTypeRef::new(type_id, Some(graph_id))),
            },
        }
    }

    pub fn deleted(id: Uuid) -> Self {
        Self {
            event_type: ChangeEventType::NodeDeleted,
            node: ChangedNode {
                id: Some(id),
                node_type: None,
            },
        }
    }

    pub fn node_id(&self) -> Option<Uuid> {
        self.node.id
    }

    pub fn type_id(&self) -> Option<&NodeTypeId> {
        self.node.node_type.as_ref().map(|t| &t.id)
    }

    pub fn graph_id(&self) -> Option<Uuid> {
        self.node.node_type.as_ref().and_then(|t| t.graph.id)
    }
}

/// A webhook delivery with several nodes sharing one event type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchNotification {
    pub event_type: ChangeEventType,
    #[serde(default)]
    pub nodes: Vec<ChangedNode>,
}

/// Body of one webhook delivery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NotificationPayload {
    Single(ChangeEvent),
    Many(Vec<ChangeEvent>),
    Batch(BatchNotification),
}

impl NotificationPayload {
    /// Flatten the delivery into events, preserving delivery order.
    pub fn into_events(self) -> Vec<ChangeEvent> {
        match self {
            Self::Single(event) => vec![event],
            Self::Many(events) => events,
            Self::Batch(batch) => batch
                .nodes
                .into_iter()
                .map(|node| ChangeEvent {
                    event_type: batch.event_type,
                    node,
                })
                .collect(),
        }
    }
}
