//! Mock source system for testing and local development.
//!
//! The `MockSourceSystem` holds a node graph in memory, records webhook calls
//! and can simulate an unreachable endpoint for a number of calls.
//!
//! # Example
//!
//! ```ignore
//! use source_client::{MockSourceSystem, SourceSystem};
//!
//! let source = MockSourceSystem::with_nodes(vec![vocabulary, concept]);
//! source.fail_next_calls(2);
//! assert!(source.fetch_all_nodes().await.is_err());
//! ```

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, RwLock};

use async_trait::async_trait;
use terminology_indexer_shared::SourceNode;
use uuid::Uuid;

use crate::{Result, SourceError, SourceSystem};

/// In-memory source system.
pub struct MockSourceSystem {
    nodes: RwLock<HashMap<Uuid, SourceNode>>,
    unreachable_calls: AtomicUsize,
    hook_id: RwLock<Option<String>>,
    registered: Mutex<Vec<String>>,
    deregistered: Mutex<Vec<String>>,
}

impl MockSourceSystem {
    /// Create an empty source system that hands out hook id `hook-1`.
    pub fn new() -> Self {
        Self {
            nodes: RwLock::new(HashMap::new()),
            unreachable_calls: AtomicUsize::new(0),
            hook_id: RwLock::new(Some("hook-1".to_string())),
            registered: Mutex::new(Vec::new()),
            deregistered: Mutex::new(Vec::new()),
        }
    }

    pub fn with_nodes(nodes: impl IntoIterator<Item = SourceNode>) -> Self {
        let source = Self::new();
        for node in nodes {
            source.insert_node(node);
        }
        source
    }

    /// Add or replace a node.
    pub fn insert_node(&self, node: SourceNode) {
        self.nodes
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(node.id, node);
    }

    pub fn remove_node(&self, id: &Uuid) -> Option<SourceNode> {
        self.nodes
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .remove(id)
    }

    pub fn len(&self) -> usize {
        self.nodes.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Answer the next `count` calls with [`SourceError::Unreachable`].
    pub fn fail_next_calls(&self, count: usize) {
        self.unreachable_calls.store(count, Ordering::SeqCst);
    }

    /// Set the hook id returned by `register_webhook` (`None` declines).
    pub fn set_hook_id(&self, hook_id: Option<&str>) {
        *self.hook_id.write().unwrap_or_else(|e| e.into_inner()) = hook_id.map(str::to_string);
    }

    /// Callback URLs passed to `register_webhook`, in call order.
    pub fn registered_callbacks(&self) -> Vec<String> {
        self.registered
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Hook ids passed to `deregister_webhook`, in call order.
    pub fn deregistered_hooks(&self) -> Vec<String> {
        self.deregistered
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    fn check_reachable(&self) -> Result<()> {
        let failed = self
            .unreachable_calls
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failed {
            return Err(SourceError::Unreachable("connection refused".to_string()));
        }
        Ok(())
    }
}

impl Default for MockSourceSystem {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SourceSystem for MockSourceSystem {
    async fn fetch_all_nodes(&self) -> Result<HashMap<Uuid, SourceNode>> {
        self.check_reachable()?;
        Ok(self.nodes.read().unwrap_or_else(|e| e.into_inner()).clone())
    }

    async fn fetch_node(&self, graph_id: Uuid, id: Uuid) -> Result<Option<SourceNode>> {
        self.check_reachable()?;
        let nodes = self.nodes.read().unwrap_or_else(|e| e.into_inner());
        Ok(nodes
            .get(&id)
            .filter(|node| node.graph_id() == Some(graph_id))
            .cloned())
    }

    async fn fetch_nodes_in_vocabulary(&self, graph_id: Uuid) -> Result<Vec<SourceNode>> {
        self.check_reachable()?;
        let nodes = self.nodes.read().unwrap_or_else(|e| e.into_inner());
        let mut in_graph: Vec<SourceNode> = nodes
            .values()
            .filter(|node| node.graph_id() == Some(graph_id))
            .cloned()
            .collect();
        in_graph.sort_by_key(|node| node.id);
        Ok(in_graph)
    }

    async fn register_webhook(&self, callback_url: &str) -> Result<Option<String>> {
        self.check_reachable()?;
        self.registered
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(callback_url.to_string());
        Ok(self.hook_id.read().unwrap_or_else(|e| e.into_inner()).clone())
    }

    async fn deregister_webhook(&self, hook_id: &str) -> Result<bool> {
        self.check_reachable()?;
        self.deregistered
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(hook_id.to_string());
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use terminology_indexer_shared::NodeTypeId;

    #[tokio::test]
    async fn test_fetch_by_graph() {
        let graph = Uuid::new_v4();
        let other_graph = Uuid::new_v4();
        let concept = SourceNode::new(Uuid::new_v4(), NodeTypeId::Concept, Some(graph));
        let foreign = SourceNode::new(Uuid::new_v4(), NodeTypeId::Concept, Some(other_graph));
        let source = MockSourceSystem::with_nodes(vec![concept.clone(), foreign.clone()]);

        assert_eq!(source.len(), 2);
        assert_eq!(
            source.fetch_node(graph, concept.id).await.unwrap(),
            Some(concept.clone())
        );
        assert_eq!(source.fetch_node(graph, foreign.id).await.unwrap(), None);
        assert_eq!(
            source.fetch_nodes_in_vocabulary(graph).await.unwrap(),
            vec![concept]
        );
    }

    #[tokio::test]
    async fn test_unreachable_calls_are_consumed() {
        let source = MockSourceSystem::new();
        source.fail_next_calls(2);

        assert!(source.fetch_all_nodes().await.unwrap_err().is_unreachable());
        assert!(source.register_webhook("http://cb").await.is_err());
        assert!(source.fetch_all_nodes().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_webhook_calls_are_recorded() {
        let source = MockSourceSystem::new();

        let hook = source.register_webhook("http://cb/notify").await.unwrap();
        assert_eq!(hook.as_deref(), Some("hook-1"));
        assert!(source.deregister_webhook("hook-1").await.unwrap());

        source.set_hook_id(None);
        assert_eq!(source.register_webhook("http://cb/notify").await.unwrap(), None);

        assert_eq!(
            source.registered_callbacks(),
            vec!["http://cb/notify".to_string(), "http://cb/notify".to_string()]
        );
        assert_eq!(source.deregistered_hooks(), vec!["hook-1".to_string()]);
    }
}
