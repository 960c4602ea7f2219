//! Client for the terminology source system.
//!
//! This crate provides:
//! - [`SourceSystem`] trait abstracting node fetches and webhook subscriptions
//! - [`HttpSourceClient`] production client talking to the source system's REST API
//! - [`MockSourceSystem`] in-memory implementation for tests and local runs
//! - [`SourceError`] separating an unreachable endpoint from a rejected request
//!
//! ## Usage
//!
//! ```ignore
//! use source_client::{HttpSourceClient, SourceClientConfig, SourceSystem};
//!
//! let client = HttpSourceClient::new(SourceClientConfig::new("http://localhost:9102/api"))?;
//! let nodes = client.fetch_all_nodes().await?;
//! let hook_id = client.register_webhook("http://localhost:8001/notify").await?;
//! ```

mod client;
mod mock;

pub use client::{parse_node_list, HttpSourceClient, SourceClientConfig, NODE_SELECT};
pub use mock::MockSourceSystem;

use std::collections::HashMap;

use async_trait::async_trait;
use terminology_indexer_shared::SourceNode;
use uuid::Uuid;

#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// Connection-level failure: DNS, refused connection, timeout.
    #[error("source system unreachable: {0}")]
    Unreachable(String),
    /// The source system answered with a non-2xx status other than 404.
    #[error("source system rejected {operation} with status {status}: {body}")]
    Rejected {
        operation: &'static str,
        status: u16,
        body: String,
    },
    #[error("failed to decode source system response: {0}")]
    Decode(String),
    #[error("invalid source client configuration: {0}")]
    Config(String),
}

impl SourceError {
    /// Whether the endpoint could not be reached at all.
    pub fn is_unreachable(&self) -> bool {
        matches!(self, Self::Unreachable(_))
    }
}

impl From<reqwest::Error> for SourceError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() || err.is_body() {
            Self::Decode(err.to_string())
        } else {
            Self::Unreachable(err.to_string())
        }
    }
}

pub type Result<T> = std::result::Result<T, SourceError>;

/// Read access to the source system's node graph plus webhook management.
///
/// This trait abstracts the source system so the sync engine can be tested
/// against [`MockSourceSystem`]. A 404 answer is never an error: fetches
/// return `None` or an empty collection instead.
#[async_trait]
pub trait SourceSystem: Send + Sync {
    /// Fetch every node of every graph, keyed by node id.
    ///
    /// Malformed entries are skipped without failing the batch.
    async fn fetch_all_nodes(&self) -> Result<HashMap<Uuid, SourceNode>>;

    /// Fetch a single node of a graph.
    async fn fetch_node(&self, graph_id: Uuid, id: Uuid) -> Result<Option<SourceNode>>;

    /// Fetch every node of one graph (vocabulary).
    async fn fetch_nodes_in_vocabulary(&self, graph_id: Uuid) -> Result<Vec<SourceNode>>;

    /// Subscribe `callback_url` to change notifications.
    ///
    /// Returns the hook id, or `None` when the source system declined.
    async fn register_webhook(&self, callback_url: &str) -> Result<Option<String>>;

    /// Remove a subscription. Returns whether the source system accepted it.
    async fn deregister_webhook(&self, hook_id: &str) -> Result<bool>;
}
