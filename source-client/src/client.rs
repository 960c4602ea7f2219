//! HTTP implementation of [`SourceSystem`].

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client as ReqwestClient, RequestBuilder, Response, StatusCode};
use serde_json::Value;
use terminology_indexer_shared::SourceNode;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{Result, SourceError, SourceSystem};

/// Fields requested for every node listing.
pub const NODE_SELECT: &str =
    "id,type,uri,code,createdDate,lastModifiedDate,properties.*,references.*,referrers.*";

#[derive(Debug, Clone)]
pub struct SourceClientConfig {
    /// API base URL, e.g. `http://localhost:9102/api`.
    pub base_url: String,
    pub username: String,
    pub password: String,
    pub timeout: Duration,
}

impl SourceClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            username: "admin".to_string(),
            password: "admin".to_string(),
            timeout: Duration::from_secs(30),
        }
    }
}

/// Production client for the source system's REST API.
///
/// The underlying connection pool is shared by every call; credentials are
/// attached to each request.
pub struct HttpSourceClient {
    base_url: String,
    username: String,
    password: String,
    client: ReqwestClient,
}

impl HttpSourceClient {
    pub fn new(config: SourceClientConfig) -> Result<Self> {
        let client = ReqwestClient::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| SourceError::Config(e.to_string()))?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            username: config.username,
            password: config.password,
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request.basic_auth(&self.username, Some(&self.password))
    }

    /// GET `node-trees`, optionally filtered. A 404 yields an empty list.
    async fn list_nodes(&self, filter: Option<String>) -> Result<Vec<SourceNode>> {
        let mut query = vec![("select", NODE_SELECT.to_string()), ("max", "-1".to_string())];
        if let Some(filter) = filter {
            query.push(("where", filter));
        }

        let response = self
            .authorized(self.client.get(format!("{}/node-trees", self.base_url)))
            .query(&query)
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            debug!("Node listing returned 404, treating as empty");
            return Ok(Vec::new());
        }
        let response = ensure_success("fetch nodes", response).await?;

        let bytes = response.bytes().await?;
        let body: Value =
            serde_json::from_slice(&bytes).map_err(|e| SourceError::Decode(e.to_string()))?;
        match body {
            Value::Array(entries) => Ok(parse_node_list(entries)),
            other => Err(SourceError::Decode(format!(
                "expected a node array, got {}",
                json_kind(&other)
            ))),
        }
    }
}

#[async_trait]
impl SourceSystem for HttpSourceClient {
    async fn fetch_all_nodes(&self) -> Result<HashMap<Uuid, SourceNode>> {
        let nodes = self.list_nodes(None).await?;
        info!(count = nodes.len(), "Fetched all source nodes");
        Ok(nodes.into_iter().map(|node| (node.id, node)).collect())
    }

    async fn fetch_node(&self, graph_id: Uuid, id: Uuid) -> Result<Option<SourceNode>> {
        let filter = format!("graph.id:{} AND id:{}", graph_id, id);
        let nodes = self.list_nodes(Some(filter)).await?;
        Ok(nodes.into_iter().find(|node| node.id == id))
    }

    async fn fetch_nodes_in_vocabulary(&self, graph_id: Uuid) -> Result<Vec<SourceNode>> {
        let nodes = self.list_nodes(Some(format!("graph.id:{}", graph_id))).await?;
        debug!(graph_id = %graph_id, count = nodes.len(), "Fetched vocabulary nodes");
        Ok(nodes)
    }

    async fn register_webhook(&self, callback_url: &str) -> Result<Option<String>> {
        let response = self
            .authorized(self.client.post(format!("{}/hooks", self.base_url)))
            .query(&[("url", callback_url)])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = %status, body = %body, "Webhook registration declined");
            return Ok(None);
        }

        let body = response.text().await?;
        let hook_id = body.trim().trim_matches('"').trim();
        if hook_id.is_empty() {
            return Ok(None);
        }
        info!(hook_id, callback_url, "Registered webhook");
        Ok(Some(hook_id.to_string()))
    }

    async fn deregister_webhook(&self, hook_id: &str) -> Result<bool> {
        let response = self
            .authorized(
                self.client
                    .delete(format!("{}/hooks/{}", self.base_url, hook_id)),
            )
            .send()
            .await?;

        let accepted = response.status().is_success();
        if accepted {
            info!(hook_id, "Deregistered webhook");
        } else {
            warn!(hook_id, status = %response.status(), "Webhook deregistration declined");
        }
        Ok(accepted)
    }
}

/// Decode a node listing, skipping entries that are not valid nodes.
pub fn parse_node_list(entries: Vec<Value>) -> Vec<SourceNode> {
    let total = entries.len();
    let nodes: Vec<SourceNode> = entries
        .into_iter()
        .filter_map(|entry| {
            let id = entry.get("id").cloned();
            match serde_json::from_value::<SourceNode>(entry) {
                Ok(node) => Some(node),
                Err(e) => {
                    warn!(id = ?id, error = %e, "Skipping malformed source node");
                    None
                }
            }
        })
        .collect();

    if nodes.len() < total {
        warn!(
            skipped = total - nodes.len(),
            total, "Node listing contained malformed entries"
        );
    }
    nodes
}

async fn ensure_success(operation: &'static str, response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(SourceError::Rejected {
        operation,
        status: status.as_u16(),
        body,
    })
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
