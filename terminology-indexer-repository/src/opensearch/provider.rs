//! OpenSearch provider implementation.
//!
//! This module provides the concrete implementation of `SearchIndexProvider`
//! using the OpenSearch Rust crate.

use std::time::Duration;

use async_trait::async_trait;
use opensearch::{
    auth::Credentials,
    http::response::Response,
    http::transport::{SingleNodeConnectionPool, TransportBuilder},
    indices::{IndicesCreateParts, IndicesDeleteParts, IndicesExistsParts, IndicesPutMappingParts},
    DeleteParts, IndexParts, OpenSearch,
};
use serde_json::Value;
use terminology_indexer_shared::IndexDocument;
use tracing::{debug, error, info};
use url::Url;

use crate::errors::SearchIndexError;
use crate::interfaces::SearchIndexProvider;

/// Connection settings for the OpenSearch provider.
#[derive(Debug, Clone)]
pub struct OpenSearchConfig {
    /// The OpenSearch server URL (e.g., "http://localhost:9200").
    pub url: String,
    /// Name of the index all operations target.
    pub index_name: String,
    /// Optional basic-auth username.
    pub username: Option<String>,
    /// Optional basic-auth password.
    pub password: Option<String>,
    /// Upper bound for every request.
    pub timeout: Duration,
}

impl OpenSearchConfig {
    pub fn new(url: impl Into<String>, index_name: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            index_name: index_name.into(),
            username: None,
            password: None,
            timeout: Duration::from_secs(30),
        }
    }
}

/// OpenSearch provider implementation.
///
/// # Example
///
/// ```ignore
/// use terminology_indexer_repository::opensearch::{OpenSearchConfig, OpenSearchProvider};
///
/// let provider = OpenSearchProvider::new(OpenSearchConfig::new("http://localhost:9200", "terminology")).await?;
/// if !provider.index_exists().await? {
///     provider.create_index(&definition.settings).await?;
/// }
/// ```
pub struct OpenSearchProvider {
    client: OpenSearch,
    index_name: String,
}

impl OpenSearchProvider {
    /// Create a new OpenSearch provider for the configured URL and index.
    ///
    /// No request is made here; an unreachable server surfaces on first use.
    ///
    /// # Returns
    ///
    /// * `Ok(OpenSearchProvider)` - A new provider instance
    /// * `Err(SearchIndexError)` - If the URL is invalid or transport setup fails
    pub async fn new(config: OpenSearchConfig) -> Result<Self, SearchIndexError> {
        let parsed_url =
            Url::parse(&config.url).map_err(|e| SearchIndexError::validation(e.to_string()))?;

        let conn_pool = SingleNodeConnectionPool::new(parsed_url);
        let mut builder = TransportBuilder::new(conn_pool)
            .disable_proxy()
            .timeout(config.timeout);
        if let (Some(username), Some(password)) = (&config.username, &config.password) {
            builder = builder.auth(Credentials::Basic(username.clone(), password.clone()));
        }
        let transport = builder
            .build()
            .map_err(|e| SearchIndexError::connection(e.to_string()))?;

        info!(
            url = %config.url,
            index = %config.index_name,
            "Created OpenSearch provider"
        );

        Ok(Self {
            client: OpenSearch::new(transport),
            index_name: config.index_name,
        })
    }

    pub fn index_name(&self) -> &str {
        &self.index_name
    }

    /// Turn a response into `Ok(())` for 2xx, and for 404 when `allow_not_found`.
    async fn check(
        operation: &'static str,
        response: Response,
        allow_not_found: bool,
    ) -> Result<(), SearchIndexError> {
        let status = response.status_code();
        if status.is_success() || (allow_not_found && status.as_u16() == 404) {
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        error!(operation, status = %status, body = %body, "Search index request failed");
        Err(SearchIndexError::rejected(operation, status.as_u16(), body))
    }
}

#[async_trait]
impl SearchIndexProvider for OpenSearchProvider {
    async fn index_exists(&self) -> Result<bool, SearchIndexError> {
        let response = self
            .client
            .indices()
            .exists(IndicesExistsParts::Index(&[self.index_name.as_str()]))
            .send()
            .await
            .map_err(|e| SearchIndexError::connection(e.to_string()))?;

        let status = response.status_code().as_u16();
        debug!(index = %self.index_name, status, "Index existence probe");
        Ok(status != 404)
    }

    async fn create_index(&self, settings: &Value) -> Result<(), SearchIndexError> {
        let response = self
            .client
            .indices()
            .create(IndicesCreateParts::Index(&self.index_name))
            .body(settings.clone())
            .send()
            .await
            .map_err(|e| SearchIndexError::connection(e.to_string()))?;

        Self::check("create index", response, false).await?;
        info!(index = %self.index_name, "Index created");
        Ok(())
    }

    async fn create_mapping(&self, mapping: &Value) -> Result<(), SearchIndexError> {
        let response = self
            .client
            .indices()
            .put_mapping(IndicesPutMappingParts::Index(&[self.index_name.as_str()]))
            .body(mapping.clone())
            .send()
            .await
            .map_err(|e| SearchIndexError::connection(e.to_string()))?;

        Self::check("put mapping", response, false).await?;
        info!(index = %self.index_name, "Index mapping created");
        Ok(())
    }

    async fn upsert_document(&self, document: &IndexDocument) -> Result<(), SearchIndexError> {
        let doc_id = document.document_id();
        let body = serde_json::to_value(document)
            .map_err(|e| SearchIndexError::serialization(e.to_string()))?;

        let response = self
            .client
            .index(IndexParts::IndexId(&self.index_name, &doc_id))
            .body(body)
            .send()
            .await
            .map_err(|e| SearchIndexError::connection(e.to_string()))?;

        Self::check("upsert document", response, false).await?;
        debug!(doc_id = %doc_id, kind = document.kind(), "Document upserted");
        Ok(())
    }

    async fn delete_document(&self, id: &str) -> Result<(), SearchIndexError> {
        let response = self
            .client
            .delete(DeleteParts::IndexId(&self.index_name, id))
            .send()
            .await
            .map_err(|e| SearchIndexError::connection(e.to_string()))?;

        // 404 is acceptable - document may not exist
        Self::check("delete document", response, true).await?;
        debug!(doc_id = %id, "Document deleted");
        Ok(())
    }

    async fn delete_index(&self) -> Result<(), SearchIndexError> {
        let response = self
            .client
            .indices()
            .delete(IndicesDeleteParts::Index(&[self.index_name.as_str()]))
            .send()
            .await
            .map_err(|e| SearchIndexError::connection(e.to_string()))?;

        Self::check("delete index", response, true).await?;
        info!(index = %self.index_name, "Index deleted");
        Ok(())
    }
}
