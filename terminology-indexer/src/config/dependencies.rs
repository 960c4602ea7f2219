//! Dependency initialization and wiring for the terminology indexer.

use std::sync::Arc;

use source_client::{HttpSourceClient, SourceClientConfig, SourceSystem};
use terminology_indexer_repository::opensearch::OpenSearchConfig;
use terminology_indexer_repository::{IndexDefinition, OpenSearchProvider, SearchIndexProvider};
use tracing::info;

use super::Settings;
use crate::bootstrap::{BootstrapConfig, BootstrapSequencer};
use crate::sync::{EngineConfig, SyncEngine};
use crate::IndexingError;

/// Container for all initialized dependencies.
pub struct Dependencies {
    pub settings: Settings,
    pub engine: Arc<SyncEngine>,
    pub source: Arc<dyn SourceSystem>,
}

impl Dependencies {
    /// Build the clients and the engine from `settings`.
    ///
    /// No request is made here; unreachable endpoints surface during
    /// bootstrap, where they are retried.
    pub async fn new(settings: Settings) -> Result<Self, IndexingError> {
        info!(
            opensearch_url = %settings.opensearch_url,
            index_name = %settings.index_name,
            source_api_url = %settings.source_api_url,
            delete_index_on_restart = settings.delete_index_on_restart,
            refresh_neighbours = settings.refresh_neighbours,
            "Initializing dependencies"
        );

        let definition = IndexDefinition::load(
            settings.index_settings_path.as_deref(),
            settings.index_mapping_path.as_deref(),
        )
        .map_err(|e| IndexingError::config(format!("Failed to load index definition: {}", e)))?;

        let mut opensearch_config =
            OpenSearchConfig::new(&settings.opensearch_url, &settings.index_name);
        opensearch_config.username = settings.opensearch_username.clone();
        opensearch_config.password = settings.opensearch_password.clone();
        opensearch_config.timeout = settings.http_timeout;
        let index: Arc<dyn SearchIndexProvider> = Arc::new(
            OpenSearchProvider::new(opensearch_config)
                .await
                .map_err(|e| {
                    IndexingError::config(format!("Failed to create OpenSearch provider: {}", e))
                })?,
        );

        let source: Arc<dyn SourceSystem> = Arc::new(
            HttpSourceClient::new(SourceClientConfig {
                base_url: settings.source_api_url.clone(),
                username: settings.source_api_username.clone(),
                password: settings.source_api_password.clone(),
                timeout: settings.http_timeout,
            })
            .map_err(|e| IndexingError::config(format!("Failed to create source client: {}", e)))?,
        );

        let engine = Arc::new(SyncEngine::new(
            source.clone(),
            index,
            EngineConfig {
                definition,
                delete_on_restart: settings.delete_index_on_restart,
                refresh_neighbours: settings.refresh_neighbours,
            },
        ));

        Ok(Self {
            settings,
            engine,
            source,
        })
    }

    /// The bootstrap sequencer for these dependencies.
    pub fn bootstrap(&self) -> BootstrapSequencer {
        BootstrapSequencer::new(
            self.engine.clone(),
            self.source.clone(),
            BootstrapConfig {
                attempts: self.settings.bootstrap_attempts,
                retry_delay: self.settings.bootstrap_retry_delay,
                callback_url: self.settings.notify_callback_url.clone(),
            },
        )
    }
}
