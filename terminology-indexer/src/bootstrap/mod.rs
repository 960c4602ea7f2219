//! Startup and shutdown sequencing.
//!
//! On startup the index is prepared, filled when freshly created, and the
//! webhook is registered. Each step is retried with a fixed delay while the
//! failure is an unreachable endpoint; any other failure, or running out of
//! attempts, is returned to the caller and ends the process.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use source_client::SourceSystem;
use tokio_retry::{strategy::FixedInterval, RetryIf};
use tracing::{info, instrument, warn};

use crate::errors::SyncError;
use crate::sync::SyncEngine;

/// Configuration for the bootstrap sequence.
#[derive(Debug, Clone)]
pub struct BootstrapConfig {
    /// Attempts per step, including the first.
    pub attempts: usize,
    /// Delay between attempts.
    pub retry_delay: Duration,
    /// URL the source system should post notifications to.
    pub callback_url: String,
}

pub struct BootstrapSequencer {
    engine: Arc<SyncEngine>,
    source: Arc<dyn SourceSystem>,
    config: BootstrapConfig,
}

impl BootstrapSequencer {
    pub fn new(
        engine: Arc<SyncEngine>,
        source: Arc<dyn SourceSystem>,
        config: BootstrapConfig,
    ) -> Self {
        Self {
            engine,
            source,
            config,
        }
    }

    /// Bring the engine to `Ready` and register the webhook.
    ///
    /// Returns the hook id to deregister on shutdown, or `None` when the
    /// source system declined the registration.
    #[instrument(skip(self))]
    pub async fn run(&self) -> Result<Option<String>, SyncError> {
        let created = self
            .retry("prepare index", || self.engine.prepare_index())
            .await?;

        if created {
            let report = self
                .retry("bootstrap import", || self.engine.bootstrap_import())
                .await?;
            info!(
                vocabularies = report.vocabularies,
                concepts = report.concepts,
                skipped = report.skipped,
                "Bootstrap import complete"
            );
        }
        self.engine.mark_ready();

        let callback_url = self.config.callback_url.as_str();
        let hook_id = self
            .retry("register webhook", || async {
                self.source
                    .register_webhook(callback_url)
                    .await
                    .map_err(SyncError::from)
            })
            .await?;

        match &hook_id {
            Some(hook_id) => info!(hook_id = %hook_id, callback_url, "Webhook registered"),
            None => warn!(
                callback_url,
                "Webhook registration returned no hook id, relying on scheduled reindex"
            ),
        }
        Ok(hook_id)
    }

    /// Best-effort webhook deregistration. Failures are logged only.
    pub async fn shutdown(&self, hook_id: Option<&str>) {
        let Some(hook_id) = hook_id else {
            return;
        };

        match self.source.deregister_webhook(hook_id).await {
            Ok(true) => info!(hook_id, "Webhook deregistered"),
            Ok(false) => warn!(hook_id, "Source system declined webhook deregistration"),
            Err(e) => warn!(hook_id, error = %e, "Failed to deregister webhook"),
        }
    }

    async fn retry<T, F, Fut>(&self, step: &'static str, action: F) -> Result<T, SyncError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, SyncError>>,
    {
        let attempts = self.config.attempts.max(1);
        let strategy = FixedInterval::new(self.config.retry_delay).take(attempts - 1);
        let mut attempt = 0;

        RetryIf::spawn(strategy, action, |e: &SyncError| {
            attempt += 1;
            let retry = e.is_retryable() && attempt < attempts;
            if retry {
                warn!(
                    step,
                    attempt,
                    max_attempts = attempts,
                    retry_delay_secs = self.config.retry_delay.as_secs(),
                    error = %e,
                    "Endpoint unreachable, retrying"
                );
            }
            retry
        })
        .await
    }
}
