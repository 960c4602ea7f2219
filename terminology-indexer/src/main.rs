//! Terminology Indexer Main Entry Point
//!
//! Builds the search index from the source system, keeps it current from
//! webhook notifications and reconciles it with a nightly full rebuild.

use dotenv::dotenv;
use std::env;
use terminology_indexer::{notify, scheduler, Dependencies, IndexingError, Settings};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize tracing/logging.
fn init_tracing() -> Result<(), IndexingError> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(
            "terminology_indexer=info,terminology_indexer_repository=info,\
             source_client=info,tower_http=info",
        )
    });

    let json = env::var("LOG_FORMAT")
        .map(|format| format.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_target(true)
                    .with_thread_ids(true),
            )
            .try_init()
            .map_err(|e| IndexingError::config(format!("Failed to initialize tracing: {}", e)))?;
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_target(true).pretty())
            .try_init()
            .map_err(|e| IndexingError::config(format!("Failed to initialize tracing: {}", e)))?;
    }

    info!(
        service_name = "terminology-indexer",
        service_version = env!("CARGO_PKG_VERSION"),
        json,
        "Tracing initialized"
    );
    Ok(())
}

/// Resolve on Ctrl-C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
    info!("Received shutdown signal");
}

fn server_exited(
    result: Result<Result<(), IndexingError>, tokio::task::JoinError>,
) -> IndexingError {
    match result {
        Ok(Ok(())) => IndexingError::server("Server stopped unexpectedly"),
        Ok(Err(e)) => e,
        Err(e) => IndexingError::server(format!("Server task failed: {}", e)),
    }
}

#[tokio::main]
async fn main() -> Result<(), IndexingError> {
    // Load environment variables from .env file
    dotenv().ok();

    init_tracing()?;

    info!("Starting terminology indexer");

    let settings = Settings::from_env()?;
    let deps = match Dependencies::new(settings).await {
        Ok(deps) => {
            info!("Dependencies initialized successfully");
            deps
        }
        Err(e) => {
            error!(error = %e, "Failed to initialize dependencies");
            return Err(e);
        }
    };

    let (shutdown_tx, _) = broadcast::channel::<()>(1);

    // Serve while bootstrapping; notifications are refused until ready
    let app = notify::create_app(deps.engine.clone());
    let mut server_shutdown = shutdown_tx.subscribe();
    let mut server: JoinHandle<Result<(), IndexingError>> = tokio::spawn(notify::run_server(
        app,
        deps.settings.server_addr,
        async move {
            let _ = server_shutdown.recv().await;
        },
    ));

    let sequencer = deps.bootstrap();
    let hook_id = tokio::select! {
        result = sequencer.run() => match result {
            Ok(hook_id) => hook_id,
            Err(e) => {
                error!(error = %e, "Bootstrap failed");
                let _ = shutdown_tx.send(());
                let _ = server.await;
                return Err(e.into());
            }
        },
        result = &mut server => {
            let e = server_exited(result);
            error!(error = %e, "Server stopped during bootstrap");
            return Err(e);
        }
        _ = shutdown_signal() => {
            let _ = shutdown_tx.send(());
            let _ = server.await;
            return Ok(());
        }
    };

    info!(state = %deps.engine.state(), "Terminology indexer ready");

    let reconciler = scheduler::spawn_reconciler(
        deps.engine.clone(),
        deps.settings.reindex_at,
        shutdown_tx.subscribe(),
    );

    let outcome = tokio::select! {
        _ = shutdown_signal() => Ok(()),
        result = &mut server => Err(server_exited(result)),
    };

    let _ = shutdown_tx.send(());
    sequencer.shutdown(hook_id.as_deref()).await;
    let _ = reconciler.await;
    if outcome.is_ok() {
        let _ = server.await;
    }

    let stats = deps.engine.stats();
    match &outcome {
        Ok(()) => info!(
            notifications_applied = stats.notifications_applied,
            documents_upserted = stats.documents_upserted,
            documents_deleted = stats.documents_deleted,
            stale_neighbours = stats.stale_neighbours,
            rebuilds_completed = stats.rebuilds_completed,
            "Terminology indexer shutdown complete"
        ),
        Err(e) => error!(error = %e, "Terminology indexer failed"),
    }
    outcome
}
