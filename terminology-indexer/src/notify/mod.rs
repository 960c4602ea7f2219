//! HTTP surface: change notifications, manual reindex and health.

pub mod handlers;
pub mod state;

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::info;

use self::state::AppState;
use crate::sync::SyncEngine;
use crate::IndexingError;

/// Create the router with all routes and middleware.
pub fn create_app(engine: Arc<SyncEngine>) -> Router {
    let state = AppState { engine };

    Router::new()
        .route("/notify", post(handlers::notify))
        .route("/reindex", get(handlers::reindex))
        .route("/health", get(handlers::health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind `addr` and serve `app` until `shutdown` resolves.
pub async fn run_server<F>(app: Router, addr: SocketAddr, shutdown: F) -> Result<(), IndexingError>
where
    F: Future<Output = ()> + Send + 'static,
{
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| IndexingError::server(format!("Failed to bind {}: {}", addr, e)))?;
    serve(listener, app, shutdown).await
}

/// Serve `app` on an already bound listener until `shutdown` resolves.
pub async fn serve<F>(listener: TcpListener, app: Router, shutdown: F) -> Result<(), IndexingError>
where
    F: Future<Output = ()> + Send + 'static,
{
    let addr = listener
        .local_addr()
        .map_err(|e| IndexingError::server(e.to_string()))?;
    info!("Server listening on {}", addr);
    info!("- Notify endpoint: http://{}/notify", addr);
    info!("- Reindex endpoint: http://{}/reindex", addr);
    info!("- Health endpoint: http://{}/health", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| IndexingError::server(e.to_string()))
}
