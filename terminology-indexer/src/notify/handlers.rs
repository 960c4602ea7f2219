//! HTTP request handlers.

use axum::{body::Bytes, extract::State, http::StatusCode, response::IntoResponse, Json};
use terminology_indexer_shared::NotificationPayload;
use tracing::{error, info, warn};

use crate::notify::state::AppState;
use crate::sync::ApplyOutcome;

/// Receive a change notification from the source system.
///
/// The body is a single change event, an array of them, or a batch
/// `{eventType, nodes}`. Every event of the delivery is applied before the
/// response is sent.
pub async fn notify(State(state): State<AppState>, body: Bytes) -> impl IntoResponse {
    let payload: NotificationPayload = match serde_json::from_slice(&body) {
        Ok(payload) => payload,
        Err(e) => {
            warn!(error = %e, body_len = body.len(), "Discarding malformed notification");
            return (StatusCode::BAD_REQUEST, "Malformed notification");
        }
    };

    if !state.engine.is_ready() {
        warn!(state = %state.engine.state(), "Notification received before the index is ready");
        return (StatusCode::SERVICE_UNAVAILABLE, "Index not ready");
    }

    let outcomes = state.engine.apply_changes(payload.into_events()).await;
    let failed = outcomes
        .iter()
        .filter(|outcome| matches!(outcome, ApplyOutcome::Failed { .. }))
        .count();
    info!(event_count = outcomes.len(), failed, "Notification applied");

    (StatusCode::OK, "OK")
}

/// Trigger a full rebuild in the background and answer immediately.
///
/// Refused with 503 while bootstrap is still running.
pub async fn reindex(State(state): State<AppState>) -> impl IntoResponse {
    if !state.engine.is_ready() {
        warn!(state = %state.engine.state(), "Reindex requested before the index is ready");
        return (StatusCode::SERVICE_UNAVAILABLE, "Index not ready");
    }

    let engine = state.engine.clone();
    tokio::spawn(async move {
        match engine.rebuild_all().await {
            Ok(report) => info!(
                vocabularies = report.vocabularies,
                concepts = report.concepts,
                skipped = report.skipped,
                failed = report.failed,
                "Manual reindex complete"
            ),
            Err(e) => error!(error = %e, "Manual reindex failed"),
        }
    });

    (StatusCode::OK, "OK")
}

/// Engine state and counters; 503 until the index is ready.
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let current = state.engine.state();
    let status = if state.engine.is_ready() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status,
        Json(serde_json::json!({
            "state": current,
            "stats": state.engine.stats(),
        })),
    )
}
