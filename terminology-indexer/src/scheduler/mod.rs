//! Scheduled reconciler: one full rebuild per day at a fixed UTC time.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, NaiveTime, TimeDelta, Utc};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::{error, info};

use crate::sync::SyncEngine;

/// First instant strictly after `now` whose UTC time of day is `at`.
pub fn next_run_after(now: DateTime<Utc>, at: NaiveTime) -> DateTime<Utc> {
    let today = now.date_naive().and_time(at).and_utc();
    if today > now {
        today
    } else {
        today + TimeDelta::days(1)
    }
}

/// Spawn the reconciler loop. It stops when `shutdown` fires.
pub fn spawn_reconciler(
    engine: Arc<SyncEngine>,
    at: NaiveTime,
    mut shutdown: broadcast::Receiver<()>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            let now = Utc::now();
            let next = next_run_after(now, at);
            let wait = (next - now).to_std().unwrap_or(Duration::ZERO);
            info!(next_run = %next, "Scheduled next full reindex");

            tokio::select! {
                _ = sleep(wait) => {
                    match engine.rebuild_all().await {
                        Ok(report) => info!(
                            vocabularies = report.vocabularies,
                            concepts = report.concepts,
                            skipped = report.skipped,
                            failed = report.failed,
                            "Scheduled reindex complete"
                        ),
                        Err(e) => error!(error = %e, "Scheduled reindex failed"),
                    }
                }
                _ = shutdown.recv() => {
                    info!("Reconciler stopping");
                    break;
                }
            }
        }
    })
}
