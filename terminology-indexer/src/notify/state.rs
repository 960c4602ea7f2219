//! Shared state of the HTTP handlers.

use std::sync::Arc;

use crate::sync::SyncEngine;

#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<SyncEngine>,
}
