//! The synchronization engine.
//!
//! Owns the full-rebuild and incremental-update algorithms. Every operation
//! that writes to the index runs under one ordering lock, so a notification
//! delivery never interleaves with a rebuild or with another delivery.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use serde::Serialize;
use source_client::SourceSystem;
use terminology_indexer_repository::{IndexDefinition, SearchIndexProvider};
use terminology_indexer_shared::transform::{ALT_LABEL_XL, BROADER, PREF_LABEL_XL};
use terminology_indexer_shared::{
    transform, ChangeEvent, ChangeEventType, IndexDocument, NodeTypeId, SourceNode,
    TransformContext,
};
use tokio::sync::{watch, Mutex};
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use super::state::{SyncState, SyncStats, SyncStatsSnapshot};
use crate::errors::SyncError;

/// Configuration for the engine.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Settings and mapping used when the index is created.
    pub definition: IndexDefinition,
    /// Delete the index before bootstrapping.
    pub delete_on_restart: bool,
    /// Re-index documents that embed a changed node on incremental updates.
    pub refresh_neighbours: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            definition: IndexDefinition::default(),
            delete_on_restart: false,
            refresh_neighbours: false,
        }
    }
}

/// How a full import treats a failed document write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportMode {
    /// Building a fresh index: any failed write aborts the import.
    Bootstrap,
    /// Reconciling a live index: failed writes are logged and skipped.
    Tolerant,
}

/// Outcome of a full import.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RebuildReport {
    pub vocabularies: usize,
    pub concepts: usize,
    /// Nodes the transformer rejected.
    pub skipped: usize,
    /// Documents the index rejected.
    pub failed: usize,
}

impl RebuildReport {
    /// Documents written.
    pub fn indexed(&self) -> usize {
        self.vocabularies + self.concepts
    }
}

/// Result of applying one change event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// Documents written, including refreshed neighbours.
    Indexed { documents: usize },
    Deleted { document_id: String },
    /// Nothing to do, or the node could not be transformed.
    Skipped { reason: String },
    /// The source system or the index failed; the change was abandoned.
    Failed { reason: String },
}

fn skipped(reason: impl Into<String>) -> ApplyOutcome {
    ApplyOutcome::Skipped {
        reason: reason.into(),
    }
}

/// Bootstrap steps started but not yet completed.
#[derive(Debug, Default)]
struct PendingBootstrap {
    create: bool,
    mapping: bool,
    import: bool,
}

impl PendingBootstrap {
    fn is_idle(&self) -> bool {
        !self.create && !self.mapping && !self.import
    }
}

/// Keeps the search index consistent with the source system.
pub struct SyncEngine {
    source: Arc<dyn SourceSystem>,
    index: Arc<dyn SearchIndexProvider>,
    config: EngineConfig,
    state: watch::Sender<SyncState>,
    /// The ordering lock. Also guards bootstrap progress.
    ordering: Mutex<PendingBootstrap>,
    stats: SyncStats,
}

impl SyncEngine {
    pub fn new(
        source: Arc<dyn SourceSystem>,
        index: Arc<dyn SearchIndexProvider>,
        config: EngineConfig,
    ) -> Self {
        Self {
            source,
            index,
            config,
            state: watch::Sender::new(SyncState::Uninitialized),
            ordering: Mutex::new(PendingBootstrap::default()),
            stats: SyncStats::default(),
        }
    }

    pub fn state(&self) -> SyncState {
        *self.state.borrow()
    }

    pub fn is_ready(&self) -> bool {
        self.state() == SyncState::Ready
    }

    /// Receive every state transition.
    pub fn subscribe_state(&self) -> watch::Receiver<SyncState> {
        self.state.subscribe()
    }

    pub fn stats(&self) -> SyncStatsSnapshot {
        self.stats.snapshot()
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Move the state forward; earlier states are never re-entered.
    fn advance(&self, next: SyncState) {
        let changed = self.state.send_if_modified(|current| {
            if next > *current {
                *current = next;
                true
            } else {
                false
            }
        });
        if changed {
            info!(state = %next, "Engine state changed");
        }
    }

    pub fn mark_ready(&self) {
        self.advance(SyncState::Ready);
    }

    /// Bring the index up: prepare it, import everything if it was just
    /// created, then mark the engine ready.
    ///
    /// An index that already exists is left as it is.
    #[instrument(skip(self))]
    pub async fn init_index(&self) -> Result<RebuildReport, SyncError> {
        let mut report = RebuildReport::default();
        if self.prepare_index().await? {
            report = self.bootstrap_import().await?;
        }
        self.mark_ready();
        Ok(report)
    }

    /// Wipe (when configured), create and map the index.
    ///
    /// Returns whether a bootstrap import is pending. Safe to call again after
    /// a failure: steps that already succeeded are not repeated.
    #[instrument(skip(self))]
    pub async fn prepare_index(&self) -> Result<bool, SyncError> {
        let mut pending = self.ordering.lock().await;
        self.advance(SyncState::Initializing);

        if pending.is_idle() {
            if self.config.delete_on_restart {
                info!("Deleting index on restart");
                self.index.delete_index().await?;
            }

            if self.index.index_exists().await? {
                info!("Index already exists, skipping bootstrap import");
                return Ok(false);
            }

            *pending = PendingBootstrap {
                create: true,
                mapping: true,
                import: true,
            };
        } else if pending.create && self.index.index_exists().await? {
            // the earlier create went through but its answer was lost
            info!("Index created by an earlier attempt");
            pending.create = false;
        }

        if pending.create {
            self.index
                .create_index(&self.config.definition.settings)
                .await?;
            pending.create = false;
        }

        if pending.mapping {
            self.index
                .create_mapping(&self.config.definition.mapping)
                .await?;
            pending.mapping = false;
        }

        Ok(pending.import)
    }

    /// Fill a freshly created index. Any failed write is an error.
    #[instrument(skip(self))]
    pub async fn bootstrap_import(&self) -> Result<RebuildReport, SyncError> {
        let mut pending = self.ordering.lock().await;
        if !pending.import {
            return Ok(RebuildReport::default());
        }

        let report = self.import(ImportMode::Bootstrap).await?;
        pending.import = false;
        Ok(report)
    }

    /// Re-import every node into the existing index, tolerating failed writes.
    ///
    /// Returns [`SyncError::NotReady`] until bootstrap has created and mapped
    /// the index.
    #[instrument(skip(self))]
    pub async fn rebuild_all(&self) -> Result<RebuildReport, SyncError> {
        let _guard = self.ordering.lock().await;
        let state = self.state();
        if state < SyncState::Ready {
            warn!(state = %state, "Refusing full rebuild before the index is ready");
            return Err(SyncError::NotReady { state });
        }
        let report = self.import(ImportMode::Tolerant).await?;
        SyncStats::add(&self.stats.rebuilds_completed, 1);
        Ok(report)
    }

    /// Fetch all nodes, transform every vocabulary and concept, upsert the
    /// results. Caller holds the ordering lock.
    async fn import(&self, mode: ImportMode) -> Result<RebuildReport, SyncError> {
        let nodes = self.source.fetch_all_nodes().await?;
        let context = TransformContext::new(&nodes);

        let mut candidates: Vec<&SourceNode> = nodes
            .values()
            .filter(|node| is_indexed_type(node.type_id()))
            .collect();
        candidates.sort_by_key(|node| (!node.type_id().is_vocabulary(), node.id));

        info!(
            mode = ?mode,
            node_count = nodes.len(),
            candidate_count = candidates.len(),
            vocabulary_count = context.vocabulary_count(),
            "Starting full import"
        );

        let mut report = RebuildReport::default();
        for node in candidates {
            let document = match transform(node, &context) {
                Ok(document) => document,
                Err(e) => {
                    warn!(node_id = %node.id, reason = %e, "Skipping node");
                    report.skipped += 1;
                    continue;
                }
            };

            match self.index.upsert_document(&document).await {
                Ok(()) => match document {
                    IndexDocument::Vocabulary(_) => report.vocabularies += 1,
                    IndexDocument::Concept(_) => report.concepts += 1,
                },
                Err(e) if mode == ImportMode::Bootstrap => {
                    error!(
                        doc_id = %document.document_id(),
                        error = %e,
                        "Failed to index document during bootstrap"
                    );
                    self.record(&report);
                    return Err(SyncError::BootstrapWrite {
                        document_id: document.document_id(),
                        source: e,
                    });
                }
                Err(e) => {
                    error!(
                        doc_id = %document.document_id(),
                        error = %e,
                        "Failed to index document, continuing"
                    );
                    report.failed += 1;
                }
            }
        }

        self.record(&report);
        info!(
            vocabularies = report.vocabularies,
            concepts = report.concepts,
            skipped = report.skipped,
            failed = report.failed,
            "Full import complete"
        );
        Ok(report)
    }

    fn record(&self, report: &RebuildReport) {
        SyncStats::add(&self.stats.documents_upserted, report.indexed());
        SyncStats::add(&self.stats.documents_skipped, report.skipped);
        SyncStats::add(&self.stats.upsert_failures, report.failed);
    }

    /// Apply every event of one delivery under a single hold of the ordering
    /// lock, in order.
    #[instrument(skip(self, events), fields(event_count = events.len()))]
    pub async fn apply_changes(&self, events: Vec<ChangeEvent>) -> Vec<ApplyOutcome> {
        let _guard = self.ordering.lock().await;

        let mut outcomes = Vec::with_capacity(events.len());
        for event in &events {
            outcomes.push(self.apply_locked(event).await);
        }
        outcomes
    }

    /// Apply a single change event.
    #[instrument(skip(self, event), fields(node_id = ?event.node_id()))]
    pub async fn apply_change(&self, event: &ChangeEvent) -> ApplyOutcome {
        let _guard = self.ordering.lock().await;
        self.apply_locked(event).await
    }

    async fn apply_locked(&self, event: &ChangeEvent) -> ApplyOutcome {
        SyncStats::add(&self.stats.notifications_applied, 1);

        let outcome = match event.event_type {
            ChangeEventType::NodeSaved => self.apply_saved(event).await,
            ChangeEventType::NodeDeleted => self.apply_deleted(event).await,
        };

        if let ApplyOutcome::Skipped { reason } = &outcome {
            SyncStats::add(&self.stats.documents_skipped, 1);
            debug!(node_id = ?event.node_id(), reason = %reason, "Change skipped");
        }
        outcome
    }

    async fn apply_deleted(&self, event: &ChangeEvent) -> ApplyOutcome {
        let Some(id) = event.node_id() else {
            warn!("Delete notification without node id");
            return skipped("missing node id");
        };

        // Vocabulary documents are keyed by graph id
        let document_id = match event.type_id() {
            Some(type_id) if type_id.is_vocabulary() => event.graph_id().unwrap_or(id),
            Some(NodeTypeId::Concept) | None => id,
            Some(other) => return skipped(format!("{} nodes have no index document", other)),
        }
        .to_string();

        match self.index.delete_document(&document_id).await {
            Ok(()) => {
                SyncStats::add(&self.stats.documents_deleted, 1);
                info!(doc_id = %document_id, "Document deleted");
                ApplyOutcome::Deleted { document_id }
            }
            Err(e) => {
                error!(doc_id = %document_id, error = %e, "Failed to delete document");
                ApplyOutcome::Failed {
                    reason: e.to_string(),
                }
            }
        }
    }

    async fn apply_saved(&self, event: &ChangeEvent) -> ApplyOutcome {
        let Some(id) = event.node_id() else {
            warn!("Save notification without node id");
            return skipped("missing node id");
        };
        let Some(graph_id) = event.graph_id() else {
            warn!(node_id = %id, "Save notification without graph id");
            return skipped("missing graph id");
        };
        if let Some(type_id) = event.type_id() {
            if !self.touches_index(type_id) {
                return skipped(format!("{} changes do not touch the index", type_id));
            }
        }

        let node = match self.source.fetch_node(graph_id, id).await {
            Ok(Some(node)) => node,
            Ok(None) => {
                warn!(node_id = %id, graph_id = %graph_id, "Saved node not found in source system");
                return skipped("node not found in source system");
            }
            Err(e) => {
                warn!(node_id = %id, error = %e, "Failed to fetch saved node");
                return ApplyOutcome::Failed {
                    reason: e.to_string(),
                };
            }
        };
        if !self.touches_index(node.type_id()) {
            return skipped(format!("{} changes do not touch the index", node.type_id()));
        }

        let related = match self.source.fetch_nodes_in_vocabulary(graph_id).await {
            Ok(nodes) => nodes,
            Err(e) => {
                warn!(
                    graph_id = %graph_id,
                    error = %e,
                    "Failed to fetch vocabulary context, transforming without it"
                );
                Vec::new()
            }
        };
        let mut nodes: HashMap<Uuid, SourceNode> =
            related.into_iter().map(|n| (n.id, n)).collect();
        nodes.insert(node.id, node.clone());
        let context = TransformContext::new(&nodes);

        let mut written = 0;
        if is_indexed_type(node.type_id()) {
            let document = match transform(&node, &context) {
                Ok(document) => document,
                Err(e) => {
                    warn!(node_id = %id, reason = %e, "Skipping saved node");
                    return skipped(e.to_string());
                }
            };
            if let Err(e) = self.upsert(&document).await {
                return ApplyOutcome::Failed {
                    reason: e.to_string(),
                };
            }
            written += 1;
        }

        let neighbours = neighbours_of(&node, &nodes);
        if self.config.refresh_neighbours {
            for neighbour in neighbours.iter().filter_map(|nid| nodes.get(nid)) {
                match transform(neighbour, &context) {
                    Ok(document) => {
                        if self.upsert(&document).await.is_ok() {
                            written += 1;
                        }
                    }
                    Err(e) => {
                        debug!(node_id = %neighbour.id, reason = %e, "Neighbour not indexable")
                    }
                }
            }
        } else if !neighbours.is_empty() {
            SyncStats::add(&self.stats.stale_neighbours, neighbours.len());
            info!(
                node_id = %id,
                stale_count = neighbours.len(),
                "Documents embedding this node left stale until the next full rebuild"
            );
        }

        ApplyOutcome::Indexed { documents: written }
    }

    async fn upsert(&self, document: &IndexDocument) -> Result<(), SyncError> {
        match self.index.upsert_document(document).await {
            Ok(()) => {
                SyncStats::add(&self.stats.documents_upserted, 1);
                info!(doc_id = %document.document_id(), kind = document.kind(), "Document indexed");
                Ok(())
            }
            Err(e) => {
                SyncStats::add(&self.stats.upsert_failures, 1);
                error!(doc_id = %document.document_id(), error = %e, "Failed to index document");
                Err(e.into())
            }
        }
    }

    /// Concept and vocabulary changes always touch the index; term changes
    /// only when neighbours are refreshed.
    fn touches_index(&self, type_id: &NodeTypeId) -> bool {
        is_indexed_type(type_id)
            || (*type_id == NodeTypeId::Term && self.config.refresh_neighbours)
    }
}

fn is_indexed_type(type_id: &NodeTypeId) -> bool {
    *type_id == NodeTypeId::Concept || type_id.is_vocabulary()
}

/// Concepts whose documents embed data of `node`:
/// broader concepts list it as narrower, every concept of a vocabulary embeds
/// the vocabulary summary, concepts take labels from their terms.
fn neighbours_of(node: &SourceNode, nodes: &HashMap<Uuid, SourceNode>) -> BTreeSet<Uuid> {
    let is_concept = |id: &Uuid| {
        nodes
            .get(id)
            .is_some_and(|n| *n.type_id() == NodeTypeId::Concept)
    };

    match node.type_id() {
        NodeTypeId::Concept => node
            .reference_ids(BROADER)
            .filter(|id| *id != node.id && is_concept(id))
            .collect(),
        t if t.is_vocabulary() => nodes
            .values()
            .filter(|n| *n.type_id() == NodeTypeId::Concept)
            .map(|n| n.id)
            .collect(),
        NodeTypeId::Term => nodes
            .values()
            .filter(|n| *n.type_id() == NodeTypeId::Concept)
            .filter(|n| {
                n.reference_ids(PREF_LABEL_XL)
                    .chain(n.reference_ids(ALT_LABEL_XL))
                    .any(|term| term == node.id)
            })
            .map(|n| n.id)
            .collect(),
        _ => BTreeSet::new(),
    }
}
