//! Fixtures shared by the integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use source_client::MockSourceSystem;
use terminology_indexer::{EngineConfig, SyncEngine};
use terminology_indexer_repository::InMemorySearchIndex;
use terminology_indexer_shared::{ConceptDocument, IndexDocument, NodeTypeId, SourceNode};
use uuid::Uuid;

pub fn vocabulary(graph: Uuid, label: &str) -> SourceNode {
    SourceNode::new(Uuid::new_v4(), NodeTypeId::TerminologicalVocabulary, Some(graph))
        .with_property("prefLabel", "fi", label)
}

pub fn concept(graph: Uuid, label: &str) -> SourceNode {
    SourceNode::new(Uuid::new_v4(), NodeTypeId::Concept, Some(graph))
        .with_property("prefLabel", "fi", label)
}

/// A concept with neither a label nor label terms.
pub fn unlabelled_concept(graph: Uuid) -> SourceNode {
    SourceNode::new(Uuid::new_v4(), NodeTypeId::Concept, Some(graph))
        .with_property("status", "", "DRAFT")
}

pub fn term(graph: Uuid, lang: &str, label: &str) -> SourceNode {
    SourceNode::new(Uuid::new_v4(), NodeTypeId::Term, Some(graph))
        .with_property("prefLabel", lang, label)
}

pub fn engine_with(
    source: &Arc<MockSourceSystem>,
    index: &Arc<InMemorySearchIndex>,
    config: EngineConfig,
) -> Arc<SyncEngine> {
    Arc::new(SyncEngine::new(source.clone(), index.clone(), config))
}

pub fn engine(source: &Arc<MockSourceSystem>, index: &Arc<InMemorySearchIndex>) -> Arc<SyncEngine> {
    engine_with(source, index, EngineConfig::default())
}

/// An engine already past bootstrap, for tests of the live index.
pub fn ready_engine(
    source: &Arc<MockSourceSystem>,
    index: &Arc<InMemorySearchIndex>,
) -> Arc<SyncEngine> {
    let engine = engine(source, index);
    engine.mark_ready();
    engine
}

/// The concept document stored under `id`, panicking when absent.
pub fn concept_doc(index: &InMemorySearchIndex, id: Uuid) -> ConceptDocument {
    match index.document(&id.to_string()) {
        Some(IndexDocument::Concept(doc)) => doc,
        other => panic!("expected concept document for {id}, got {other:?}"),
    }
}
