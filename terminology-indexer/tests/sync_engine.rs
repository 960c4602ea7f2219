//! Integration tests for the sync engine.
//!
//! These tests use the real SyncEngine with the in-memory source system and
//! search index.

mod common;

use std::sync::Arc;

use common::{
    concept, concept_doc, engine, engine_with, ready_engine, term, unlabelled_concept, vocabulary,
};
use source_client::MockSourceSystem;
use terminology_indexer::{ApplyOutcome, EngineConfig, SyncError, SyncState};
use terminology_indexer_repository::{InMemorySearchIndex, IndexOperation};
use terminology_indexer_shared::{
    ChangeEvent, ChangeEventType, ChangedNode, IndexDocument, NodeTypeId, SourceNode,
};
use uuid::Uuid;

#[tokio::test]
async fn test_bootstrap_indexes_valid_concepts_and_skips_invalid() {
    let graph = Uuid::new_v4();
    let valid = vec![
        concept(graph, "Ensimmäinen"),
        concept(graph, "Toinen"),
        concept(graph, "Kolmas"),
    ];
    let invalid = unlabelled_concept(graph);

    let source = Arc::new(MockSourceSystem::with_nodes(
        valid.iter().cloned().chain([invalid.clone()]),
    ));
    let index = Arc::new(InMemorySearchIndex::new());
    let engine = engine_with(
        &source,
        &index,
        EngineConfig {
            delete_on_restart: true,
            ..EngineConfig::default()
        },
    );
    assert_eq!(engine.state(), SyncState::Uninitialized);

    let report = engine.init_index().await.unwrap();

    assert_eq!(report.concepts, 3);
    assert_eq!(report.skipped, 1);
    assert_eq!(report.failed, 0);
    assert_eq!(engine.state(), SyncState::Ready);

    let operations = index.operations();
    assert_eq!(
        &operations[..4],
        &[
            IndexOperation::DeleteIndex,
            IndexOperation::Exists,
            IndexOperation::CreateIndex,
            IndexOperation::CreateMapping,
        ]
    );
    let upserts: Vec<_> = operations[4..]
        .iter()
        .filter(|op| matches!(op, IndexOperation::Upsert(_)))
        .collect();
    assert_eq!(upserts.len(), 3);
    assert_eq!(index.document_count(), 3);
    assert!(index.document(&invalid.id.to_string()).is_none());
    for node in &valid {
        let doc = concept_doc(&index, node.id);
        assert_eq!(doc.label["fi"], vec![node.first_value("prefLabel").unwrap().to_string()]);
    }
    assert!(index.mapping().is_some());
}

#[tokio::test]
async fn test_init_index_is_noop_when_index_exists() {
    let graph = Uuid::new_v4();
    let source = Arc::new(MockSourceSystem::with_nodes([concept(graph, "Esimerkki")]));
    let index = Arc::new(InMemorySearchIndex::existing());
    let engine = engine(&source, &index);

    let report = engine.init_index().await.unwrap();

    assert_eq!(report.indexed(), 0);
    assert_eq!(index.operations(), vec![IndexOperation::Exists]);
    assert_eq!(engine.state(), SyncState::Ready);
}

#[tokio::test]
async fn test_bootstrap_write_failure_is_fatal() {
    let graph = Uuid::new_v4();
    let first = concept(graph, "Ensimmäinen");
    let rejected = concept(graph, "Hylätty");
    let source = Arc::new(MockSourceSystem::with_nodes([first, rejected.clone()]));
    let index = Arc::new(InMemorySearchIndex::new());
    index.reject_document(rejected.id.to_string());
    let engine = engine(&source, &index);

    let result = engine.init_index().await;

    match result {
        Err(SyncError::BootstrapWrite { document_id, .. }) => {
            assert_eq!(document_id, rejected.id.to_string())
        }
        other => panic!("expected bootstrap write failure, got {other:?}"),
    }
    assert_ne!(engine.state(), SyncState::Ready);
}

#[tokio::test]
async fn test_rebuild_before_bootstrap_leaves_index_untouched() {
    let graph = Uuid::new_v4();
    let source = Arc::new(MockSourceSystem::with_nodes([concept(graph, "Esimerkki")]));
    let index = Arc::new(InMemorySearchIndex::new());
    let engine = engine(&source, &index);

    let early = engine.rebuild_all().await;

    assert!(matches!(
        early,
        Err(SyncError::NotReady {
            state: SyncState::Uninitialized
        })
    ));
    assert!(index.operations().is_empty());

    let report = engine.init_index().await.unwrap();

    assert_eq!(report.concepts, 1);
    assert!(index.mapping().is_some());
    assert_eq!(
        &index.operations()[..3],
        &[
            IndexOperation::Exists,
            IndexOperation::CreateIndex,
            IndexOperation::CreateMapping
        ]
    );
    assert_eq!(engine.stats().rebuilds_completed, 0);
}

#[tokio::test]
async fn test_rebuild_tolerates_write_failures() {
    let graph = Uuid::new_v4();
    let kept = concept(graph, "Säilyy");
    let rejected = concept(graph, "Hylätty");
    let source = Arc::new(MockSourceSystem::with_nodes([kept.clone(), rejected.clone()]));
    let index = Arc::new(InMemorySearchIndex::existing());
    index.reject_document(rejected.id.to_string());
    let engine = ready_engine(&source, &index);

    let report = engine.rebuild_all().await.unwrap();

    assert_eq!(report.concepts, 1);
    assert_eq!(report.failed, 1);
    assert!(index.document(&kept.id.to_string()).is_some());
    assert!(!index.operations().contains(&IndexOperation::DeleteIndex));
    assert_eq!(engine.stats().upsert_failures, 1);
    assert_eq!(engine.stats().rebuilds_completed, 1);
}

#[tokio::test]
async fn test_rebuild_is_idempotent() {
    let graph = Uuid::new_v4();
    let label_term = term(graph, "en", "Example");
    let parent = concept(graph, "Yläkäsite");
    let child = concept(graph, "Alakäsite")
        .with_reference("broader", parent.id)
        .with_reference("prefLabelXl", label_term.id);
    let parent = parent.with_referrer("broader", child.id);
    let source = Arc::new(MockSourceSystem::with_nodes([
        vocabulary(graph, "Sanasto"),
        label_term,
        parent,
        child,
    ]));
    let index = Arc::new(InMemorySearchIndex::existing());
    let engine = ready_engine(&source, &index);

    let first_report = engine.rebuild_all().await.unwrap();
    let first = index.documents();
    let second_report = engine.rebuild_all().await.unwrap();

    assert_eq!(first_report, second_report);
    assert_eq!(first_report.vocabularies, 1);
    assert_eq!(first_report.concepts, 2);
    assert_eq!(first, index.documents());
}

#[tokio::test]
async fn test_narrower_and_vocabulary_are_resolved_on_rebuild() {
    let graph = Uuid::new_v4();
    let vocab = vocabulary(graph, "Sanasto");
    let parent_id = Uuid::new_v4();
    let d = concept(graph, "D").with_reference("broader", parent_id);
    let e = concept(graph, "E").with_reference("broader", parent_id);
    let mut parent = SourceNode::new(parent_id, NodeTypeId::Concept, Some(graph))
        .with_property("prefLabel", "fi", "C");
    let (first, second) = if d.id < e.id { (&d, &e) } else { (&e, &d) };
    parent = parent
        .with_referrer("broader", first.id)
        .with_referrer("broader", second.id);

    let source = Arc::new(MockSourceSystem::with_nodes([vocab, parent, d.clone(), e.clone()]));
    let index = Arc::new(InMemorySearchIndex::existing());
    ready_engine(&source, &index).rebuild_all().await.unwrap();

    let doc = concept_doc(&index, parent_id);
    assert_eq!(doc.narrower, vec![first.id, second.id]);
    assert!(doc.has_narrower);
    assert_eq!(
        doc.vocabulary.map(|v| v.id),
        Some(graph),
        "concept embeds its vocabulary summary"
    );
    assert!(matches!(
        index.document(&graph.to_string()),
        Some(IndexDocument::Vocabulary(_))
    ));
}

#[tokio::test]
async fn test_saved_concept_is_indexed_with_vocabulary_context() {
    let graph = Uuid::new_v4();
    let label_term = term(graph, "en", "Example");
    let node = SourceNode::new(Uuid::new_v4(), NodeTypeId::Concept, Some(graph))
        .with_reference("prefLabelXl", label_term.id);
    let source = Arc::new(MockSourceSystem::with_nodes([
        vocabulary(graph, "Sanasto"),
        label_term,
        node.clone(),
    ]));
    let index = Arc::new(InMemorySearchIndex::existing());
    let engine = engine(&source, &index);

    let outcome = engine
        .apply_change(&ChangeEvent::saved(node.id, NodeTypeId::Concept, graph))
        .await;

    assert_eq!(outcome, ApplyOutcome::Indexed { documents: 1 });
    let doc = concept_doc(&index, node.id);
    assert_eq!(doc.label["en"], vec!["Example".to_string()]);
    assert_eq!(doc.vocabulary.map(|v| v.id), Some(graph));
}

#[tokio::test]
async fn test_saved_concept_without_label_is_skipped() {
    let graph = Uuid::new_v4();
    let node = unlabelled_concept(graph);
    let source = Arc::new(MockSourceSystem::with_nodes([node.clone()]));
    let index = Arc::new(InMemorySearchIndex::existing());
    let engine = engine(&source, &index);

    let outcome = engine
        .apply_change(&ChangeEvent::saved(node.id, NodeTypeId::Concept, graph))
        .await;

    assert!(matches!(outcome, ApplyOutcome::Skipped { .. }));
    assert_eq!(index.document_count(), 0);
    assert_eq!(engine.stats().documents_skipped, 1);
}

#[tokio::test]
async fn test_saved_node_missing_from_source_is_skipped() {
    let source = Arc::new(MockSourceSystem::new());
    let index = Arc::new(InMemorySearchIndex::existing());
    let engine = engine(&source, &index);

    let outcome = engine
        .apply_change(&ChangeEvent::saved(
            Uuid::new_v4(),
            NodeTypeId::Concept,
            Uuid::new_v4(),
        ))
        .await;

    assert!(matches!(outcome, ApplyOutcome::Skipped { .. }));
}

#[tokio::test]
async fn test_unreachable_source_fails_incremental_update() {
    let graph = Uuid::new_v4();
    let node = concept(graph, "Esimerkki");
    let source = Arc::new(MockSourceSystem::with_nodes([node.clone()]));
    let index = Arc::new(InMemorySearchIndex::existing());
    let engine = engine(&source, &index);
    source.fail_next_calls(1);

    let outcome = engine
        .apply_change(&ChangeEvent::saved(node.id, NodeTypeId::Concept, graph))
        .await;

    assert!(matches!(outcome, ApplyOutcome::Failed { .. }));
    assert_eq!(index.document_count(), 0);
}

#[tokio::test]
async fn test_delete_is_idempotent() {
    let graph = Uuid::new_v4();
    let node = concept(graph, "Poistettava");
    let source = Arc::new(MockSourceSystem::with_nodes([node.clone()]));
    let index = Arc::new(InMemorySearchIndex::existing());
    let engine = ready_engine(&source, &index);
    engine.rebuild_all().await.unwrap();
    assert!(index.document(&node.id.to_string()).is_some());

    let never_indexed = Uuid::new_v4();
    for id in [node.id, node.id, never_indexed] {
        let outcome = engine.apply_change(&ChangeEvent::deleted(id)).await;
        assert_eq!(
            outcome,
            ApplyOutcome::Deleted {
                document_id: id.to_string()
            }
        );
        assert!(index.document(&id.to_string()).is_none());
    }
}

#[tokio::test]
async fn test_event_without_id_is_skipped() {
    let source = Arc::new(MockSourceSystem::new());
    let index = Arc::new(InMemorySearchIndex::existing());
    let engine = engine(&source, &index);

    let outcomes = engine
        .apply_changes(vec![
            ChangeEvent {
                event_type: ChangeEventType::NodeDeleted,
                node: ChangedNode::default(),
            },
            ChangeEvent {
                event_type: ChangeEventType::NodeSaved,
                node: ChangedNode::default(),
            },
        ])
        .await;

    assert!(outcomes
        .iter()
        .all(|o| matches!(o, ApplyOutcome::Skipped { .. })));
    assert!(!index
        .operations()
        .iter()
        .any(|op| matches!(op, IndexOperation::Delete(_) | IndexOperation::Upsert(_))));
}

#[tokio::test]
async fn test_vocabulary_delete_uses_graph_id() {
    let graph = Uuid::new_v4();
    let vocab = vocabulary(graph, "Sanasto");
    let source = Arc::new(MockSourceSystem::with_nodes([vocab.clone()]));
    let index = Arc::new(InMemorySearchIndex::existing());
    let engine = ready_engine(&source, &index);
    engine.rebuild_all().await.unwrap();
    assert!(index.document(&graph.to_string()).is_some());

    let mut event = ChangeEvent::saved(vocab.id, NodeTypeId::TerminologicalVocabulary, graph);
    event.event_type = ChangeEventType::NodeDeleted;
    let outcome = engine.apply_change(&event).await;

    assert_eq!(
        outcome,
        ApplyOutcome::Deleted {
            document_id: graph.to_string()
        }
    );
    assert_eq!(index.document_count(), 0);
}

#[tokio::test]
async fn test_term_change_leaves_index_untouched_by_default() {
    let graph = Uuid::new_v4();
    let label_term = term(graph, "fi", "Termi");
    let source = Arc::new(MockSourceSystem::with_nodes([label_term.clone()]));
    let index = Arc::new(InMemorySearchIndex::existing());
    let engine = engine(&source, &index);

    let outcome = engine
        .apply_change(&ChangeEvent::saved(label_term.id, NodeTypeId::Term, graph))
        .await;

    assert!(matches!(outcome, ApplyOutcome::Skipped { .. }));
    assert!(index.operations().is_empty());
}

#[tokio::test]
async fn test_stale_neighbours_are_counted() {
    let graph = Uuid::new_v4();
    let parent = concept(graph, "Yläkäsite");
    let child = concept(graph, "Alakäsite").with_reference("broader", parent.id);
    let source = Arc::new(MockSourceSystem::with_nodes([parent.clone(), child.clone()]));
    let index = Arc::new(InMemorySearchIndex::existing());
    let engine = engine(&source, &index);

    let outcome = engine
        .apply_change(&ChangeEvent::saved(child.id, NodeTypeId::Concept, graph))
        .await;

    assert_eq!(outcome, ApplyOutcome::Indexed { documents: 1 });
    assert!(index.document(&parent.id.to_string()).is_none());
    assert_eq!(engine.stats().stale_neighbours, 1);
}

#[tokio::test]
async fn test_refresh_neighbours_reindexes_embedding_concepts() {
    let graph = Uuid::new_v4();
    let label_term = term(graph, "en", "Renamed");
    let labelled = SourceNode::new(Uuid::new_v4(), NodeTypeId::Concept, Some(graph))
        .with_reference("prefLabelXl", label_term.id);
    let source = Arc::new(MockSourceSystem::with_nodes([
        label_term.clone(),
        labelled.clone(),
    ]));
    let index = Arc::new(InMemorySearchIndex::existing());
    let engine = engine_with(
        &source,
        &index,
        EngineConfig {
            refresh_neighbours: true,
            ..EngineConfig::default()
        },
    );

    let outcome = engine
        .apply_change(&ChangeEvent::saved(label_term.id, NodeTypeId::Term, graph))
        .await;

    assert_eq!(outcome, ApplyOutcome::Indexed { documents: 1 });
    let doc = concept_doc(&index, labelled.id);
    assert_eq!(doc.label["en"], vec!["Renamed".to_string()]);
    assert_eq!(engine.stats().stale_neighbours, 0);
}

#[tokio::test]
async fn test_concurrent_changes_are_all_applied() {
    let graph = Uuid::new_v4();
    let first = concept(graph, "Ensimmäinen");
    let second = concept(graph, "Toinen");
    let source = Arc::new(MockSourceSystem::with_nodes([first.clone(), second.clone()]));
    let index = Arc::new(InMemorySearchIndex::existing());
    let engine = engine(&source, &index);

    let a = {
        let engine = engine.clone();
        let event = ChangeEvent::saved(first.id, NodeTypeId::Concept, graph);
        tokio::spawn(async move { engine.apply_change(&event).await })
    };
    let b = {
        let engine = engine.clone();
        let event = ChangeEvent::saved(second.id, NodeTypeId::Concept, graph);
        tokio::spawn(async move { engine.apply_change(&event).await })
    };
    let (a, b) = tokio::join!(a, b);

    assert_eq!(a.unwrap(), ApplyOutcome::Indexed { documents: 1 });
    assert_eq!(b.unwrap(), ApplyOutcome::Indexed { documents: 1 });
    assert_eq!(index.document_count(), 2);
    assert_eq!(engine.stats().notifications_applied, 2);
}
