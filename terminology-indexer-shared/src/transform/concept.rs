use std::collections::BTreeMap;

use crate::transform::labels::{
    append_by_language, create_sort_labels, group_by_language, has_well_formed_first,
};
use crate::transform::{
    TransformContext, TransformError, ALT_LABEL_XL, BROADER, DEFINITION, PREF_LABEL,
    PREF_LABEL_XL, STATUS,
};
use crate::types::index_document::ConceptDocument;
use crate::types::source_node::{LocalizedLabels, SourceNode};

/// Transform a concept node into its document.
///
/// The label comes from the concept's own `prefLabel` when its first entry is
/// well formed, otherwise from the `prefLabel` of every term linked through
/// `prefLabelXl`. A concept without either is skipped. `narrower` is read from
/// the `broader` referrers, so it is only as complete as the referrers the node
/// was fetched with.
pub fn transform_concept(
    node: &SourceNode,
    context: &TransformContext<'_>,
) -> Result<ConceptDocument, TransformError> {
    let graph_id = node
        .graph_id()
        .ok_or(TransformError::MissingGraph { node_id: node.id })?;

    let label = resolve_label(node, context);
    if label.is_empty() {
        return Err(TransformError::MissingLabel { node_id: node.id });
    }

    let broader: Vec<_> = node.reference_ids(BROADER).collect();
    let narrower: Vec<_> = node.referrer_ids(BROADER).collect();
    let sort_by_label = create_sort_labels(&label);

    Ok(ConceptDocument {
        id: node.id,
        uri: node.uri.clone(),
        vocabulary: context.vocabulary(&graph_id).cloned(),
        alt_label: resolve_alt_labels(node, context),
        definition: resolve_definition(node),
        has_narrower: !narrower.is_empty(),
        broader,
        narrower,
        status: node.first_value(STATUS).map(str::to_string),
        modified: node.last_modified_date.clone(),
        sort_by_label,
        label,
    })
}

fn resolve_label(node: &SourceNode, context: &TransformContext<'_>) -> LocalizedLabels {
    let pref_label = node.property(PREF_LABEL);
    if has_well_formed_first(pref_label) {
        return group_by_language(pref_label);
    }

    linked_term_labels(node, context, PREF_LABEL_XL)
}

fn resolve_alt_labels(node: &SourceNode, context: &TransformContext<'_>) -> LocalizedLabels {
    linked_term_labels(node, context, ALT_LABEL_XL)
}

/// Collect the `prefLabel` values of every resolvable term referenced under
/// `reference`, cumulatively per language.
fn linked_term_labels(
    node: &SourceNode,
    context: &TransformContext<'_>,
    reference: &str,
) -> LocalizedLabels {
    let mut labels = LocalizedLabels::new();
    for term in node.reference_ids(reference).filter_map(|id| context.node(&id)) {
        append_by_language(&mut labels, term.property(PREF_LABEL));
    }
    labels
}

/// One definition per language; a later value for the same language wins.
fn resolve_definition(node: &SourceNode) -> BTreeMap<String, String> {
    node.property(DEFINITION)
        .iter()
        .filter(|v| v.is_well_formed())
        .map(|v| (v.lang.clone(), v.value.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::types::source_node::NodeTypeId;
    use uuid::Uuid;

    fn concept(graph: Uuid) -> SourceNode {
        SourceNode::new(Uuid::new_v4(), NodeTypeId::Concept, Some(graph))
    }

    fn term(graph: Uuid, lang: &str, value: &str) -> SourceNode {
        SourceNode::new(Uuid::new_v4(), NodeTypeId::Term, Some(graph))
            .with_property(PREF_LABEL, lang, value)
    }

    fn index(nodes: Vec<SourceNode>) -> HashMap<Uuid, SourceNode> {
        nodes.into_iter().map(|n| (n.id, n)).collect()
    }

    #[test]
    fn test_direct_pref_label() {
        let graph = Uuid::new_v4();
        let node = concept(graph).with_property(PREF_LABEL, "fi", "Esimerkki");
        let nodes = HashMap::new();

        let doc = transform_concept(&node, &TransformContext::new(&nodes)).unwrap();

        assert_eq!(doc.id, node.id);
        assert_eq!(doc.label["fi"], vec!["Esimerkki"]);
        assert_eq!(doc.sort_by_label["fi"], "esimerkki");
        assert!(doc.vocabulary.is_none());
    }

    #[test]
    fn test_label_from_linked_term() {
        let graph = Uuid::new_v4();
        let term = term(graph, "en", "Example");
        let node = concept(graph).with_reference(PREF_LABEL_XL, term.id);
        let nodes = index(vec![term]);

        let doc = transform_concept(&node, &TransformContext::new(&nodes)).unwrap();

        assert_eq!(doc.label["en"], vec!["Example"]);
    }

    #[test]
    fn test_direct_label_wins_over_linked_terms() {
        let graph = Uuid::new_v4();
        let term = term(graph, "en", "Linked");
        let node = concept(graph)
            .with_property(PREF_LABEL, "fi", "Suora")
            .with_reference(PREF_LABEL_XL, term.id);
        let nodes = index(vec![term]);

        let doc = transform_concept(&node, &TransformContext::new(&nodes)).unwrap();

        assert_eq!(doc.label.len(), 1);
        assert_eq!(doc.label["fi"], vec!["Suora"]);
    }

    #[test]
    fn test_linked_terms_merge_per_language() {
        let graph = Uuid::new_v4();
        let first = term(graph, "fi", "Ensimmäinen");
        let second = term(graph, "fi", "Toinen");
        let english = term(graph, "en", "English");
        let node = concept(graph)
            .with_reference(PREF_LABEL_XL, first.id)
            .with_reference(PREF_LABEL_XL, second.id)
            .with_reference(PREF_LABEL_XL, english.id);
        let nodes = index(vec![first, second, english]);

        let doc = transform_concept(&node, &TransformContext::new(&nodes)).unwrap();

        assert_eq!(doc.label["fi"], vec!["Ensimmäinen", "Toinen"]);
        assert_eq!(doc.label["en"], vec!["English"]);
    }

    #[test]
    fn test_missing_label_is_skipped() {
        let graph = Uuid::new_v4();
        let node = concept(graph).with_reference(PREF_LABEL_XL, Uuid::new_v4());
        let nodes = HashMap::new();

        assert_eq!(
            transform_concept(&node, &TransformContext::new(&nodes)),
            Err(TransformError::MissingLabel { node_id: node.id })
        );
    }

    #[test]
    fn test_missing_graph_is_skipped() {
        let node = SourceNode::new(Uuid::new_v4(), NodeTypeId::Concept, None)
            .with_property(PREF_LABEL, "fi", "Esimerkki");
        let nodes = HashMap::new();

        assert_eq!(
            transform_concept(&node, &TransformContext::new(&nodes)),
            Err(TransformError::MissingGraph { node_id: node.id })
        );
    }

    #[test]
    fn test_alt_labels_accumulate_across_terms() {
        let graph = Uuid::new_v4();
        let alt_one = term(graph, "fi", "Synonyymi");
        let alt_two = term(graph, "fi", "Toinen synonyymi");
        let alt_three = term(graph, "sv", "Synonym");
        let node = concept(graph)
            .with_property(PREF_LABEL, "fi", "Käsite")
            .with_reference(ALT_LABEL_XL, alt_one.id)
            .with_reference(ALT_LABEL_XL, alt_two.id)
            .with_reference(ALT_LABEL_XL, alt_three.id);
        let nodes = index(vec![alt_one, alt_two, alt_three]);

        let doc = transform_concept(&node, &TransformContext::new(&nodes)).unwrap();

        assert_eq!(doc.alt_label["fi"], vec!["Synonyymi", "Toinen synonyymi"]);
        assert_eq!(doc.alt_label["sv"], vec!["Synonym"]);
    }

    #[test]
    fn test_definition_last_value_per_language_wins() {
        let graph = Uuid::new_v4();
        let node = concept(graph)
            .with_property(PREF_LABEL, "fi", "Käsite")
            .with_property(DEFINITION, "fi", "Vanha")
            .with_property(DEFINITION, "en", "Definition")
            .with_property(DEFINITION, "fi", "Uusi");
        let nodes = HashMap::new();

        let doc = transform_concept(&node, &TransformContext::new(&nodes)).unwrap();

        assert_eq!(doc.definition["fi"], "Uusi");
        assert_eq!(doc.definition["en"], "Definition");
    }

    #[test]
    fn test_narrower_from_broader_referrers() {
        let graph = Uuid::new_v4();
        let parent_id = Uuid::new_v4();
        let child_d = concept(graph)
            .with_property(PREF_LABEL, "fi", "D")
            .with_reference(BROADER, parent_id);
        let child_e = concept(graph)
            .with_property(PREF_LABEL, "fi", "E")
            .with_reference(BROADER, parent_id);
        let mut parent = concept(graph)
            .with_property(PREF_LABEL, "fi", "C")
            .with_referrer(BROADER, child_d.id)
            .with_referrer(BROADER, child_e.id);
        parent.id = parent_id;
        let (d, e) = (child_d.id, child_e.id);
        let nodes = index(vec![child_d, child_e]);
        let context = TransformContext::new(&nodes);

        let doc = transform_concept(&parent, &context).unwrap();
        assert_eq!(doc.narrower, vec![d, e]);
        assert!(doc.has_narrower);
        assert!(doc.broader.is_empty());

        let child = transform_concept(context.node(&d).unwrap(), &context).unwrap();
        assert_eq!(child.broader, vec![parent_id]);
        assert!(!child.has_narrower);
    }

    #[test]
    fn test_vocabulary_status_and_modified() {
        let graph = Uuid::new_v4();
        let vocabulary = SourceNode::new(
            Uuid::new_v4(),
            NodeTypeId::TerminologicalVocabulary,
            Some(graph),
        )
        .with_property(PREF_LABEL, "fi", "Sanasto");
        let mut node = concept(graph)
            .with_property(PREF_LABEL, "fi", "Käsite")
            .with_property(STATUS, "", "VALID");
        node.last_modified_date = Some("2018-03-21T10:36:34.360+02:00".to_string());
        let nodes = index(vec![vocabulary]);

        let doc = transform_concept(&node, &TransformContext::new(&nodes)).unwrap();

        assert_eq!(doc.status.as_deref(), Some("VALID"));
        assert_eq!(doc.modified.as_deref(), Some("2018-03-21T10:36:34.360+02:00"));
        let embedded = doc.vocabulary.unwrap();
        assert_eq!(embedded.id, graph);
        assert_eq!(embedded.label["fi"], vec!["Sanasto"]);
    }
}
