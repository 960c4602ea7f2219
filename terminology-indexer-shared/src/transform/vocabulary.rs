use crate::transform::labels::{create_sort_labels, group_by_language, has_well_formed_first};
use crate::transform::{TransformError, PREF_LABEL};
use crate::types::index_document::VocabularyDocument;
use crate::types::source_node::SourceNode;

/// Transform a vocabulary node into its document, keyed by the graph id.
///
/// Requires a graph id and a `prefLabel` property whose first entry is well
/// formed. Vocabularies never fall back to linked terms for their label.
pub fn transform_vocabulary(node: &SourceNode) -> Result<VocabularyDocument, TransformError> {
    let graph_id = node
        .graph_id()
        .ok_or(TransformError::MissingGraph { node_id: node.id })?;

    let pref_label = node.property(PREF_LABEL);
    if !has_well_formed_first(pref_label) {
        return Err(TransformError::MissingLabel { node_id: node.id });
    }

    let label = group_by_language(pref_label);
    let sort_by_label = create_sort_labels(&label);

    Ok(VocabularyDocument {
        id: graph_id,
        label,
        sort_by_label,
        modified: node.last_modified_date.clone(),
    })
}
