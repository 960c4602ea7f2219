//! Index settings and mapping definitions.
//!
//! The definitions can be loaded from JSON files; when none are configured the
//! built-in documents below are used.

use std::path::Path;

use serde_json::{json, Map, Value};
use terminology_indexer_shared::DEFAULT_SORT_LANGUAGES;

use crate::errors::SearchIndexError;

/// The default name of the search index.
pub const DEFAULT_INDEX_NAME: &str = "terminology";

/// Settings and mapping documents used when creating the index.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexDefinition {
    /// Body of the create-index request.
    pub settings: Value,
    /// Body of the put-mapping request.
    pub mapping: Value,
}

impl Default for IndexDefinition {
    fn default() -> Self {
        Self {
            settings: default_index_settings(),
            mapping: default_mapping(),
        }
    }
}

impl IndexDefinition {
    /// Load the definition, reading each document from its file when a path is
    /// given and falling back to the built-in document otherwise.
    pub fn load(
        settings_path: Option<&Path>,
        mapping_path: Option<&Path>,
    ) -> Result<Self, SearchIndexError> {
        let settings = match settings_path {
            Some(path) => read_json(path)?,
            None => default_index_settings(),
        };
        let mapping = match mapping_path {
            Some(path) => read_json(path)?,
            None => default_mapping(),
        };
        Ok(Self { settings, mapping })
    }
}

fn read_json(path: &Path) -> Result<Value, SearchIndexError> {
    let raw = std::fs::read_to_string(path).map_err(|e| {
        SearchIndexError::definition(format!("Failed to read {}: {}", path.display(), e))
    })?;
    serde_json::from_str(&raw).map_err(|e| {
        SearchIndexError::definition(format!("Failed to parse {}: {}", path.display(), e))
    })
}

/// Index settings: a lowercase normalizer for sort keys.
///
/// # Sharding Configuration
///
/// - 1 primary shard
/// - 1 replica for redundancy
pub fn default_index_settings() -> Value {
    json!({
        "settings": {
            "number_of_shards": 1,
            "number_of_replicas": 1,
            "analysis": {
                "normalizer": {
                    "sort_normalizer": {
                        "type": "custom",
                        "filter": ["lowercase"]
                    }
                }
            }
        }
    })
}

/// Field mapping shared by concept and vocabulary documents.
///
/// Labels are full-text per language with a keyword sub-field for exact
/// matches; sort keys are normalized keywords, one per default language.
pub fn default_mapping() -> Value {
    let label = json!({
        "type": "text",
        "fields": {
            "keyword": { "type": "keyword" }
        }
    });

    let sort_fields: Map<String, Value> = DEFAULT_SORT_LANGUAGES
        .iter()
        .map(|lang| {
            (
                lang.to_string(),
                json!({ "type": "keyword", "normalizer": "sort_normalizer" }),
            )
        })
        .collect();

    json!({
        "dynamic_templates": [
            // `*label.*` matches `label.fi` and `vocabulary.label.fi`, not `altLabel.fi`
            {
                "labels": {
                    "path_match": "*label.*",
                    "match_mapping_type": "string",
                    "mapping": label
                }
            },
            {
                "alt_labels": {
                    "path_match": "altLabel.*",
                    "match_mapping_type": "string",
                    "mapping": label
                }
            },
            {
                "sort_labels": {
                    "path_match": "*sortByLabel.*",
                    "match_mapping_type": "string",
                    "mapping": { "type": "keyword", "normalizer": "sort_normalizer" }
                }
            },
            {
                "definitions": {
                    "path_match": "definition.*",
                    "match_mapping_type": "string",
                    "mapping": { "type": "text" }
                }
            }
        ],
        "properties": {
            "documentType": { "type": "keyword" },
            "id": { "type": "keyword" },
            "uri": { "type": "keyword" },
            "status": { "type": "keyword" },
            "modified": { "type": "date" },
            "broader": { "type": "keyword" },
            "narrower": { "type": "keyword" },
            "hasNarrower": { "type": "boolean" },
            "sortByLabel": { "properties": sort_fields },
            "vocabulary": {
                "properties": {
                    "id": { "type": "keyword" },
                    "modified": { "type": "date" }
                }
            }
        }
    })
}
