//! Localized label helpers.

use std::collections::BTreeMap;

use crate::types::source_node::{LocalizedLabels, LocalizedValue};

/// Languages every document gets a sort key for, in fallback preference order.
pub const DEFAULT_SORT_LANGUAGES: [&str; 3] = ["fi", "sv", "en"];

/// Group well-formed localized values by language, keeping every value.
pub(crate) fn group_by_language(values: &[LocalizedValue]) -> LocalizedLabels {
    let mut grouped = LocalizedLabels::new();
    append_by_language(&mut grouped, values);
    grouped
}

/// Append well-formed localized values to `labels`, keeping every value.
pub(crate) fn append_by_language(labels: &mut LocalizedLabels, values: &[LocalizedValue]) {
    for value in values.iter().filter(|v| v.is_well_formed()) {
        labels
            .entry(value.lang.clone())
            .or_default()
            .push(value.value.clone());
    }
}

/// A localized property is usable as a label when its first entry carries
/// both a language and a value.
pub(crate) fn has_well_formed_first(values: &[LocalizedValue]) -> bool {
    values.first().is_some_and(LocalizedValue::is_well_formed)
}

/// Derive one lower-cased sort key per language.
///
/// Every language present in `labels` sorts by its first value. Languages of
/// [`DEFAULT_SORT_LANGUAGES`] that are missing borrow the sort key of the first
/// default language that is present, or of the first available language when
/// none is, so documents sort consistently whatever languages they carry.
pub fn create_sort_labels(labels: &LocalizedLabels) -> BTreeMap<String, String> {
    let mut sort_labels: BTreeMap<String, String> = labels
        .iter()
        .filter_map(|(lang, values)| {
            values
                .first()
                .map(|value| (lang.clone(), value.to_lowercase()))
        })
        .collect();

    let fallback = DEFAULT_SORT_LANGUAGES
        .iter()
        .find_map(|lang| sort_labels.get(*lang))
        .or_else(|| sort_labels.values().next())
        .cloned();

    if let Some(fallback) = fallback {
        for lang in DEFAULT_SORT_LANGUAGES {
            sort_labels
                .entry(lang.to_string())
                .or_insert_with(|| fallback.clone());
        }
    }

    sort_labels
}
