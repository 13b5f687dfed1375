use crate::types::{Annotation, Gene, ListFilter, Sample};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

/// Original indices of the items that pass an inclusion/exclusion filter.
/// A non-empty `included` list takes precedence over `excluded`.
pub(crate) fn select_indices<T, F>(items: &[T], filter: &ListFilter, key: F) -> Vec<usize>
where
    F: Fn(&T) -> &str,
{
    if !filter.included.is_empty() {
        let included: HashSet<&str> = filter.included.iter().map(String::as_str).collect();
        items
            .iter()
            .enumerate()
            .filter(|(_, item)| included.contains(key(*item)))
            .map(|(i, _)| i)
            .collect()
    } else if !filter.excluded.is_empty() {
        let excluded: HashSet<&str> = filter.excluded.iter().map(String::as_str).collect();
        items
            .iter()
            .enumerate()
            .filter(|(_, item)| !excluded.contains(key(*item)))
            .map(|(i, _)| i)
            .collect()
    } else {
        (0..items.len()).collect()
    }
}

pub fn filter_samples<'a>(samples: &'a [Sample], filter: &ListFilter) -> Vec<&'a Sample> {
    select_indices(samples, filter, |s| s.id.as_str())
        .into_iter()
        .map(|i| &samples[i])
        .collect()
}

pub fn filter_genes<'a>(genes: &'a [Gene], filter: &ListFilter) -> Vec<&'a Gene> {
    select_indices(genes, filter, |g| g.name.as_str())
        .into_iter()
        .map(|i| &genes[i])
        .collect()
}

/// Per-category visibility keyed by `"<AnnotationName>:<AttributeValue>"`.
/// A missing key means visible.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VisibilityState {
    entries: BTreeMap<String, bool>,
}

impl VisibilityState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn key(annotation: &str, value: &str) -> String {
        format!("{}:{}", annotation, value)
    }

    pub fn is_visible(&self, annotation: &str, value: &str) -> bool {
        self.is_key_visible(&Self::key(annotation, value))
    }

    pub fn is_key_visible(&self, key: &str) -> bool {
        self.entries.get(key).copied().unwrap_or(true)
    }

    pub fn set(&mut self, key: impl Into<String>, visible: bool) {
        self.entries.insert(key.into(), visible);
    }

    /// Flip one entry and return its new visibility
    pub fn toggle(&mut self, key: &str) -> bool {
        let visible = !self.is_key_visible(key);
        self.entries.insert(key.to_string(), visible);
        visible
    }

    pub fn hidden_keys(&self) -> impl Iterator<Item = &str> {
        self.entries
            .iter()
            .filter(|(_, visible)| !**visible)
            .map(|(k, _)| k.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Drop samples whose value for any configured annotation is explicitly hidden.
/// A sample with no value for an annotation is never hidden by it.
pub fn visible_samples<'a>(
    samples: &[&'a Sample],
    annotations: &[Annotation],
    visibility: &VisibilityState,
) -> Vec<&'a Sample> {
    if visibility.is_empty() {
        return samples.to_vec();
    }
    samples
        .iter()
        .copied()
        .filter(|sample| {
            annotations.iter().all(|annotation| {
                match sample.attribute(&annotation.name) {
                    Some(value) => visibility.is_visible(&annotation.name, value),
                    None => true,
                }
            })
        })
        .collect()
}
