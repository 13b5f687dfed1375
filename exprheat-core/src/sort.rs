use crate::types::{Annotation, Sample};
use std::cmp::Ordering;

/// Order samples by a priority chain of annotation values.
///
/// Annotations are applied in ascending `index` order. Values compare as
/// plain strings (a missing value compares as the empty string); ties fall
/// through to the next annotation and full ties keep their input order.
pub fn sort_samples<'a>(samples: Vec<&'a Sample>, annotations: &[Annotation]) -> Vec<&'a Sample> {
    let mut chain: Vec<&Annotation> = annotations.iter().collect();
    chain.sort_by_key(|a| a.index);

    let mut sorted = samples;
    if chain.is_empty() {
        return sorted;
    }
    sorted.sort_by(|a, b| compare_by_chain(a, b, &chain));
    sorted
}

fn compare_by_chain(a: &Sample, b: &Sample, chain: &[&Annotation]) -> Ordering {
    for annotation in chain {
        let left = a.attribute(&annotation.name).unwrap_or("");
        let right = b.attribute(&annotation.name).unwrap_or("");
        match left.cmp(right) {
            Ordering::Equal => continue,
            other => return other,
        }
    }
    Ordering::Equal
}
