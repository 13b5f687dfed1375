//! Colors for annotation side-bars and legend swatches.

use crate::color::Color;
use crate::types::{Annotation, AnnotationKind, Sample};
use std::collections::BTreeSet;

/// Fixed pair for contrast annotations: alternate level first, everything else second
pub const CONTRAST_PAIR: [colorous::Color; 2] = [colorous::SET1[0], colorous::SET1[1]];

/// Distinct values of one annotation across `samples`, sorted lexicographically
pub fn observed_values(samples: &[&Sample], annotation: &str) -> Vec<String> {
    samples
        .iter()
        .filter_map(|s| s.attribute(annotation))
        .map(str::to_string)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

#[derive(Debug, Clone, PartialEq)]
pub struct PaletteGroup {
    pub annotation: Annotation,
    /// `(value, color)` in lexicographic value order
    pub entries: Vec<(String, Color)>,
}

impl PaletteGroup {
    pub fn color(&self, value: &str) -> Option<Color> {
        self.entries
            .iter()
            .find(|(v, _)| v == value)
            .map(|(_, c)| *c)
    }
}

/// Per-annotation value → color assignment, one group per annotation in priority order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnnotationPalette {
    groups: Vec<PaletteGroup>,
}

impl AnnotationPalette {
    /// Assign colors from the values observed in `samples`. Pass the filtered,
    /// pre-visibility samples so a hidden category keeps its swatch.
    pub fn build(annotations: &[Annotation], samples: &[&Sample]) -> Self {
        let groups = annotations
            .iter()
            .map(|annotation| {
                let values = observed_values(samples, &annotation.name);
                let entries = match &annotation.kind {
                    AnnotationKind::Contrast { alternate_level } => {
                        contrast_entries(values, alternate_level.as_deref())
                    }
                    AnnotationKind::Categorical => categorical_entries(values),
                };
                PaletteGroup {
                    annotation: annotation.clone(),
                    entries,
                }
            })
            .collect();
        Self { groups }
    }

    pub fn groups(&self) -> &[PaletteGroup] {
        &self.groups
    }

    pub fn group(&self, annotation: &str) -> Option<&PaletteGroup> {
        self.groups
            .iter()
            .find(|g| g.annotation.name.eq_ignore_ascii_case(annotation))
    }

    pub fn color(&self, annotation: &str, value: &str) -> Option<Color> {
        self.group(annotation).and_then(|g| g.color(value))
    }

    /// Swatch color of `sample` for `annotation`; `None` when the value is missing
    pub fn sample_color(&self, annotation: &str, sample: &Sample) -> Option<Color> {
        sample
            .attribute(annotation)
            .and_then(|value| self.color(annotation, value))
    }
}

fn contrast_entries(values: Vec<String>, alternate_level: Option<&str>) -> Vec<(String, Color)> {
    let [alternate, reference] = CONTRAST_PAIR.map(Color::from);
    match alternate_level {
        Some(level) => values
            .into_iter()
            .map(|v| {
                let color = if v == level { alternate } else { reference };
                (v, color)
            })
            .collect(),
        // No declared level: alternate the pair in value order
        None => values
            .into_iter()
            .enumerate()
            .map(|(i, v)| (v, if i % 2 == 0 { alternate } else { reference }))
            .collect(),
    }
}

fn categorical_entries(values: Vec<String>) -> Vec<(String, Color)> {
    let palette = &colorous::TABLEAU10;
    values
        .into_iter()
        .enumerate()
        .map(|(i, v)| (v, Color::from(palette[i % palette.len()])))
        .collect()
}
