use crate::color::Color;
use crate::error::Result;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

/// One column of the heatmap. Attribute keys are lower-cased annotation names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub id: String,
    #[serde(default, deserialize_with = "deserialize_attributes")]
    pub attributes: BTreeMap<String, String>,
}

impl Sample {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            attributes: BTreeMap::new(),
        }
    }

    pub fn with_attribute(mut self, key: &str, value: impl Into<String>) -> Self {
        self.attributes.insert(key.to_lowercase(), value.into());
        self
    }

    /// Attribute value for an annotation, looked up case-insensitively
    pub fn attribute(&self, annotation: &str) -> Option<&str> {
        self.attributes
            .get(&annotation.to_lowercase())
            .map(String::as_str)
    }
}

/// One row of the heatmap. `expressions` is aligned to the original,
/// unfiltered sample list of the enclosing [`GeneExpressionData`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Gene {
    pub name: String,
    #[serde(default, rename = "displayName", alias = "display_name", skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, deserialize_with = "deserialize_expressions")]
    pub expressions: Vec<Option<f64>>,
}

impl Gene {
    pub fn new(name: impl Into<String>, expressions: Vec<Option<f64>>) -> Self {
        Self {
            name: name.into(),
            display_name: None,
            expressions,
        }
    }

    pub fn label(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.name)
    }

    /// Finite expression value at an original sample index
    pub fn expression_at(&self, original_index: usize) -> Option<f64> {
        self.expressions
            .get(original_index)
            .copied()
            .flatten()
            .filter(|v| v.is_finite())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    #[serde(default)]
    pub contrast: Option<String>,
    #[serde(default)]
    pub alternate_level: Option<String>,
    #[serde(default)]
    pub reference_level: Option<String>,
    #[serde(default)]
    pub available_attributes: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GeneExpressionData {
    #[serde(default)]
    pub samples: Vec<Sample>,
    #[serde(default)]
    pub genes: Vec<Gene>,
    #[serde(default)]
    pub metadata: Metadata,
}

impl GeneExpressionData {
    pub fn from_json_str(s: &str) -> Result<Self> {
        Ok(serde_json::from_str(s)?)
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty() || self.genes.is_empty()
    }

    /// Every finite expression value in the data set
    pub fn finite_values(&self) -> impl Iterator<Item = f64> + '_ {
        self.genes
            .iter()
            .flat_map(|g| g.expressions.iter())
            .filter_map(|v| *v)
            .filter(|v| v.is_finite())
    }
}

/// How an annotation's values are colored
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum AnnotationKind {
    /// Binary comparison attribute; the alternate level gets the first color of a fixed pair
    Contrast { alternate_level: Option<String> },
    Categorical,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Annotation {
    pub name: String,
    /// Sort priority, lower sorts first
    pub index: i32,
    pub kind: AnnotationKind,
}

impl Annotation {
    pub fn categorical(name: impl Into<String>, index: i32) -> Self {
        Self {
            name: name.into(),
            index,
            kind: AnnotationKind::Categorical,
        }
    }

    pub fn contrast(name: impl Into<String>, index: i32, alternate_level: Option<String>) -> Self {
        Self {
            name: name.into(),
            index,
            kind: AnnotationKind::Contrast { alternate_level },
        }
    }
}

/// Inclusion/exclusion lists. A non-empty `included` wins over `excluded`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListFilter {
    #[serde(default)]
    pub included: Vec<String>,
    #[serde(default)]
    pub excluded: Vec<String>,
}

/// Entry of `additionalAnnotations`: a bare name or a detailed object
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnnotationRef {
    Name(String),
    Detailed {
        name: String,
        #[serde(default)]
        index: Option<i32>,
        #[serde(default, rename = "type")]
        kind: Option<String>,
    },
}

impl AnnotationRef {
    pub fn name(&self) -> &str {
        match self {
            AnnotationRef::Name(name) => name,
            AnnotationRef::Detailed { name, .. } => name,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Setting {
    #[serde(default = "default_high_color")]
    pub high_color: Color,
    #[serde(default = "default_low_color")]
    pub low_color: Color,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub center_color: Option<Color>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_value: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_value: Option<f64>,
    #[serde(default)]
    pub genes: ListFilter,
    #[serde(default)]
    pub samples: ListFilter,
    #[serde(default)]
    pub additional_annotations: Vec<AnnotationRef>,
}

fn default_high_color() -> Color { Color::rgb(0xb2, 0x18, 0x2b) }
fn default_low_color() -> Color { Color::rgb(0x21, 0x66, 0xac) }

impl Default for Setting {
    fn default() -> Self {
        Self {
            high_color: default_high_color(),
            low_color: default_low_color(),
            center_color: None,
            min_value: None,
            max_value: None,
            genes: ListFilter::default(),
            samples: ListFilter::default(),
            additional_annotations: Vec::new(),
        }
    }
}

impl Setting {
    pub fn from_json_str(s: &str) -> Result<Self> {
        Ok(serde_json::from_str(s)?)
    }

    /// Annotations in priority order. The contrast attribute from metadata,
    /// when present, comes first with index 0; additional annotations follow.
    pub fn annotations(&self, metadata: &Metadata) -> Vec<Annotation> {
        let mut annotations = Vec::new();

        if let Some(contrast) = metadata.contrast.as_deref().filter(|c| !c.is_empty()) {
            annotations.push(Annotation::contrast(
                contrast,
                0,
                metadata.alternate_level.clone(),
            ));
        }

        for (position, entry) in self.additional_annotations.iter().enumerate() {
            let name = entry.name();
            if name.is_empty()
                || annotations
                    .iter()
                    .any(|a: &Annotation| a.name.eq_ignore_ascii_case(name))
            {
                continue;
            }
            let default_index = position as i32 + 1;
            let annotation = match entry {
                AnnotationRef::Name(_) => Annotation::categorical(name, default_index),
                AnnotationRef::Detailed { index, kind, .. } => {
                    let index = index.unwrap_or(default_index);
                    match kind.as_deref() {
                        Some(k) if k.eq_ignore_ascii_case("contrast") => {
                            Annotation::contrast(name, index, metadata.alternate_level.clone())
                        }
                        _ => Annotation::categorical(name, index),
                    }
                }
            };
            annotations.push(annotation);
        }

        annotations.sort_by_key(|a| a.index);
        annotations
    }
}

fn deserialize_attributes<'de, D>(deserializer: D) -> std::result::Result<BTreeMap<String, String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: BTreeMap<String, serde_json::Value> = BTreeMap::deserialize(deserializer)?;
    Ok(raw
        .into_iter()
        .filter_map(|(key, value)| {
            let value = match value {
                serde_json::Value::String(s) => s,
                serde_json::Value::Null => return None,
                other => other.to_string(),
            };
            Some((key.to_lowercase(), value))
        })
        .collect())
}

// Anything that is not a number (or a numeric string) becomes a missing value
fn deserialize_expressions<'de, D>(deserializer: D) -> std::result::Result<Vec<Option<f64>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Vec<serde_json::Value> = Vec::deserialize(deserializer)?;
    Ok(raw
        .into_iter()
        .map(|value| match value {
            serde_json::Value::Number(n) => n.as_f64(),
            serde_json::Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        })
        .map(|v| v.filter(|x| x.is_finite()))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_attributes_are_lowercased() {
        let json = r#"{"id": "S1", "attributes": {"Sex": "Male", "Age": 42, "Batch": null}}"#;
        let sample: Sample = serde_json::from_str(json).unwrap();
        assert_eq!(sample.attribute("sex"), Some("Male"));
        assert_eq!(sample.attribute("SEX"), Some("Male"));
        assert_eq!(sample.attribute("age"), Some("42"));
        assert_eq!(sample.attribute("batch"), None);
    }

    #[test]
    fn test_lenient_expression_parsing() {
        let json = r#"{"name": "TP53", "expressions": [1.5, null, "NA", "2.25", true, -3]}"#;
        let gene: Gene = serde_json::from_str(json).unwrap();
        assert_eq!(
            gene.expressions,
            vec![Some(1.5), None, None, Some(2.25), None, Some(-3.0)]
        );
        assert_eq!(gene.expression_at(3), Some(2.25));
        assert_eq!(gene.expression_at(99), None);
        assert_eq!(gene.label(), "TP53");
    }

    #[test]
    fn test_setting_defaults_and_camel_case() {
        let setting = Setting::from_json_str(
            r##"{"highColor": "#ff0000", "samples": {"included": ["A"]}, "minValue": -1.5}"##,
        )
        .unwrap();
        assert_eq!(setting.high_color, Color::rgb(255, 0, 0));
        assert_eq!(setting.low_color, Setting::default().low_color);
        assert_eq!(setting.samples.included, vec!["A".to_string()]);
        assert_eq!(setting.min_value, Some(-1.5));
        assert!(setting.genes.excluded.is_empty());
    }

    #[test]
    fn test_annotations_from_metadata_and_setting() {
        let metadata = Metadata {
            contrast: Some("Condition".into()),
            alternate_level: Some("Tumor".into()),
            reference_level: Some("Normal".into()),
            available_attributes: vec![],
        };
        let setting = Setting::from_json_str(
            r#"{"additionalAnnotations": ["Sex", {"name": "Batch", "index": -1}, "condition"]}"#,
        )
        .unwrap();

        let annotations = setting.annotations(&metadata);
        let names: Vec<&str> = annotations.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["Batch", "Condition", "Sex"]);
        assert_eq!(
            annotations[1].kind,
            AnnotationKind::Contrast { alternate_level: Some("Tumor".into()) }
        );
        assert_eq!(annotations[2].kind, AnnotationKind::Categorical);
    }
}
