//! The pure `(setting, data, visibility, size) → RenderContext` pass.
//!
//! A [`RenderContext`] is rebuilt as a whole whenever the setting, the data,
//! the visibility state or the container size changes. Derived state lives in
//! a shared, read-only [`Frame`]; moving a range boundary swaps only the color
//! scale through [`RenderContext::with_color_scale`], and hit-testing may only
//! touch the highlight slot.

use crate::color::Color;
use crate::error::LayoutError;
use crate::filter::{select_indices, visible_samples, VisibilityState};
use crate::layout::{ContainerSize, Layout, LayoutConfig};
use crate::palette::{observed_values, AnnotationPalette};
use crate::scale::ColorScale;
use crate::sort::sort_samples;
use crate::types::{Annotation, Gene, GeneExpressionData, Sample, Setting};
use log::debug;
use std::collections::HashMap;
use std::sync::Arc;

/// Sample id → position in the original, unfiltered sample list
#[derive(Debug, Clone, Default)]
pub struct SampleIndex {
    by_id: HashMap<String, usize>,
}

impl SampleIndex {
    /// The first occurrence wins when ids repeat
    pub fn new(samples: &[Sample]) -> Self {
        let mut by_id = HashMap::with_capacity(samples.len());
        for (i, sample) in samples.iter().enumerate() {
            by_id.entry(sample.id.clone()).or_insert(i);
        }
        Self { by_id }
    }

    pub fn get(&self, id: &str) -> Option<usize> {
        self.by_id.get(id).copied()
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}

/// One heatmap column
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisibleSample {
    pub id: String,
    pub original_index: usize,
}

/// Address of one cell in the visible grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CellCoord {
    pub gene_row: usize,
    pub sample_column: usize,
}

impl CellCoord {
    pub fn new(gene_row: usize, sample_column: usize) -> Self {
        Self { gene_row, sample_column }
    }
}

/// Output of the filter stage, before visibility is applied
#[derive(Debug, Clone)]
pub struct FilteredData<'a> {
    /// Original indices of the genes that passed the gene filter
    pub gene_indices: Vec<usize>,
    pub samples: Vec<&'a Sample>,
    pub annotations: Vec<Annotation>,
}

impl<'a> FilteredData<'a> {
    /// Legend rows for an annotation: values seen in the filtered samples
    pub fn observed_values(&self, annotation: &str) -> Vec<String> {
        observed_values(&self.samples, annotation)
    }

    pub fn palette(&self) -> AnnotationPalette {
        AnnotationPalette::build(&self.annotations, &self.samples)
    }
}

pub fn filter_data<'a>(data: &'a GeneExpressionData, setting: &Setting) -> FilteredData<'a> {
    let gene_indices = select_indices(&data.genes, &setting.genes, |g| g.name.as_str());
    let samples = select_indices(&data.samples, &setting.samples, |s| s.id.as_str())
        .into_iter()
        .map(|i| &data.samples[i])
        .collect();
    FilteredData {
        gene_indices,
        samples,
        annotations: setting.annotations(&data.metadata),
    }
}

/// Derived, read-only part of a render context
#[derive(Debug)]
pub struct Frame {
    data: Arc<GeneExpressionData>,
    gene_indices: Vec<usize>,
    samples: Vec<VisibleSample>,
    annotations: Vec<Annotation>,
    palette: AnnotationPalette,
    layout: Layout,
}

#[derive(Debug, Clone)]
pub struct RenderContext {
    frame: Arc<Frame>,
    scale: ColorScale,
    highlight: Option<CellCoord>,
}

/// Run filter, visibility, sort and layout, then bundle the result with `scale`.
pub fn build_context(
    data: &Arc<GeneExpressionData>,
    setting: &Setting,
    visibility: &VisibilityState,
    scale: ColorScale,
    size: ContainerSize,
    layout_config: &LayoutConfig,
) -> Result<RenderContext, LayoutError> {
    let filtered = filter_data(data, setting);
    let shown = visible_samples(&filtered.samples, &filtered.annotations, visibility);
    let sorted = sort_samples(shown, &filtered.annotations);

    let index = SampleIndex::new(&data.samples);
    let samples: Vec<VisibleSample> = sorted
        .iter()
        .filter_map(|s| {
            index.get(&s.id).map(|original_index| VisibleSample {
                id: s.id.clone(),
                original_index,
            })
        })
        .collect();

    let layout = Layout::compute(
        size,
        filtered.gene_indices.len(),
        samples.len(),
        filtered.annotations.len(),
        layout_config,
    )?;

    debug!(
        "Rebuilt render context: {} genes x {} samples ({} filtered, {} annotations), cell {:.2}x{:.2}",
        filtered.gene_indices.len(),
        samples.len(),
        filtered.samples.len(),
        filtered.annotations.len(),
        layout.cell_width,
        layout.cell_height
    );

    let palette = filtered.palette();
    Ok(RenderContext {
        frame: Arc::new(Frame {
            data: Arc::clone(data),
            gene_indices: filtered.gene_indices,
            samples,
            annotations: filtered.annotations,
            palette,
            layout,
        }),
        scale,
        highlight: None,
    })
}

impl RenderContext {
    /// Same frame under a new color scale; the highlight carries over
    pub fn with_color_scale(&self, scale: ColorScale) -> Self {
        Self {
            frame: Arc::clone(&self.frame),
            scale,
            highlight: self.highlight,
        }
    }

    /// Replace the highlighted cell and return the previous one
    pub fn set_highlight(&mut self, cell: Option<CellCoord>) -> Option<CellCoord> {
        std::mem::replace(&mut self.highlight, cell)
    }

    pub fn highlight(&self) -> Option<CellCoord> {
        self.highlight
    }

    pub fn scale(&self) -> &ColorScale {
        &self.scale
    }

    pub fn layout(&self) -> &Layout {
        &self.frame.layout
    }

    pub fn annotations(&self) -> &[Annotation] {
        &self.frame.annotations
    }

    pub fn palette(&self) -> &AnnotationPalette {
        &self.frame.palette
    }

    pub fn samples(&self) -> &[VisibleSample] {
        &self.frame.samples
    }

    pub fn data(&self) -> &GeneExpressionData {
        &self.frame.data
    }

    pub fn gene_count(&self) -> usize {
        self.frame.gene_indices.len()
    }

    pub fn sample_count(&self) -> usize {
        self.frame.samples.len()
    }

    /// True when both contexts share one derived frame
    pub fn shares_frame(&self, other: &RenderContext) -> bool {
        Arc::ptr_eq(&self.frame, &other.frame)
    }

    pub fn contains(&self, cell: CellCoord) -> bool {
        cell.gene_row < self.gene_count() && cell.sample_column < self.sample_count()
    }

    pub fn gene(&self, row: usize) -> Option<&Gene> {
        self.frame
            .gene_indices
            .get(row)
            .and_then(|&i| self.frame.data.genes.get(i))
    }

    pub fn sample(&self, column: usize) -> Option<&VisibleSample> {
        self.frame.samples.get(column)
    }

    /// Full sample record (with attributes) behind a visible column
    pub fn sample_record(&self, column: usize) -> Option<&Sample> {
        self.sample(column)
            .and_then(|s| self.frame.data.samples.get(s.original_index))
    }

    /// Finite expression value of a cell, read at the sample's original index
    pub fn expression(&self, cell: CellCoord) -> Option<f64> {
        let gene = self.gene(cell.gene_row)?;
        let sample = self.sample(cell.sample_column)?;
        gene.expression_at(sample.original_index)
    }

    /// Scale color of a cell, or `placeholder` when it has no usable value
    pub fn cell_color(&self, cell: CellCoord, placeholder: Color) -> Color {
        match self.expression(cell) {
            Some(v) => self.scale.color(v),
            None => placeholder,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scale::data_scale_bound;
    use crate::types::ListFilter;

    fn data() -> Arc<GeneExpressionData> {
        let samples = vec![
            Sample::new("A").with_attribute("sex", "Male"),
            Sample::new("B").with_attribute("sex", "Female"),
            Sample::new("C").with_attribute("sex", "Male"),
            Sample::new("D").with_attribute("sex", "Female"),
        ];
        let genes = vec![
            Gene::new("G1", vec![Some(1.0), Some(2.0), Some(3.0), Some(4.0)]),
            Gene::new("G2", vec![Some(-1.0), None, Some(-3.0), Some(-4.0)]),
            Gene::new("G3", vec![Some(0.0), Some(0.5), Some(-0.5), Some(f64::NAN)]),
        ];
        Arc::new(GeneExpressionData { samples, genes, ..Default::default() })
    }

    fn size() -> ContainerSize {
        ContainerSize::new(1000.0, 1000.0, 900.0)
    }

    fn context(setting: &Setting, visibility: &VisibilityState) -> RenderContext {
        let data = data();
        let scale = ColorScale::from_setting(setting, data_scale_bound(&data));
        build_context(&data, setting, visibility, scale, size(), &LayoutConfig::default()).unwrap()
    }

    #[test]
    fn test_included_samples_keep_original_order_and_index() {
        let setting = Setting {
            samples: ListFilter { included: vec!["D".into(), "B".into()], excluded: vec![] },
            ..Default::default()
        };
        let ctx = context(&setting, &VisibilityState::new());
        let ids: Vec<&str> = ctx.samples().iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["B", "D"]);
        assert_eq!(ctx.samples()[1].original_index, 3);
        // expression is read at the original index, not the filtered column
        assert_eq!(ctx.expression(CellCoord::new(0, 1)), Some(4.0));
        assert_eq!(ctx.gene_count(), 3);
    }

    #[test]
    fn test_missing_and_nan_values_use_placeholder() {
        let ctx = context(&Setting::default(), &VisibilityState::new());
        let placeholder = Color::rgb(0xd3, 0xd3, 0xd3);
        assert_eq!(ctx.expression(CellCoord::new(1, 1)), None);
        assert_eq!(ctx.cell_color(CellCoord::new(1, 1), placeholder), placeholder);
        assert_eq!(ctx.cell_color(CellCoord::new(2, 3), placeholder), placeholder);
        assert_eq!(ctx.expression(CellCoord::new(9, 0)), None);
    }

    #[test]
    fn test_visibility_hides_samples() {
        let setting = Setting {
            additional_annotations: vec![crate::types::AnnotationRef::Name("Sex".into())],
            ..Default::default()
        };
        let mut visibility = VisibilityState::new();
        visibility.set("Sex:Male", false);
        let ctx = context(&setting, &visibility);
        let ids: Vec<&str> = ctx.samples().iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["B", "D"]);
        // the palette still knows the hidden category
        assert!(ctx.palette().color("Sex", "Male").is_some());
    }

    #[test]
    fn test_everything_hidden_is_no_data() {
        let setting = Setting {
            samples: ListFilter { included: vec!["nobody".into()], excluded: vec![] },
            ..Default::default()
        };
        let data = data();
        let scale = ColorScale::from_setting(&setting, data_scale_bound(&data));
        let result = build_context(
            &data,
            &setting,
            &VisibilityState::new(),
            scale,
            size(),
            &LayoutConfig::default(),
        );
        assert!(matches!(result, Err(LayoutError::NoData { genes: 3, samples: 0 })));
    }

    #[test]
    fn test_color_scale_swap_shares_frame() {
        let mut ctx = context(&Setting::default(), &VisibilityState::new());
        ctx.set_highlight(Some(CellCoord::new(0, 0)));
        let narrowed = ctx.with_color_scale(ctx.scale().with_top(0.1));
        assert!(narrowed.shares_frame(&ctx));
        assert_eq!(narrowed.highlight(), Some(CellCoord::new(0, 0)));
        assert_ne!(narrowed.scale(), ctx.scale());
    }

    #[test]
    fn test_set_highlight_returns_previous() {
        let mut ctx = context(&Setting::default(), &VisibilityState::new());
        assert_eq!(ctx.set_highlight(Some(CellCoord::new(1, 2))), None);
        assert_eq!(ctx.set_highlight(None), Some(CellCoord::new(1, 2)));
    }

    #[test]
    fn test_sample_index_first_occurrence_wins() {
        let samples = vec![Sample::new("x"), Sample::new("y"), Sample::new("x")];
        let index = SampleIndex::new(&samples);
        assert_eq!(index.get("x"), Some(0));
        assert_eq!(index.get("y"), Some(1));
        assert_eq!(index.len(), 2);
    }
}
