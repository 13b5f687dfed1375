use crate::error::LayoutError;
use serde::{Deserialize, Serialize};

/// Layout tunables, in CSS pixels
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutConfig {
    /// Below this many genes the left margin widens to fit gene labels
    #[serde(default = "default_small_gene_threshold")]
    pub small_gene_threshold: usize,

    #[serde(default = "default_wide_left_margin")]
    pub wide_left_margin: f64,

    #[serde(default = "default_narrow_left_margin")]
    pub narrow_left_margin: f64,

    #[serde(default = "default_right_margin")]
    pub right_margin: f64,

    #[serde(default = "default_bottom_margin")]
    pub bottom_margin: f64,

    /// Horizontal space reserved for the legends
    #[serde(default = "default_legend_width")]
    pub legend_width: f64,

    /// Height taken by surrounding page chrome, subtracted from the viewport
    #[serde(default = "default_chrome_height")]
    pub chrome_height: f64,

    #[serde(default = "default_annotation_bar_height")]
    pub annotation_bar_height: f64,

    #[serde(default = "default_annotation_bar_gap")]
    pub annotation_bar_gap: f64,

    /// Gap between the annotation bars and the top of the canvas
    #[serde(default = "default_header_spacing")]
    pub header_spacing: f64,
}

fn default_small_gene_threshold() -> usize { 50 }
fn default_wide_left_margin() -> f64 { 120.0 }
fn default_narrow_left_margin() -> f64 { 20.0 }
fn default_right_margin() -> f64 { 20.0 }
fn default_bottom_margin() -> f64 { 20.0 }
fn default_legend_width() -> f64 { 180.0 }
fn default_chrome_height() -> f64 { 160.0 }
fn default_annotation_bar_height() -> f64 { 12.0 }
fn default_annotation_bar_gap() -> f64 { 3.0 }
fn default_header_spacing() -> f64 { 8.0 }

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            small_gene_threshold: default_small_gene_threshold(),
            wide_left_margin: default_wide_left_margin(),
            narrow_left_margin: default_narrow_left_margin(),
            right_margin: default_right_margin(),
            bottom_margin: default_bottom_margin(),
            legend_width: default_legend_width(),
            chrome_height: default_chrome_height(),
            annotation_bar_height: default_annotation_bar_height(),
            annotation_bar_gap: default_annotation_bar_gap(),
            header_spacing: default_header_spacing(),
        }
    }
}

/// Size reported by the host's resize notification
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContainerSize {
    pub width: f64,
    pub viewport_width: f64,
    pub viewport_height: f64,
}

impl ContainerSize {
    pub fn new(width: f64, viewport_width: f64, viewport_height: f64) -> Self {
        Self { width, viewport_width, viewport_height }
    }

    pub fn is_positive(&self) -> bool {
        self.width > 0.0 && self.viewport_width > 0.0 && self.viewport_height > 0.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Margins {
    pub left: f64,
    pub right: f64,
    pub top: f64,
    pub bottom: f64,
}

/// Geometry of one layout pass. The canvas origin sits at
/// `(margins.left, canvas_offset_y)` in chart coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Layout {
    pub margins: Margins,
    pub drawable_width: f64,
    pub drawable_height: f64,
    pub cell_width: f64,
    pub cell_height: f64,
    pub canvas_width: u32,
    pub canvas_height: u32,
    pub annotation_bars_height: f64,
    pub canvas_offset_y: f64,
    pub legend_x: f64,
    pub chart_width: f64,
    pub chart_height: f64,
    pub gene_count: usize,
    pub sample_count: usize,
    pub show_gene_labels: bool,
}

impl Layout {
    pub fn compute(
        size: ContainerSize,
        gene_count: usize,
        sample_count: usize,
        annotation_count: usize,
        config: &LayoutConfig,
    ) -> Result<Self, LayoutError> {
        if gene_count == 0 || sample_count == 0 {
            return Err(LayoutError::NoData { genes: gene_count, samples: sample_count });
        }

        let show_gene_labels = gene_count < config.small_gene_threshold;
        let left = if show_gene_labels {
            config.wide_left_margin
        } else {
            config.narrow_left_margin
        };
        let annotation_bars_height =
            annotation_count as f64 * (config.annotation_bar_height + config.annotation_bar_gap);
        let top = annotation_bars_height + config.header_spacing;
        let margins = Margins {
            left,
            right: config.right_margin,
            top,
            bottom: config.bottom_margin,
        };

        // Whole pixels so the canvas and the cell grid share one extent
        let drawable_width =
            (size.width - left - config.right_margin - config.legend_width).floor();
        let drawable_height =
            (size.viewport_height - config.chrome_height - top - config.bottom_margin).floor();

        if !(size.is_positive() && drawable_width > 0.0 && drawable_height > 0.0) {
            return Err(LayoutError::NonPositive {
                width: drawable_width,
                height: drawable_height,
            });
        }

        Ok(Self {
            margins,
            drawable_width,
            drawable_height,
            cell_width: drawable_width / sample_count as f64,
            cell_height: drawable_height / gene_count as f64,
            canvas_width: drawable_width as u32,
            canvas_height: drawable_height as u32,
            annotation_bars_height,
            canvas_offset_y: top,
            legend_x: left + drawable_width + config.right_margin,
            chart_width: size.width,
            chart_height: top + drawable_height + config.bottom_margin,
            gene_count,
            sample_count,
            show_gene_labels,
        })
    }

    /// Canvas-relative point to chart coordinates
    pub fn canvas_to_chart(&self, x: f64, y: f64) -> (f64, f64) {
        (x + self.margins.left, y + self.canvas_offset_y)
    }

    /// Y offset of an annotation bar within the header band
    pub fn annotation_bar_y(&self, position: usize, config: &LayoutConfig) -> f64 {
        position as f64 * (config.annotation_bar_height + config.annotation_bar_gap)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn size(width: f64, height: f64) -> ContainerSize {
        ContainerSize::new(width, width, height)
    }

    #[test]
    fn test_cells_fill_drawable_area() {
        let cfg = LayoutConfig::default();
        let layout = Layout::compute(size(1000.0, 900.0), 30, 7, 2, &cfg).unwrap();
        assert!((layout.cell_width * 7.0 - layout.drawable_width).abs() < 1e-9);
        assert!((layout.cell_height * 30.0 - layout.drawable_height).abs() < 1e-9);
        assert_eq!(layout.canvas_width as f64, layout.drawable_width);
        assert_eq!(layout.canvas_height as f64, layout.drawable_height);
    }

    #[test]
    fn test_left_margin_depends_on_gene_count() {
        let cfg = LayoutConfig::default();
        let small = Layout::compute(size(1000.0, 900.0), 10, 5, 0, &cfg).unwrap();
        let large = Layout::compute(size(1000.0, 900.0), 500, 5, 0, &cfg).unwrap();
        assert_eq!(small.margins.left, cfg.wide_left_margin);
        assert!(small.show_gene_labels);
        assert_eq!(large.margins.left, cfg.narrow_left_margin);
        assert!(!large.show_gene_labels);
    }

    #[test]
    fn test_canvas_sits_below_annotation_bars() {
        let cfg = LayoutConfig::default();
        let layout = Layout::compute(size(1000.0, 900.0), 10, 5, 3, &cfg).unwrap();
        assert_eq!(layout.annotation_bars_height, 3.0 * 15.0);
        assert_eq!(layout.canvas_offset_y, 45.0 + cfg.header_spacing);
        assert_eq!(layout.canvas_to_chart(0.0, 0.0), (cfg.wide_left_margin, 53.0));
        assert_eq!(layout.annotation_bar_y(2, &cfg), 30.0);
    }

    #[test]
    fn test_empty_counts_are_no_data() {
        let cfg = LayoutConfig::default();
        assert_eq!(
            Layout::compute(size(1000.0, 900.0), 0, 5, 0, &cfg),
            Err(LayoutError::NoData { genes: 0, samples: 5 })
        );
        assert!(matches!(
            Layout::compute(size(1000.0, 900.0), 3, 0, 0, &cfg),
            Err(LayoutError::NoData { .. })
        ));
    }

    #[test]
    fn test_non_positive_size_is_skipped() {
        let cfg = LayoutConfig::default();
        assert!(matches!(
            Layout::compute(size(0.0, 900.0), 3, 3, 0, &cfg),
            Err(LayoutError::NonPositive { .. })
        ));
        // wide enough container, but the chrome eats the whole viewport
        assert!(matches!(
            Layout::compute(size(1000.0, 150.0), 3, 3, 0, &cfg),
            Err(LayoutError::NonPositive { .. })
        ));
    }
}
