/*!
# ExprHeat Rendering

CPU rendering and interaction layer for expression heatmaps.

## Architecture

- **raster**: paints one rectangle per (gene, visible sample) cell into an
  RGBA canvas, with full and targeted (highlight-only) repaints
- **legend**: the two-marker range slider and the categorical visibility legend
- **hittest**: pointer → cell resolution, tooltip text and placement
- **view**: the event-driven state machine that owns everything above
- **vector_export**: SVG and PNG export of the composed chart
*/

use exprheat_core::Color;
use serde::{Deserialize, Serialize};

pub mod debounce;
pub mod hittest;
pub mod legend;
pub mod raster;
pub mod vector_export;
pub mod view;

pub use debounce::{Debouncer, RANGE_DEBOUNCE};
pub use hittest::{compose_tooltip, hit_test, hit_test_cells, position_tooltip, Tooltip, TooltipConfig};
pub use legend::{CategoricalLegend, LegendConfig, LegendGroup, LegendRow, Marker, RangeSlider};
pub use raster::{CellRenderer, PixelRect, RenderQuality, Repaint};
pub use vector_export::{ChartExporter, ExportConfig};
pub use view::{HeatmapView, InteractionState, PointerEvent, PointerTarget, ViewConfig, ViewStatus};

/// Cell painting options shared by the canvas, the PNG and the SVG output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderConfig {
    /// Above this many genes cells are drawn crisp and borderless
    #[serde(default = "default_gene_threshold")]
    pub gene_threshold: usize,

    /// Fill for missing or non-numeric values
    #[serde(default = "default_placeholder_color")]
    pub placeholder_color: Color,

    #[serde(default = "default_border_color")]
    pub border_color: Color,

    #[serde(default = "default_highlight_color")]
    pub highlight_color: Color,

    #[serde(default = "default_background_color")]
    pub background_color: Color,
}

fn default_gene_threshold() -> usize { 100 }
fn default_placeholder_color() -> Color { Color::rgb(0xd3, 0xd3, 0xd3) }
fn default_border_color() -> Color { Color::WHITE }
fn default_highlight_color() -> Color { Color::BLACK }
fn default_background_color() -> Color { Color::WHITE }

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            gene_threshold: default_gene_threshold(),
            placeholder_color: default_placeholder_color(),
            border_color: default_border_color(),
            highlight_color: default_highlight_color(),
            background_color: default_background_color(),
        }
    }
}

/// Opaque canvas pixel for a color
pub fn to_rgba(color: Color) -> image::Rgba<u8> {
    image::Rgba([color.r, color.g, color.b, 255])
}
