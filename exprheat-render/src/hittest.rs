/*!
# Hit-Testing and Tooltips

Canvas-relative pointer coordinates resolve to a (gene row, sample column)
cell; the tooltip text is composed from the render context and placed next
to the pointer, flipping away from viewport edges.
*/

use exprheat_core::{CellCoord, Layout, RenderContext};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TooltipConfig {
    /// Distance from the pointer to the tooltip's near corner
    #[serde(default = "default_offset")]
    pub offset: f64,

    /// Estimated glyph advance used to size the box
    #[serde(default = "default_char_width")]
    pub char_width: f64,

    #[serde(default = "default_line_height")]
    pub line_height: f64,

    #[serde(default = "default_padding")]
    pub padding: f64,
}

fn default_offset() -> f64 { 12.0 }
fn default_char_width() -> f64 { 7.0 }
fn default_line_height() -> f64 { 16.0 }
fn default_padding() -> f64 { 8.0 }

impl Default for TooltipConfig {
    fn default() -> Self {
        Self {
            offset: default_offset(),
            char_width: default_char_width(),
            line_height: default_line_height(),
            padding: default_padding(),
        }
    }
}

/// Cell under a canvas-relative point, if any
pub fn hit_test_cells(
    cell_width: f64,
    cell_height: f64,
    columns: usize,
    rows: usize,
    x: f64,
    y: f64,
) -> Option<CellCoord> {
    if !(x.is_finite() && y.is_finite()) || x < 0.0 || y < 0.0 {
        return None;
    }
    if !(cell_width > 0.0 && cell_height > 0.0) {
        return None;
    }
    let column = (x / cell_width).floor();
    let row = (y / cell_height).floor();
    if column >= columns as f64 || row >= rows as f64 {
        return None;
    }
    Some(CellCoord::new(row as usize, column as usize))
}

pub fn hit_test(layout: &Layout, x: f64, y: f64) -> Option<CellCoord> {
    hit_test_cells(
        layout.cell_width,
        layout.cell_height,
        layout.sample_count,
        layout.gene_count,
        x,
        y,
    )
}

/// Tooltip lines for one cell: gene, sample, one line per annotation, expression
pub fn compose_tooltip(ctx: &RenderContext, cell: CellCoord) -> Option<Vec<String>> {
    let gene = ctx.gene(cell.gene_row)?;
    let sample = ctx.sample_record(cell.sample_column)?;

    let mut lines = Vec::with_capacity(3 + ctx.annotations().len());
    lines.push(match &gene.display_name {
        Some(display) => format!("Gene: {} ({})", display, gene.name),
        None => format!("Gene: {}", gene.name),
    });
    lines.push(format!("Sample: {}", sample.id));
    for annotation in ctx.annotations() {
        let value = sample.attribute(&annotation.name).unwrap_or("N/A");
        lines.push(format!("{}: {}", annotation.name, value));
    }
    lines.push(match ctx.expression(cell) {
        Some(v) => format!("Expression: {:.4}", v),
        None => "Expression: N/A".to_string(),
    });
    Some(lines)
}

/// Positioned tooltip in viewport coordinates
#[derive(Debug, Clone, PartialEq)]
pub struct Tooltip {
    pub cell: CellCoord,
    pub lines: Vec<String>,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Tooltip {
    /// Compose and place the tooltip for `cell`; `pointer` and `viewport` are in
    /// viewport coordinates.
    pub fn build(
        ctx: &RenderContext,
        cell: CellCoord,
        pointer: (f64, f64),
        viewport: (f64, f64),
        config: &TooltipConfig,
    ) -> Option<Self> {
        let lines = compose_tooltip(ctx, cell)?;
        let (x, y, width, height) = position_tooltip(&lines, pointer, viewport, config);
        Some(Self { cell, lines, x, y, width, height })
    }

    pub fn text(&self) -> String {
        self.lines.join("\n")
    }
}

/// `(x, y, width, height)` of a tooltip box. Placed below-right of the pointer,
/// flipped left or up when it would cross the viewport's right or bottom edge.
pub fn position_tooltip(
    lines: &[String],
    pointer: (f64, f64),
    viewport: (f64, f64),
    config: &TooltipConfig,
) -> (f64, f64, f64, f64) {
    let longest = lines.iter().map(|l| l.chars().count()).max().unwrap_or(0);
    let width = longest as f64 * config.char_width + 2.0 * config.padding;
    let height = lines.len() as f64 * config.line_height + 2.0 * config.padding;

    let (px, py) = pointer;
    let (vw, vh) = viewport;

    let mut x = px + config.offset;
    if x + width > vw {
        x = (px - config.offset - width).max(0.0);
    }
    let mut y = py + config.offset;
    if y + height > vh {
        y = (py - config.offset - height).max(0.0);
    }
    (x, y, width, height)
}
