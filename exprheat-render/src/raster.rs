/*!
# Cell Rasteriser

Paints the heatmap grid into an RGBA canvas sized to the layout's drawable
area. A full repaint runs after any dimension, visible-set or color-scale
change; hover only repaints the previously and newly highlighted cells.
*/

use crate::{to_rgba, RenderConfig};
use exprheat_core::{CellCoord, Color, Layout, RenderContext};
use image::{Rgba, RgbaImage};
use log::{debug, trace};

/// How cell rectangles are drawn
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderQuality {
    /// Large matrices: integer bounds, no borders, no smoothing
    Crisp,
    /// Small matrices: 1 px border around every cell
    Detailed,
}

impl RenderQuality {
    pub fn for_gene_count(genes: usize, threshold: usize) -> Self {
        if genes > threshold {
            RenderQuality::Crisp
        } else {
            RenderQuality::Detailed
        }
    }
}

/// Integer pixel rectangle in canvas coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl PixelRect {
    pub fn right(&self) -> u32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> u32 {
        self.y + self.height
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// Cells touched by one paint call
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Repaint {
    pub full: bool,
    pub cells: Vec<CellCoord>,
}

impl Repaint {
    pub fn full() -> Self {
        Self { full: true, cells: Vec::new() }
    }

    pub fn is_empty(&self) -> bool {
        !self.full && self.cells.is_empty()
    }
}

pub struct CellRenderer {
    config: RenderConfig,
}

impl CellRenderer {
    pub fn new(config: RenderConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    pub fn quality(&self, ctx: &RenderContext) -> RenderQuality {
        RenderQuality::for_gene_count(ctx.gene_count(), self.config.gene_threshold)
    }

    /// Bounds of a cell: `round(i·cell)` to `round((i+1)·cell)` on each axis,
    /// so neighbouring cells share edges exactly.
    pub fn cell_rect(layout: &Layout, cell: CellCoord) -> PixelRect {
        let edge = |i: usize, size: f64, limit: u32| -> u32 {
            ((i as f64 * size).round().max(0.0) as u32).min(limit)
        };
        let x0 = edge(cell.sample_column, layout.cell_width, layout.canvas_width);
        let x1 = edge(cell.sample_column + 1, layout.cell_width, layout.canvas_width);
        let y0 = edge(cell.gene_row, layout.cell_height, layout.canvas_height);
        let y1 = edge(cell.gene_row + 1, layout.cell_height, layout.canvas_height);
        PixelRect {
            x: x0,
            y: y0,
            width: x1.saturating_sub(x0),
            height: y1.saturating_sub(y0),
        }
    }

    /// Fresh canvas with every cell painted
    pub fn render(&self, ctx: &RenderContext) -> RgbaImage {
        let layout = ctx.layout();
        let mut canvas = RgbaImage::from_pixel(
            layout.canvas_width,
            layout.canvas_height,
            to_rgba(self.config.background_color),
        );
        self.paint_full(ctx, &mut canvas);
        canvas
    }

    /// Repaint the whole grid, then the current highlight
    pub fn paint_full(&self, ctx: &RenderContext, canvas: &mut RgbaImage) -> Repaint {
        let quality = self.quality(ctx);
        debug!(
            "Full repaint: {}x{} cells into {}x{} canvas ({:?})",
            ctx.gene_count(),
            ctx.sample_count(),
            canvas.width(),
            canvas.height(),
            quality
        );
        for row in 0..ctx.gene_count() {
            for col in 0..ctx.sample_count() {
                self.paint_cell_with(ctx, canvas, CellCoord::new(row, col), quality);
            }
        }
        if let Some(cell) = ctx.highlight().filter(|c| ctx.contains(*c)) {
            self.draw_highlight(ctx, canvas, cell);
        }
        Repaint::full()
    }

    /// Blank canvas for the "no data" state
    pub fn paint_placeholder(&self, canvas: &mut RgbaImage) {
        let bg = to_rgba(self.config.background_color);
        for pixel in canvas.pixels_mut() {
            *pixel = bg;
        }
    }

    pub fn paint_cell(&self, ctx: &RenderContext, canvas: &mut RgbaImage, cell: CellCoord) {
        self.paint_cell_with(ctx, canvas, cell, self.quality(ctx));
    }

    fn paint_cell_with(
        &self,
        ctx: &RenderContext,
        canvas: &mut RgbaImage,
        cell: CellCoord,
        quality: RenderQuality,
    ) {
        let rect = Self::cell_rect(ctx.layout(), cell);
        let fill = ctx.cell_color(cell, self.config.placeholder_color);
        fill_rect(canvas, rect, to_rgba(fill));
        if quality == RenderQuality::Detailed && rect.width > 2 && rect.height > 2 {
            stroke_rect(canvas, rect, to_rgba(self.config.border_color));
        }
    }

    fn draw_highlight(&self, ctx: &RenderContext, canvas: &mut RgbaImage, cell: CellCoord) {
        let rect = Self::cell_rect(ctx.layout(), cell);
        stroke_rect(canvas, rect, to_rgba(self.config.highlight_color));
    }

    /// Move the highlight to `target`, repainting only what changed.
    ///
    /// An unchanged highlight paints nothing. Otherwise the previous cell is
    /// restored and the outline drawn on the new one. Targets outside the grid
    /// clear the highlight.
    pub fn update_highlight(
        &self,
        ctx: &mut RenderContext,
        canvas: &mut RgbaImage,
        target: Option<CellCoord>,
    ) -> Repaint {
        let target = target.filter(|c| ctx.contains(*c));
        if ctx.highlight() == target {
            return Repaint::default();
        }

        let previous = ctx.set_highlight(target);
        let mut repaint = Repaint::default();
        if let Some(prev) = previous.filter(|c| ctx.contains(*c)) {
            self.paint_cell(ctx, canvas, prev);
            repaint.cells.push(prev);
        }
        if let Some(cell) = target {
            self.paint_cell(ctx, canvas, cell);
            self.draw_highlight(ctx, canvas, cell);
            repaint.cells.push(cell);
        }
        trace!("Highlight {:?} -> {:?}", previous, target);
        repaint
    }

    /// Resolved color of a cell as it would be painted
    pub fn cell_color(&self, ctx: &RenderContext, cell: CellCoord) -> Color {
        ctx.cell_color(cell, self.config.placeholder_color)
    }
}

fn fill_rect(canvas: &mut RgbaImage, rect: PixelRect, color: Rgba<u8>) {
    let x1 = rect.right().min(canvas.width());
    let y1 = rect.bottom().min(canvas.height());
    for y in rect.y..y1 {
        for x in rect.x..x1 {
            canvas.put_pixel(x, y, color);
        }
    }
}

fn stroke_rect(canvas: &mut RgbaImage, rect: PixelRect, color: Rgba<u8>) {
    if rect.is_empty() {
        return;
    }
    let x1 = rect.right().min(canvas.width());
    let y1 = rect.bottom().min(canvas.height());
    if x1 <= rect.x || y1 <= rect.y {
        return;
    }
    for x in rect.x..x1 {
        canvas.put_pixel(x, rect.y, color);
        canvas.put_pixel(x, y1 - 1, color);
    }
    for y in rect.y..y1 {
        canvas.put_pixel(rect.x, y, color);
        canvas.put_pixel(x1 - 1, y, color);
    }
}
