/*!
# Chart Export

SVG and PNG output of the composed chart: annotation bars, gene labels, the
cell grid, the range slider and the categorical legend, with an optional
title and timestamp footer. The scene is rebuilt from a [`HeatmapView`], so
exports always match what the view currently shows.
*/

use crate::legend::{CategoricalLegend, Marker, RangeSlider};
use crate::raster::{CellRenderer, RenderQuality};
use crate::view::HeatmapView;
use crate::{to_rgba, RenderConfig};
use anyhow::{Context, Result};
use exprheat_core::{CellCoord, Color, LayoutConfig, RenderContext};
use image::{Rgba, RgbaImage};
use log::info;
use std::fmt::Write as _;
use std::path::Path;

/// Export configuration
#[derive(Debug, Clone)]
pub struct ExportConfig {
    pub title: Option<String>,
    pub show_legend: bool,
    /// Footer carries a timestamp; disable for byte-stable output
    pub show_footer: bool,
    pub font_family: String,
    pub font_size: u32,
    /// Free text written as `<!-- -->` lines at the top of SVG output
    pub provenance_comment: Option<String>,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            title: None,
            show_legend: true,
            show_footer: true,
            font_family: "Arial, sans-serif".to_string(),
            font_size: 12,
            provenance_comment: None,
        }
    }
}

const FOOTER_HEIGHT: f64 = 20.0;
const NO_DATA_TEXT: &str = "No data available";

pub struct ChartExporter {
    config: ExportConfig,
}

impl ChartExporter {
    pub fn new(config: ExportConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ExportConfig {
        &self.config
    }

    fn title_height(&self) -> f64 {
        match self.config.title {
            Some(_) => self.config.font_size as f64 + 14.0,
            None => 0.0,
        }
    }

    fn footer_height(&self) -> f64 {
        if self.config.show_footer { FOOTER_HEIGHT } else { 0.0 }
    }

    /// Overall output size in pixels
    pub fn dimensions(&self, view: &HeatmapView) -> (u32, u32) {
        let body = match view.context() {
            Some(ctx) => {
                let layout = ctx.layout();
                let legend_bottom = if self.config.show_legend {
                    layout.canvas_offset_y
                        + view.config().legend.categorical_offset()
                        + view.legend().height()
                } else {
                    0.0
                };
                (layout.chart_width, layout.chart_height.max(legend_bottom))
            }
            None => placeholder_size(view),
        };
        let width = body.0.ceil().max(1.0);
        let height = (body.1 + self.title_height() + self.footer_height()).ceil().max(1.0);
        (width as u32, height as u32)
    }

    /// Compose the SVG document
    pub fn render_svg(&self, view: &HeatmapView) -> String {
        let (width, height) = self.dimensions(view);
        let mut svg = SvgBuilder::new(&self.config, width as f64, height as f64);
        svg.add_background(view.config().render.background_color);

        if let Some(comment) = &self.config.provenance_comment {
            svg.add_comment(comment);
        }
        if let Some(title) = &self.config.title {
            svg.add_title(title);
        }

        let offset = self.title_height();
        match view.context() {
            Some(ctx) => {
                let render = &view.config().render;
                let layout_cfg = &view.config().layout;
                svg.open_group(offset);
                svg.add_annotation_bars(ctx, layout_cfg, render.placeholder_color);
                svg.add_gene_labels(ctx);
                svg.add_cells(ctx, render);
                if self.config.show_legend {
                    let legend_cfg = &view.config().legend;
                    let (lx, ly) = (ctx.layout().legend_x, ctx.layout().canvas_offset_y);
                    svg.add_range_legend(view.slider(), lx, ly, legend_cfg.track_width);
                    svg.add_categorical_legend(
                        view.legend(),
                        lx,
                        ly + legend_cfg.categorical_offset(),
                        legend_cfg.swatch_size,
                    );
                }
                svg.close_group();
            }
            None => svg.add_no_data(offset),
        }

        if self.config.show_footer {
            svg.add_footer(view);
        }
        svg.finish()
    }

    pub fn export_svg<P: AsRef<Path>>(&self, path: P, view: &HeatmapView) -> Result<()> {
        let path = path.as_ref();
        std::fs::write(path, self.render_svg(view))
            .with_context(|| format!("Failed to write SVG to {}", path.display()))?;
        info!("Exported SVG to {}", path.display());
        Ok(())
    }

    /// Rasterise the chart without text
    pub fn render_png(&self, view: &HeatmapView) -> RgbaImage {
        let (width, height) = self.dimensions(view);
        let render = &view.config().render;
        let mut img = RgbaImage::from_pixel(width, height, to_rgba(render.background_color));
        let Some(ctx) = view.context() else {
            return img;
        };

        let offset = self.title_height();
        let layout = ctx.layout();
        let layout_cfg = &view.config().layout;

        // Annotation side-bars above the canvas
        for (position, annotation) in ctx.annotations().iter().enumerate() {
            let y = offset + layout.annotation_bar_y(position, layout_cfg);
            for col in 0..ctx.sample_count() {
                let rect = CellRenderer::cell_rect(layout, CellCoord::new(0, col));
                let color = ctx
                    .sample_record(col)
                    .and_then(|s| ctx.palette().sample_color(&annotation.name, s))
                    .unwrap_or(render.placeholder_color);
                fill(
                    &mut img,
                    layout.margins.left + rect.x as f64,
                    y,
                    rect.width as f64,
                    layout_cfg.annotation_bar_height,
                    to_rgba(color),
                );
            }
        }

        image::imageops::replace(
            &mut img,
            view.canvas(),
            layout.margins.left.round() as i64,
            (offset + layout.canvas_offset_y).round() as i64,
        );

        if self.config.show_legend {
            let legend_cfg = &view.config().legend;
            let lx = layout.legend_x;
            let ly = offset + layout.canvas_offset_y;
            paint_gradient(&mut img, view.slider(), lx, ly, legend_cfg.track_width);
            for marker in [Marker::Top, Marker::Bottom] {
                let y = ly + view.slider().y_of(view.slider().value(marker));
                fill(&mut img, lx - 4.0, y - 1.0, legend_cfg.track_width + 8.0, 2.0, to_rgba(Color::BLACK));
            }
            let cy = ly + legend_cfg.categorical_offset();
            for row in view.legend().rows() {
                let alpha = if row.visible { 255 } else { 90 };
                let c = row.color;
                fill(
                    &mut img,
                    lx + 18.0,
                    cy + row.y + 3.0,
                    legend_cfg.swatch_size,
                    legend_cfg.swatch_size,
                    Rgba([c.r, c.g, c.b, alpha]),
                );
            }
        }
        img
    }

    pub fn export_png<P: AsRef<Path>>(&self, path: P, view: &HeatmapView) -> Result<()> {
        let path = path.as_ref();
        let img = self.render_png(view);
        img.save(path)
            .with_context(|| format!("Failed to write PNG to {}", path.display()))?;
        info!("Exported {}x{} PNG to {}", img.width(), img.height(), path.display());
        Ok(())
    }

    /// Pick the format from the file extension
    pub fn export<P: AsRef<Path>>(&self, path: P, view: &HeatmapView) -> Result<()> {
        let path = path.as_ref();
        match path.extension().and_then(|e| e.to_str()).map(str::to_ascii_lowercase).as_deref() {
            Some("svg") => self.export_svg(path, view),
            Some("png") => self.export_png(path, view),
            other => Err(anyhow::anyhow!(
                "Unsupported export format {:?} (expected .png or .svg)",
                other.unwrap_or("")
            )),
        }
    }
}

fn placeholder_size(view: &HeatmapView) -> (f64, f64) {
    match view.size() {
        Some(size) => (
            size.width,
            (size.viewport_height - view.config().layout.chrome_height).max(60.0),
        ),
        None => (400.0, 200.0),
    }
}

fn fill(img: &mut RgbaImage, x: f64, y: f64, w: f64, h: f64, color: Rgba<u8>) {
    let x0 = x.round().max(0.0) as u32;
    let y0 = y.round().max(0.0) as u32;
    let x1 = ((x + w).round().max(0.0) as u32).min(img.width());
    let y1 = ((y + h).round().max(0.0) as u32).min(img.height());
    for py in y0..y1 {
        for px in x0..x1 {
            img.put_pixel(px, py, color);
        }
    }
}

fn paint_gradient(img: &mut RgbaImage, slider: &RangeSlider, x: f64, y: f64, width: f64) {
    let half = slider.track_height() / 2.0;
    for (colors, top) in [(slider.upper_gradient(), y), (slider.lower_gradient(), y + half)] {
        let step = half / colors.len().max(1) as f64;
        for (i, color) in colors.iter().enumerate() {
            fill(img, x, top + i as f64 * step, width, step + 1.0, to_rgba(*color));
        }
    }
}

/// SVG builder for the composed chart
struct SvgBuilder {
    config: ExportConfig,
    elements: Vec<String>,
    width: f64,
    height: f64,
    top_comments: Vec<String>,
}

impl SvgBuilder {
    fn new(config: &ExportConfig, width: f64, height: f64) -> Self {
        Self {
            config: config.clone(),
            elements: Vec::new(),
            width,
            height,
            top_comments: Vec::new(),
        }
    }

    fn font_attrs(&self, size: u32) -> String {
        format!(r#"font-family="{}" font-size="{}px""#, self.config.font_family, size)
    }

    fn add_background(&mut self, color: Color) {
        self.elements.push(format!(
            r#"<rect width="{}" height="{}" fill="{}"/>"#,
            self.width, self.height, color
        ));
    }

    fn add_comment(&mut self, text: &str) {
        self.top_comments.push(text.to_string());
    }

    fn add_title(&mut self, title: &str) {
        let title_y = self.config.font_size as f64 + 6.0;
        self.elements.push(format!(
            r#"<text x="{}" y="{}" {} text-anchor="middle" font-weight="bold">{}</text>"#,
            self.width / 2.0,
            title_y,
            self.font_attrs(self.config.font_size + 4),
            escape_xml(title)
        ));
    }

    fn open_group(&mut self, offset: f64) {
        self.elements.push(format!(r#"<g transform="translate(0,{})">"#, offset));
    }

    fn close_group(&mut self) {
        self.elements.push("</g>".to_string());
    }

    fn add_annotation_bars(&mut self, ctx: &RenderContext, layout_cfg: &LayoutConfig, placeholder: Color) {
        let layout = ctx.layout();
        let left = layout.margins.left;
        for (position, annotation) in ctx.annotations().iter().enumerate() {
            let y = layout.annotation_bar_y(position, layout_cfg);
            let mut bar = format!(r#"<g class="annotation" data-name="{}">"#, escape_xml(&annotation.name));
            for col in 0..ctx.sample_count() {
                let color = ctx
                    .sample_record(col)
                    .and_then(|s| ctx.palette().sample_color(&annotation.name, s))
                    .unwrap_or(placeholder);
                let _ = write!(
                    bar,
                    r#"<rect x="{:.3}" y="{:.3}" width="{:.3}" height="{:.3}" fill="{}"/>"#,
                    left + col as f64 * layout.cell_width,
                    y,
                    layout.cell_width,
                    layout_cfg.annotation_bar_height,
                    color
                );
            }
            bar.push_str("</g>");
            self.elements.push(bar);
            self.elements.push(format!(
                r#"<text x="{:.3}" y="{:.3}" {} text-anchor="end" dominant-baseline="middle">{}</text>"#,
                left - 4.0,
                y + layout_cfg.annotation_bar_height / 2.0,
                self.font_attrs(self.config.font_size.saturating_sub(2)),
                escape_xml(&annotation.name)
            ));
        }
    }

    fn add_gene_labels(&mut self, ctx: &RenderContext) {
        let layout = ctx.layout();
        if !layout.show_gene_labels {
            return;
        }
        for row in 0..ctx.gene_count() {
            let Some(gene) = ctx.gene(row) else { continue };
            self.elements.push(format!(
                r#"<text x="{:.3}" y="{:.3}" {} text-anchor="end" dominant-baseline="middle">{}</text>"#,
                layout.margins.left - 4.0,
                layout.canvas_offset_y + (row as f64 + 0.5) * layout.cell_height,
                self.font_attrs(self.config.font_size.saturating_sub(2)),
                escape_xml(gene.label())
            ));
        }
    }

    fn add_cells(&mut self, ctx: &RenderContext, render: &RenderConfig) {
        let layout = ctx.layout();
        let (left, top) = (layout.margins.left, layout.canvas_offset_y);
        let quality = RenderQuality::for_gene_count(ctx.gene_count(), render.gene_threshold);

        let mut group = match quality {
            RenderQuality::Crisp => r#"<g class="cells" shape-rendering="crispEdges">"#.to_string(),
            RenderQuality::Detailed => format!(
                r#"<g class="cells" stroke="{}" stroke-width="1">"#,
                render.border_color
            ),
        };
        for row in 0..ctx.gene_count() {
            for col in 0..ctx.sample_count() {
                let cell = CellCoord::new(row, col);
                let fill = ctx.cell_color(cell, render.placeholder_color);
                match quality {
                    RenderQuality::Crisp => {
                        let r = CellRenderer::cell_rect(layout, cell);
                        let _ = write!(
                            group,
                            r#"<rect x="{}" y="{}" width="{}" height="{}" fill="{}"/>"#,
                            left + r.x as f64,
                            top + r.y as f64,
                            r.width,
                            r.height,
                            fill
                        );
                    }
                    RenderQuality::Detailed => {
                        let _ = write!(
                            group,
                            r#"<rect x="{:.3}" y="{:.3}" width="{:.3}" height="{:.3}" fill="{}"/>"#,
                            left + col as f64 * layout.cell_width,
                            top + row as f64 * layout.cell_height,
                            layout.cell_width,
                            layout.cell_height,
                            fill
                        );
                    }
                }
            }
        }
        group.push_str("</g>");
        self.elements.push(group);

        if let Some(cell) = ctx.highlight().filter(|c| ctx.contains(*c)) {
            self.elements.push(format!(
                r#"<rect x="{:.3}" y="{:.3}" width="{:.3}" height="{:.3}" fill="none" stroke="{}" stroke-width="2"/>"#,
                left + cell.sample_column as f64 * layout.cell_width,
                top + cell.gene_row as f64 * layout.cell_height,
                layout.cell_width,
                layout.cell_height,
                render.highlight_color
            ));
        }
    }

    fn add_range_legend(&mut self, slider: &RangeSlider, x: f64, y: f64, track_width: f64) {
        let half = slider.track_height() / 2.0;
        for (colors, top) in [(slider.upper_gradient(), y), (slider.lower_gradient(), y + half)] {
            let step = half / colors.len().max(1) as f64;
            for (i, color) in colors.iter().enumerate() {
                self.elements.push(format!(
                    r#"<rect x="{:.3}" y="{:.3}" width="{:.3}" height="{:.3}" fill="{}"/>"#,
                    x,
                    top + i as f64 * step,
                    track_width,
                    step,
                    color
                ));
            }
        }
        self.elements.push(format!(
            r#"<rect x="{:.3}" y="{:.3}" width="{:.3}" height="{:.3}" fill="none" stroke="black" stroke-width="1"/>"#,
            x, y, track_width, slider.track_height()
        ));

        let label_x = x + track_width + 6.0;
        let small = self.font_attrs(self.config.font_size.saturating_sub(2));
        for (value, label_y) in [(slider.bound(), y), (-slider.bound(), y + slider.track_height())] {
            self.elements.push(format!(
                r##"<text x="{:.3}" y="{:.3}" {} fill="#555" dominant-baseline="middle">{:.2}</text>"##,
                label_x + 40.0, label_y, small, value
            ));
        }
        for marker in [Marker::Top, Marker::Bottom] {
            let my = y + slider.y_of(slider.value(marker));
            self.elements.push(format!(
                r#"<line x1="{:.3}" y1="{:.3}" x2="{:.3}" y2="{:.3}" stroke="black" stroke-width="2"/>"#,
                x - 4.0, my, x + track_width + 4.0, my
            ));
            self.elements.push(format!(
                r#"<text x="{:.3}" y="{:.3}" {} dominant-baseline="middle">{}</text>"#,
                label_x, my, small, slider.text(marker)
            ));
        }
    }

    fn add_categorical_legend(&mut self, legend: &CategoricalLegend, x: f64, y: f64, swatch: f64) {
        let title_font = self.font_attrs(self.config.font_size);
        let row_font = self.font_attrs(self.config.font_size.saturating_sub(1));
        for group in legend.groups() {
            self.elements.push(format!(
                r#"<text x="{:.3}" y="{:.3}" {} font-weight="bold" dominant-baseline="hanging">{}</text>"#,
                x, y + group.y, title_font, escape_xml(&group.title)
            ));
            for row in &group.rows {
                let ry = y + row.y;
                let opacity = if row.visible { "1" } else { "0.4" };
                let mut entry = format!(r#"<g opacity="{}">"#, opacity);
                let _ = write!(
                    entry,
                    r#"<rect x="{:.3}" y="{:.3}" width="{:.3}" height="{:.3}" fill="{}" stroke="black" stroke-width="1"/>"#,
                    x, ry + 3.0, swatch, swatch,
                    if row.visible { "#333333" } else { "#ffffff" }
                );
                let _ = write!(
                    entry,
                    r#"<rect x="{:.3}" y="{:.3}" width="{:.3}" height="{:.3}" fill="{}"/>"#,
                    x + swatch + 6.0, ry + 3.0, swatch, swatch, row.color
                );
                let _ = write!(
                    entry,
                    r#"<text x="{:.3}" y="{:.3}" {} dominant-baseline="middle">{}"#,
                    x + 2.0 * swatch + 12.0,
                    ry + 3.0 + swatch / 2.0,
                    row_font,
                    escape_xml(&row.label)
                );
                if row.truncated {
                    let _ = write!(entry, "<title>{}</title>", escape_xml(&row.value));
                }
                entry.push_str("</text></g>");
                self.elements.push(entry);
            }
        }
    }

    fn add_no_data(&mut self, offset: f64) {
        let body_height = self.height - offset - if self.config.show_footer { FOOTER_HEIGHT } else { 0.0 };
        self.elements.push(format!(
            r##"<text x="{:.3}" y="{:.3}" {} fill="#666" text-anchor="middle" dominant-baseline="middle">{}</text>"##,
            self.width / 2.0,
            offset + body_height / 2.0,
            self.font_attrs(self.config.font_size + 2),
            NO_DATA_TEXT
        ));
    }

    fn add_footer(&mut self, view: &HeatmapView) {
        let (genes, samples) = view
            .context()
            .map(|ctx| (ctx.gene_count(), ctx.sample_count()))
            .unwrap_or((0, 0));
        let (min, max) = view.slider().range();
        let footer_text = format!(
            "ExprHeat v{} | {} genes x {} samples | Range: [{:.2}, {:.2}] | Generated: {}",
            env!("CARGO_PKG_VERSION"),
            genes,
            samples,
            min,
            max,
            chrono::Utc::now().format("%Y-%m-%d %H:%M:%S UTC")
        );
        self.elements.push(format!(
            r#"<text x="10" y="{:.3}" {} fill="gray">{}</text>"#,
            self.height - 6.0,
            self.font_attrs(self.config.font_size.saturating_sub(2)),
            footer_text
        ));
    }

    fn finish(&self) -> String {
        let mut out = String::new();
        out.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
        let _ = writeln!(
            out,
            r#"<svg width="{}" height="{}" viewBox="0 0 {} {}" xmlns="http://www.w3.org/2000/svg">"#,
            self.width, self.height, self.width, self.height
        );
        for c in &self.top_comments {
            for line in c.lines() {
                let _ = writeln!(out, "  <!-- {} -->", escape_comment(line));
            }
        }
        for element in &self.elements {
            let _ = writeln!(out, "  {}", element);
        }
        out.push_str("</svg>\n");
        out
    }
}

/// Break up every `--` run, which may not appear inside an XML comment
fn escape_comment(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut previous = None;
    for ch in text.chars() {
        if ch == '-' && previous == Some('-') {
            out.push(' ');
        }
        out.push(ch);
        previous = Some(ch);
    }
    out
}

pub fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c => out.push(c),
        }
    }
    out
}
