/*!
# Interactive Heatmap View

Event-driven owner of the data, the setting, the visibility state and the
derived [`RenderContext`]. Everything runs synchronously on the caller's
thread; time is passed in with each event so the range-change debouncer is
deterministic.

State machine: `Idle` ⇄ `DraggingSlider` (scale rebuilt and canvas
repainted per move) and `Idle` ⇄ `Hovering` (hit-test, highlight, tooltip).
*/

use crate::debounce::{Debouncer, RANGE_DEBOUNCE};
use crate::hittest::{hit_test, Tooltip, TooltipConfig};
use crate::legend::{CategoricalLegend, LegendConfig, Marker, RangeSlider};
use crate::raster::{CellRenderer, Repaint};
use crate::RenderConfig;
use exprheat_core::{
    build_context, data_scale_bound, filter_data, CellCoord, ColorScale, ContainerSize,
    GeneExpressionData, LayoutConfig, LayoutError, RenderContext, Setting, VisibilityState,
};
use image::RgbaImage;
use log::{debug, info, trace};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;

/// Tunables for every layer of the view
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ViewConfig {
    #[serde(default)]
    pub layout: LayoutConfig,
    #[serde(default)]
    pub render: RenderConfig,
    #[serde(default)]
    pub legend: LegendConfig,
    #[serde(default)]
    pub tooltip: TooltipConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InteractionState {
    Idle,
    DraggingSlider(Marker),
    Hovering(CellCoord),
}

/// Surface a pointer event was delivered to; coordinates are local to it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerTarget {
    Canvas,
    SliderTrack,
    Legend,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerEvent {
    Down { target: PointerTarget, x: f64, y: f64 },
    Move { target: PointerTarget, x: f64, y: f64 },
    Up,
    Leave { target: PointerTarget },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ViewStatus {
    /// No positive container size observed yet, or the current inputs
    /// leave no drawable area; the next positive resize lays out again
    Pending,
    /// Nothing to draw after filtering and visibility
    NoData { genes: usize, samples: usize },
    Ready,
}

type RangeCallback = Box<dyn FnMut(f64, f64)>;

pub struct HeatmapView {
    config: ViewConfig,
    data: Arc<GeneExpressionData>,
    setting: Setting,
    visibility: VisibilityState,
    size: Option<ContainerSize>,
    context: Option<RenderContext>,
    status: ViewStatus,
    renderer: CellRenderer,
    canvas: RgbaImage,
    slider: RangeSlider,
    legend: CategoricalLegend,
    tooltip: Option<Tooltip>,
    state: InteractionState,
    debouncer: Debouncer<(f64, f64)>,
    on_range_change: Option<RangeCallback>,
    last_repaint: Repaint,
}

impl HeatmapView {
    pub fn new(data: GeneExpressionData, setting: Setting, config: ViewConfig) -> Self {
        let data = Arc::new(data);
        let scale = ColorScale::from_setting(&setting, data_scale_bound(&data));
        let slider = RangeSlider::new(scale, &config.legend);
        let renderer = CellRenderer::new(config.render.clone());
        let mut view = Self {
            config,
            data,
            setting,
            visibility: VisibilityState::new(),
            size: None,
            context: None,
            status: ViewStatus::Pending,
            renderer,
            canvas: RgbaImage::new(0, 0),
            slider,
            legend: CategoricalLegend::default(),
            tooltip: None,
            state: InteractionState::Idle,
            debouncer: Debouncer::new(RANGE_DEBOUNCE),
            on_range_change: None,
            last_repaint: Repaint::default(),
        };
        view.rebuild_legend();
        view
    }

    /// Host callback for debounced `(min, max)` range changes
    pub fn set_range_callback<F>(&mut self, callback: F)
    where
        F: FnMut(f64, f64) + 'static,
    {
        self.on_range_change = Some(Box::new(callback));
    }

    /// Resize notification. A size leaving no drawable area is ignored and
    /// the previous state kept.
    pub fn resize(&mut self, size: ContainerSize) -> ViewStatus {
        if !size.is_positive() {
            debug!("Ignoring non-positive resize {:?}", size);
            return self.status;
        }
        let previous = self.size.replace(size);
        if let Err(LayoutError::NonPositive { width, height }) = self.rebuild() {
            debug!("Resize leaves {:.0}x{:.0} drawable area, keeping previous layout", width, height);
            self.size = previous;
        }
        self.status
    }

    pub fn set_setting(&mut self, setting: Setting) {
        self.setting = setting;
        self.reset_scale();
        self.rebuild_all();
    }

    pub fn set_data(&mut self, data: GeneExpressionData) {
        self.data = Arc::new(data);
        self.reset_scale();
        self.rebuild_all();
    }

    pub fn set_visibility(&mut self, key: &str, visible: bool) {
        self.visibility.set(key, visible);
        self.rebuild_all();
    }

    /// Flip one visibility entry and re-run the pipeline; returns the new visibility
    pub fn toggle_visibility(&mut self, key: &str) -> bool {
        let visible = self.visibility.toggle(key);
        debug!("Visibility {} -> {}", key, visible);
        self.rebuild_all();
        visible
    }

    /// Click at legend-local coordinates; toggles the row under it, if any
    pub fn click_legend(&mut self, x: f64, y: f64) -> Option<bool> {
        let key = self.legend.row_at(x, y)?.key();
        Some(self.toggle_visibility(&key))
    }

    pub fn handle_pointer(&mut self, event: PointerEvent, now: Instant) -> Repaint {
        let repaint = match (event, self.state) {
            (PointerEvent::Leave { target: PointerTarget::Canvas }, _) => self.clear_hover(),
            (PointerEvent::Down { target: PointerTarget::SliderTrack, y, .. }, _) => {
                self.clear_hover();
                let changed = self.slider.press(y);
                if let Some(marker) = self.slider.dragging() {
                    self.state = InteractionState::DraggingSlider(marker);
                }
                match changed {
                    Some(_) => self.apply_scale(now),
                    None => Repaint::default(),
                }
            }
            (PointerEvent::Move { target: PointerTarget::SliderTrack, y, .. }, InteractionState::DraggingSlider(_)) => {
                match self.slider.drag_to(y) {
                    Some(_) => self.apply_scale(now),
                    None => Repaint::default(),
                }
            }
            (_, InteractionState::DraggingSlider(_)) if matches!(event, PointerEvent::Up) => {
                self.slider.release();
                self.state = InteractionState::Idle;
                Repaint::default()
            }
            // Other surfaces are inert while a marker is held
            (_, InteractionState::DraggingSlider(_)) => Repaint::default(),
            (PointerEvent::Down { target: PointerTarget::Canvas, x, y }, _)
            | (PointerEvent::Move { target: PointerTarget::Canvas, x, y }, _) => self.hover(x, y),
            (PointerEvent::Down { target: PointerTarget::Legend, x, y }, _) => {
                match self.click_legend(x, y) {
                    Some(_) => Repaint::full(),
                    None => Repaint::default(),
                }
            }
            _ => Repaint::default(),
        };
        if !repaint.is_empty() {
            self.last_repaint = repaint.clone();
        }
        repaint
    }

    /// Commit typed text for a marker field; false when the text was rejected
    pub fn commit_text(&mut self, marker: Marker, text: &str, now: Instant) -> bool {
        if !self.slider.commit_text(marker, text) {
            return false;
        }
        self.apply_scale(now);
        true
    }

    /// Deliver a due range change to the host
    pub fn poll(&mut self, now: Instant) -> Option<(f64, f64)> {
        let (min, max) = self.debouncer.poll(now)?;
        info!("Range changed to [{:.2}, {:.2}]", min, max);
        if let Some(callback) = self.on_range_change.as_mut() {
            callback(min, max);
        }
        Some((min, max))
    }

    pub fn has_pending_range_change(&self) -> bool {
        self.debouncer.is_pending()
    }

    pub fn status(&self) -> ViewStatus {
        self.status
    }

    pub fn state(&self) -> InteractionState {
        self.state
    }

    pub fn context(&self) -> Option<&RenderContext> {
        self.context.as_ref()
    }

    pub fn canvas(&self) -> &RgbaImage {
        &self.canvas
    }

    pub fn slider(&self) -> &RangeSlider {
        &self.slider
    }

    pub fn legend(&self) -> &CategoricalLegend {
        &self.legend
    }

    pub fn tooltip(&self) -> Option<&Tooltip> {
        self.tooltip.as_ref()
    }

    pub fn visibility(&self) -> &VisibilityState {
        &self.visibility
    }

    pub fn setting(&self) -> &Setting {
        &self.setting
    }

    pub fn data(&self) -> &GeneExpressionData {
        &self.data
    }

    pub fn size(&self) -> Option<ContainerSize> {
        self.size
    }

    pub fn config(&self) -> &ViewConfig {
        &self.config
    }

    pub fn last_repaint(&self) -> &Repaint {
        &self.last_repaint
    }

    /// New slider from the setting and the data bound. A range change still
    /// waiting on the debouncer is delivered first so the host never loses it.
    fn reset_scale(&mut self) {
        if let Some((min, max)) = self.debouncer.flush() {
            info!("Range changed to [{:.2}, {:.2}]", min, max);
            if let Some(callback) = self.on_range_change.as_mut() {
                callback(min, max);
            }
        }
        let scale = ColorScale::from_setting(&self.setting, data_scale_bound(&self.data));
        self.slider = RangeSlider::new(scale, &self.config.legend);
        if matches!(self.state, InteractionState::DraggingSlider(_)) {
            self.state = InteractionState::Idle;
        }
    }

    fn rebuild_all(&mut self) {
        self.rebuild_legend();
        if let Err(LayoutError::NonPositive { width, height }) = self.rebuild() {
            // The old frame no longer matches the setting, legend or slider
            debug!("Layout skipped at {:.0}x{:.0} drawable area", width, height);
            self.context = None;
            self.canvas = RgbaImage::new(0, 0);
            self.status = ViewStatus::Pending;
            self.tooltip = None;
            if matches!(self.state, InteractionState::Hovering(_)) {
                self.state = InteractionState::Idle;
            }
            self.last_repaint = Repaint::full();
        }
    }

    fn rebuild_legend(&mut self) {
        let palette = filter_data(&self.data, &self.setting).palette();
        self.legend = CategoricalLegend::build(&palette, &self.visibility, &self.config.legend);
    }

    /// Filter → sort → layout → full repaint
    fn rebuild(&mut self) -> Result<(), LayoutError> {
        let Some(size) = self.size else {
            return Ok(());
        };
        let result = build_context(
            &self.data,
            &self.setting,
            &self.visibility,
            *self.slider.scale(),
            size,
            &self.config.layout,
        );
        match result {
            Ok(ctx) => {
                let layout = ctx.layout();
                self.canvas = RgbaImage::new(layout.canvas_width, layout.canvas_height);
                self.last_repaint = self.renderer.paint_full(&ctx, &mut self.canvas);
                self.context = Some(ctx);
                self.status = ViewStatus::Ready;
                self.tooltip = None;
                if matches!(self.state, InteractionState::Hovering(_)) {
                    self.state = InteractionState::Idle;
                }
                Ok(())
            }
            Err(LayoutError::NoData { genes, samples }) => {
                debug!("No data to display ({} genes, {} samples)", genes, samples);
                self.context = None;
                self.renderer.paint_placeholder(&mut self.canvas);
                self.status = ViewStatus::NoData { genes, samples };
                self.tooltip = None;
                self.state = InteractionState::Idle;
                self.last_repaint = Repaint::full();
                Ok(())
            }
            Err(err @ LayoutError::NonPositive { .. }) => Err(err),
        }
    }

    /// Swap in the slider's scale and repaint; the frame is reused
    fn apply_scale(&mut self, now: Instant) -> Repaint {
        let scale = *self.slider.scale();
        self.debouncer.push(self.slider.range(), now);
        let Some(ctx) = self.context.as_ref() else {
            return Repaint::default();
        };
        let ctx = ctx.with_color_scale(scale);
        let repaint = self.renderer.paint_full(&ctx, &mut self.canvas);
        self.context = Some(ctx);
        repaint
    }

    fn hover(&mut self, x: f64, y: f64) -> Repaint {
        let Some(ctx) = self.context.as_mut() else {
            return Repaint::default();
        };
        let Some(cell) = hit_test(ctx.layout(), x, y) else {
            return self.clear_hover();
        };
        let repaint = self.renderer.update_highlight(ctx, &mut self.canvas, Some(cell));

        let pointer = ctx.layout().canvas_to_chart(x, y);
        let viewport = self
            .size
            .map(|s| (s.viewport_width, s.viewport_height))
            .unwrap_or((ctx.layout().chart_width, ctx.layout().chart_height));
        self.tooltip = Tooltip::build(ctx, cell, pointer, viewport, &self.config.tooltip);
        self.state = InteractionState::Hovering(cell);
        trace!("Hover ({:.1}, {:.1}) -> {:?}", x, y, cell);
        repaint
    }

    fn clear_hover(&mut self) -> Repaint {
        self.tooltip = None;
        if matches!(self.state, InteractionState::Hovering(_)) {
            self.state = InteractionState::Idle;
        }
        match self.context.as_mut() {
            Some(ctx) => self.renderer.update_highlight(ctx, &mut self.canvas, None),
            None => Repaint::default(),
        }
    }
}
