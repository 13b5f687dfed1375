/*!
# Legends

The range slider is a vertical two-segment gradient track mapping
`+bound` to its top pixel and `-bound` to its bottom pixel. The top marker
lives in `[0, bound]`, the bottom marker in `[-bound, 0]`; each half keeps its
own gradient array and only rebuilds it when its own marker moves.

The categorical legend lists one group per annotation with a checkbox row per
observed value. All coordinates here are legend-local.
*/

use exprheat_core::{AnnotationPalette, Color, ColorScale, VisibilityState};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LegendConfig {
    #[serde(default = "default_track_height")]
    pub track_height: f64,

    #[serde(default = "default_track_width")]
    pub track_width: f64,

    /// Pointer distance within which a press grabs a marker
    #[serde(default = "default_grab_radius")]
    pub grab_radius: f64,

    /// Colors per gradient half
    #[serde(default = "default_gradient_steps")]
    pub gradient_steps: usize,

    #[serde(default = "default_label_max_chars")]
    pub label_max_chars: usize,

    /// Space between the slider track and the first categorical group
    #[serde(default = "default_categorical_gap")]
    pub categorical_gap: f64,

    #[serde(default = "default_group_title_height")]
    pub group_title_height: f64,

    #[serde(default = "default_row_height")]
    pub row_height: f64,

    #[serde(default = "default_group_gap")]
    pub group_gap: f64,

    #[serde(default = "default_swatch_size")]
    pub swatch_size: f64,

    #[serde(default = "default_width")]
    pub width: f64,
}

fn default_track_height() -> f64 { 200.0 }
fn default_track_width() -> f64 { 16.0 }
fn default_grab_radius() -> f64 { 6.0 }
fn default_gradient_steps() -> usize { 32 }
fn default_label_max_chars() -> usize { 18 }
fn default_categorical_gap() -> f64 { 40.0 }
fn default_group_title_height() -> f64 { 20.0 }
fn default_row_height() -> f64 { 18.0 }
fn default_group_gap() -> f64 { 10.0 }
fn default_swatch_size() -> f64 { 12.0 }
fn default_width() -> f64 { 160.0 }

impl Default for LegendConfig {
    fn default() -> Self {
        Self {
            track_height: default_track_height(),
            track_width: default_track_width(),
            grab_radius: default_grab_radius(),
            gradient_steps: default_gradient_steps(),
            label_max_chars: default_label_max_chars(),
            categorical_gap: default_categorical_gap(),
            group_title_height: default_group_title_height(),
            row_height: default_row_height(),
            group_gap: default_group_gap(),
            swatch_size: default_swatch_size(),
            width: default_width(),
        }
    }
}

impl LegendConfig {
    /// Legend-local y where the categorical groups start
    pub fn categorical_offset(&self) -> f64 {
        self.track_height + self.categorical_gap
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Marker {
    Top,
    Bottom,
}

/// Two-marker range slider over `[-bound, bound]`
#[derive(Debug, Clone)]
pub struct RangeSlider {
    scale: ColorScale,
    track_height: f64,
    grab_radius: f64,
    steps: usize,
    upper: Vec<Color>,
    lower: Vec<Color>,
    dragging: Option<Marker>,
}

impl RangeSlider {
    pub fn new(scale: ColorScale, config: &LegendConfig) -> Self {
        let steps = config.gradient_steps.max(2);
        Self {
            upper: scale.upper_gradient(steps),
            lower: scale.lower_gradient(steps),
            scale,
            track_height: config.track_height,
            grab_radius: config.grab_radius,
            steps,
            dragging: None,
        }
    }

    pub fn scale(&self) -> &ColorScale {
        &self.scale
    }

    pub fn bound(&self) -> f64 {
        self.scale.bound()
    }

    pub fn top(&self) -> f64 {
        self.scale.top()
    }

    pub fn bottom(&self) -> f64 {
        self.scale.bottom()
    }

    /// `(min, max)` as reported to the host
    pub fn range(&self) -> (f64, f64) {
        (self.scale.bottom(), self.scale.top())
    }

    pub fn value(&self, marker: Marker) -> f64 {
        match marker {
            Marker::Top => self.top(),
            Marker::Bottom => self.bottom(),
        }
    }

    pub fn upper_gradient(&self) -> &[Color] {
        &self.upper
    }

    pub fn lower_gradient(&self) -> &[Color] {
        &self.lower
    }

    pub fn track_height(&self) -> f64 {
        self.track_height
    }

    /// Track pixel for a value; a degenerate bound pins everything to the middle
    pub fn y_of(&self, value: f64) -> f64 {
        let bound = self.bound();
        if !(bound.is_finite() && bound > 0.0) {
            return self.track_height / 2.0;
        }
        let v = value.clamp(-bound, bound);
        (bound - v) / (2.0 * bound) * self.track_height
    }

    /// Value under a track pixel, clamped to `[-bound, bound]`
    pub fn value_at(&self, y: f64) -> f64 {
        let bound = self.bound();
        if !(bound.is_finite() && bound > 0.0) || self.track_height <= 0.0 {
            return 0.0;
        }
        let v = bound - (y / self.track_height) * 2.0 * bound;
        v.clamp(-bound, bound)
    }

    /// Marker within grab radius of `y`; the closer one wins, top on a tie
    pub fn marker_at(&self, y: f64) -> Option<Marker> {
        let dt = (self.y_of(self.top()) - y).abs();
        let db = (self.y_of(self.bottom()) - y).abs();
        match (dt <= self.grab_radius, db <= self.grab_radius) {
            (true, true) if db < dt => Some(Marker::Bottom),
            (true, _) => Some(Marker::Top),
            (false, true) => Some(Marker::Bottom),
            (false, false) => None,
        }
    }

    /// Returns true when the value changed
    pub fn set_top(&mut self, value: f64) -> bool {
        let next = self.scale.with_top(value);
        if next.top() == self.scale.top() {
            return false;
        }
        self.scale = next;
        self.upper = self.scale.upper_gradient(self.steps);
        true
    }

    /// Returns true when the value changed
    pub fn set_bottom(&mut self, value: f64) -> bool {
        let next = self.scale.with_bottom(value);
        if next.bottom() == self.scale.bottom() {
            return false;
        }
        self.scale = next;
        self.lower = self.scale.lower_gradient(self.steps);
        true
    }

    pub fn set(&mut self, marker: Marker, value: f64) -> bool {
        match marker {
            Marker::Top => self.set_top(value),
            Marker::Bottom => self.set_bottom(value),
        }
    }

    /// Pointer-down on the track. Grabbing a marker starts a drag; a press
    /// elsewhere jumps the marker on that side of zero to the pressed value.
    /// Returns the marker whose value changed, if any.
    pub fn press(&mut self, y: f64) -> Option<Marker> {
        if let Some(marker) = self.marker_at(y) {
            self.dragging = Some(marker);
            return None;
        }
        let value = self.value_at(y);
        let marker = if value >= 0.0 { Marker::Top } else { Marker::Bottom };
        self.set(marker, value).then_some(marker)
    }

    /// Move the dragged marker; values past zero clamp at zero
    pub fn drag_to(&mut self, y: f64) -> Option<Marker> {
        let marker = self.dragging?;
        let value = self.value_at(y);
        self.set(marker, value).then_some(marker)
    }

    pub fn release(&mut self) -> Option<Marker> {
        self.dragging.take()
    }

    pub fn dragging(&self) -> Option<Marker> {
        self.dragging
    }

    /// Text shown in a marker's numeric field
    pub fn text(&self, marker: Marker) -> String {
        format!("{:.2}", self.value(marker))
    }

    /// Commit typed text for a marker. The text is trimmed, parsed, clamped to
    /// the marker's half and rounded to 2 decimals. Anything unparsable leaves
    /// the last committed value in place and returns false.
    pub fn commit_text(&mut self, marker: Marker, text: &str) -> bool {
        let parsed = match text.trim().parse::<f64>() {
            Ok(v) if v.is_finite() => v,
            _ => return false,
        };
        let bound = self.bound();
        let clamped = match marker {
            Marker::Top => exprheat_core::clamp_top(parsed, bound),
            Marker::Bottom => exprheat_core::clamp_bottom(parsed, bound),
        };
        let rounded = (clamped * 100.0).round() / 100.0;
        self.set(marker, rounded)
    }
}

/// Truncate a label to `max_chars`, ending in `…` when shortened
pub fn truncate_label(label: &str, max_chars: usize) -> (String, bool) {
    if label.chars().count() <= max_chars {
        return (label.to_string(), false);
    }
    let keep = max_chars.saturating_sub(1);
    let mut out: String = label.chars().take(keep).collect();
    out.push('…');
    (out, true)
}

#[derive(Debug, Clone, PartialEq)]
pub struct LegendRow {
    pub annotation: String,
    pub value: String,
    /// Possibly truncated display text
    pub label: String,
    pub truncated: bool,
    pub color: Color,
    pub visible: bool,
    pub y: f64,
}

impl LegendRow {
    pub fn key(&self) -> String {
        VisibilityState::key(&self.annotation, &self.value)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LegendGroup {
    pub title: String,
    pub y: f64,
    pub rows: Vec<LegendRow>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CategoricalLegend {
    groups: Vec<LegendGroup>,
    width: f64,
    row_height: f64,
    height: f64,
}

impl CategoricalLegend {
    /// One group per palette group, in priority order, with rows in value order
    pub fn build(palette: &AnnotationPalette, visibility: &VisibilityState, config: &LegendConfig) -> Self {
        let mut y = 0.0;
        let mut groups = Vec::with_capacity(palette.groups().len());
        for group in palette.groups() {
            let name = &group.annotation.name;
            let group_y = y;
            y += config.group_title_height;
            let rows = group
                .entries
                .iter()
                .map(|(value, color)| {
                    let (label, truncated) = truncate_label(value, config.label_max_chars);
                    let row = LegendRow {
                        annotation: name.clone(),
                        value: value.clone(),
                        label,
                        truncated,
                        color: *color,
                        visible: visibility.is_visible(name, value),
                        y,
                    };
                    y += config.row_height;
                    row
                })
                .collect();
            groups.push(LegendGroup { title: name.clone(), y: group_y, rows });
            y += config.group_gap;
        }
        Self {
            groups,
            width: config.width,
            row_height: config.row_height,
            height: y,
        }
    }

    pub fn groups(&self) -> &[LegendGroup] {
        &self.groups
    }

    pub fn height(&self) -> f64 {
        self.height
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn rows(&self) -> impl Iterator<Item = &LegendRow> {
        self.groups.iter().flat_map(|g| g.rows.iter())
    }

    /// Row under a legend-local point
    pub fn row_at(&self, x: f64, y: f64) -> Option<&LegendRow> {
        if !(x >= 0.0 && x < self.width) {
            return None;
        }
        self.rows().find(|row| y >= row.y && y < row.y + self.row_height)
    }

    /// Full text for a truncated row under the pointer
    pub fn hover_label(&self, x: f64, y: f64) -> Option<&str> {
        self.row_at(x, y)
            .filter(|row| row.truncated)
            .map(|row| row.value.as_str())
    }
}
