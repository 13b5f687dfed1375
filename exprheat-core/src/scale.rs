//! Diverging color scale with user-adjustable boundaries.
//!
//! Values above `top` are painted solid high, values below `bottom` solid low,
//! and the two bands in between interpolate toward the center color at zero.
//! Narrowing the band steepens the gradient without losing the outliers.

use crate::color::Color;
use crate::types::{GeneExpressionData, Setting};

/// Damping applied to the data extreme so a single outlier cannot flatten the gradient
pub const SCALE_DAMPING: f64 = 0.75;

/// `0.75 × min(|min|, |max|)` over the finite values; 0 for empty input
pub fn scale_bound<I>(values: I) -> f64
where
    I: IntoIterator<Item = f64>,
{
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    for v in values.into_iter().filter(|v| v.is_finite()) {
        min = min.min(v);
        max = max.max(v);
    }
    if min > max {
        return 0.0;
    }
    SCALE_DAMPING * min.abs().min(max.abs())
}

pub fn data_scale_bound(data: &GeneExpressionData) -> f64 {
    scale_bound(data.finite_values())
}

/// Clamp a top boundary into `[0, bound]`
pub fn clamp_top(value: f64, bound: f64) -> f64 {
    if !is_usable_bound(bound) || value.is_nan() {
        return 0.0;
    }
    value.clamp(0.0, bound)
}

/// Clamp a bottom boundary into `[-bound, 0]`
pub fn clamp_bottom(value: f64, bound: f64) -> f64 {
    if !is_usable_bound(bound) || value.is_nan() {
        return 0.0;
    }
    value.clamp(-bound, 0.0)
}

fn is_usable_bound(bound: f64) -> bool {
    bound.is_finite() && bound > 0.0
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorScale {
    top: f64,
    bottom: f64,
    bound: f64,
    high: Color,
    low: Color,
    center: Color,
}

impl ColorScale {
    /// Build a scale; boundaries are clamped into their legal half-ranges.
    /// `center` defaults to the midpoint of `high` and `low`.
    pub fn new(top: f64, bottom: f64, bound: f64, high: Color, low: Color, center: Option<Color>) -> Self {
        let center = center.unwrap_or_else(|| high.midpoint(low));
        Self {
            top: clamp_top(top, bound),
            bottom: clamp_bottom(bottom, bound),
            bound,
            high,
            low,
            center,
        }
    }

    /// Initial scale: setting boundaries when present, otherwise the full bound
    pub fn from_setting(setting: &Setting, bound: f64) -> Self {
        Self::new(
            setting.max_value.unwrap_or(bound),
            setting.min_value.unwrap_or(-bound),
            bound,
            setting.high_color,
            setting.low_color,
            setting.center_color,
        )
    }

    pub fn with_top(self, top: f64) -> Self {
        Self { top: clamp_top(top, self.bound), ..self }
    }

    pub fn with_bottom(self, bottom: f64) -> Self {
        Self { bottom: clamp_bottom(bottom, self.bound), ..self }
    }

    pub fn top(&self) -> f64 { self.top }
    pub fn bottom(&self) -> f64 { self.bottom }
    pub fn bound(&self) -> f64 { self.bound }
    pub fn high(&self) -> Color { self.high }
    pub fn low(&self) -> Color { self.low }
    pub fn center(&self) -> Color { self.center }

    /// Zero or NaN bound: every value maps to the center color
    pub fn is_degenerate(&self) -> bool {
        !is_usable_bound(self.bound)
    }

    pub fn color(&self, v: f64) -> Color {
        if self.is_degenerate() || v.is_nan() {
            return self.center;
        }
        if v >= 0.0 {
            self.upper_color(v)
        } else {
            self.lower_color(v)
        }
    }

    /// Color for `v >= 0`; depends on `top` only
    pub fn upper_color(&self, v: f64) -> Color {
        if self.is_degenerate() {
            return self.center;
        }
        if v > self.top {
            return self.high;
        }
        if self.top <= 0.0 {
            return self.center;
        }
        self.center.lerp(self.high, v.max(0.0) / self.top)
    }

    /// Color for `v < 0`; depends on `bottom` only
    pub fn lower_color(&self, v: f64) -> Color {
        if self.is_degenerate() {
            return self.center;
        }
        if v < self.bottom {
            return self.low;
        }
        if self.bottom >= 0.0 {
            return self.center;
        }
        self.low.lerp(self.center, (v.min(0.0) - self.bottom) / -self.bottom)
    }

    /// `steps` colors for the upper half of a legend track, from `+bound` down to 0
    pub fn upper_gradient(&self, steps: usize) -> Vec<Color> {
        track_positions(steps)
            .map(|t| self.upper_color(self.bound * (1.0 - t)))
            .collect()
    }

    /// `steps` colors for the lower half of a legend track, from 0 down to `-bound`
    pub fn lower_gradient(&self, steps: usize) -> Vec<Color> {
        track_positions(steps)
            .map(|t| {
                let v = -self.bound * t;
                if v < 0.0 { self.lower_color(v) } else { self.center }
            })
            .collect()
    }
}

fn track_positions(steps: usize) -> impl Iterator<Item = f64> {
    let denom = steps.saturating_sub(1).max(1) as f64;
    (0..steps).map(move |i| i as f64 / denom)
}
