use thiserror::Error;

/// Errors raised by the heatmap pipeline
#[derive(Debug, Error)]
pub enum HeatmapError {
    #[error("Invalid color '{0}': expected #rrggbb or #rgb")]
    InvalidColor(String),

    #[error("Layout skipped: {0}")]
    Layout(#[from] LayoutError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Reasons a layout pass is skipped
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum LayoutError {
    #[error("no data to display ({genes} genes, {samples} samples)")]
    NoData { genes: usize, samples: usize },

    #[error("non-positive drawable area {width:.1}x{height:.1}")]
    NonPositive { width: f64, height: f64 },
}

pub type Result<T> = std::result::Result<T, HeatmapError>;
