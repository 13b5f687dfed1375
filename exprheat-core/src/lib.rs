//! ExprHeat Core Library
//!
//! Data model, filter/sort stages, diverging color scale, layout and the
//! immutable render context for gene-expression heatmaps.

pub mod color;
pub mod error;
pub mod types;
pub mod filter;
pub mod sort;
pub mod scale;
pub mod layout;
pub mod palette;
pub mod pipeline;

// Re-export commonly used types and functions
pub use color::Color;
pub use error::{HeatmapError, LayoutError, Result};
pub use types::{
    Annotation, AnnotationKind, AnnotationRef, Gene, GeneExpressionData, ListFilter, Metadata,
    Sample, Setting,
};
pub use filter::{filter_genes, filter_samples, visible_samples, VisibilityState};
pub use sort::sort_samples;
pub use scale::{clamp_bottom, clamp_top, data_scale_bound, scale_bound, ColorScale};
pub use layout::{ContainerSize, Layout, LayoutConfig, Margins};
pub use palette::{observed_values, AnnotationPalette, PaletteGroup};
pub use pipeline::{
    build_context, filter_data, CellCoord, FilteredData, RenderContext, SampleIndex,
    VisibleSample,
};

/// Version information for the ExprHeat core library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
