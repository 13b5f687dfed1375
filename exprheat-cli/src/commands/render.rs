//! Render command implementation - export the composed chart to SVG or PNG

use anyhow::{Context, Result};
use exprheat_render::{ChartExporter, HeatmapView, ViewStatus};
use std::path::Path;

use super::{build_view, ViewArgs};
use crate::config::Config;
use crate::error::{CliError, CliResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Svg,
    Png,
}

/// Output format from the file extension
pub fn detect_format(path: &Path) -> CliResult<OutputFormat> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match ext.as_deref() {
        Some("svg") => Ok(OutputFormat::Svg),
        Some("png") => Ok(OutputFormat::Png),
        Some(other) => Err(CliError::invalid_format(format!(
            "Unsupported output extension '.{}' for {}",
            other,
            path.display()
        ))),
        None => Err(CliError::invalid_format(format!(
            "Output path {} has no extension",
            path.display()
        ))),
    }
}

/// Inputs and color range behind an export, embedded as an SVG comment
pub fn provenance(args: &ViewArgs, view: &HeatmapView) -> String {
    let setting = args
        .setting
        .as_ref()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "default".to_string());
    let (min, max) = view.slider().range();
    format!(
        "exprheat {}\ndata: {}\nsetting: {}\nrange: [{:.2}, {:.2}]",
        env!("CARGO_PKG_VERSION"),
        args.data.display(),
        setting,
        min,
        max
    )
}

pub fn execute(
    config: &Config,
    args: &ViewArgs,
    output: &Path,
    title: Option<String>,
    footer: bool,
    require_data: bool,
) -> Result<()> {
    log::info!("Starting heatmap rendering");
    log::info!("Output file: {}", output.display());

    let format = detect_format(output)?;
    log::debug!("Output format: {:?}", format);

    let view = build_view(config, args)?;
    if let ViewStatus::NoData { genes, samples } = view.status() {
        if require_data {
            return Err(CliError::no_data(format!(
                "{} genes and {} samples remain after filtering",
                genes, samples
            ))
            .into());
        }
    }

    let mut export_config = config.export_config(title, footer);
    export_config.provenance_comment = Some(provenance(args, &view));
    let exporter = ChartExporter::new(export_config);
    match format {
        OutputFormat::Svg => exporter.export_svg(output, &view),
        OutputFormat::Png => exporter.export_png(output, &view),
    }
    .with_context(|| format!("Failed to render {}", output.display()))?;

    if let Some(ctx) = view.context() {
        let scale = ctx.scale();
        log::info!(
            "Rendered {} genes x {} samples, range [{:.2}, {:.2}]",
            ctx.gene_count(),
            ctx.sample_count(),
            scale.bottom(),
            scale.top()
        );
    }
    Ok(())
}
