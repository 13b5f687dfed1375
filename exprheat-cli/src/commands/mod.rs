//! Command implementations for the ExprHeat CLI

pub mod hover;
pub mod render;

use anyhow::{Context, Result};
use exprheat_core::{ContainerSize, GeneExpressionData, Setting};
use exprheat_render::{HeatmapView, ViewStatus};
use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::error::{CliError, CliResult};

/// Inputs shared by every command that lays out a chart
#[derive(Debug, Clone, Default)]
pub struct ViewArgs {
    pub data: PathBuf,
    pub setting: Option<PathBuf>,
    pub width: Option<f64>,
    pub height: Option<f64>,
    pub hide: Vec<String>,
    pub min: Option<f64>,
    pub max: Option<f64>,
}

fn read_input(path: &Path) -> Result<String> {
    if !path.exists() {
        return Err(CliError::file_not_found(path.to_path_buf()).into());
    }
    std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))
}

pub fn load_data(path: &Path) -> Result<GeneExpressionData> {
    let content = read_input(path)?;
    let data = GeneExpressionData::from_json_str(&content)
        .map_err(|e| CliError::parse(path.display().to_string(), e.to_string()))?;
    log::info!(
        "Loaded {} genes x {} samples from {}",
        data.genes.len(),
        data.samples.len(),
        path.display()
    );
    Ok(data)
}

pub fn load_setting(path: Option<&Path>) -> Result<Setting> {
    let Some(path) = path else {
        return Ok(Setting::default());
    };
    let content = read_input(path)?;
    let setting = Setting::from_json_str(&content)
        .map_err(|e| CliError::parse(path.display().to_string(), e.to_string()))?;
    Ok(setting)
}

/// Check a `<Annotation>:<value>` visibility key
pub fn validate_hide_key(key: &str) -> CliResult<()> {
    match key.split_once(':') {
        Some((annotation, _)) if !annotation.is_empty() => Ok(()),
        _ => Err(CliError::validation(format!(
            "Invalid visibility key '{}': expected <Annotation>:<value>",
            key
        ))),
    }
}

/// Load inputs, apply overrides and lay the view out at the requested size
pub fn build_view(config: &Config, args: &ViewArgs) -> Result<HeatmapView> {
    let data = load_data(&args.data)?;
    let mut setting = load_setting(args.setting.as_deref())?;
    if args.min.is_some() {
        setting.min_value = args.min;
    }
    if args.max.is_some() {
        setting.max_value = args.max;
    }

    let mut view = HeatmapView::new(data, setting, config.view_config());
    for key in &args.hide {
        validate_hide_key(key)?;
        view.set_visibility(key, false);
    }

    let width = args.width.unwrap_or(config.viewport.width);
    let height = args.height.unwrap_or(config.viewport.height);
    match view.resize(ContainerSize::new(width, width, height)) {
        ViewStatus::Pending => Err(CliError::validation(format!(
            "Viewport {}x{} leaves no drawable area",
            width, height
        ))
        .into()),
        ViewStatus::NoData { genes, samples } => {
            log::warn!("No data to display ({} genes, {} samples)", genes, samples);
            Ok(view)
        }
        ViewStatus::Ready => Ok(view),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hide_key_validation() {
        assert!(validate_hide_key("Sex:Male").is_ok());
        assert!(validate_hide_key("Batch:").is_ok());
        assert!(matches!(validate_hide_key("Male"), Err(CliError::Validation { .. })));
        assert!(matches!(validate_hide_key(":Male"), Err(CliError::Validation { .. })));
    }

    #[test]
    fn test_missing_input_is_file_not_found() {
        let err = load_data(Path::new("/nonexistent/exprheat/data.json")).unwrap_err();
        assert!(matches!(err.downcast_ref::<CliError>(), Some(CliError::FileNotFound { .. })));
    }

    #[test]
    fn test_no_setting_file_uses_defaults() -> Result<()> {
        assert_eq!(load_setting(None)?, Setting::default());
        Ok(())
    }
}
