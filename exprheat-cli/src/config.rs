//! Configuration handling for the ExprHeat CLI
//!
//! Supports loading configuration from exprheat.toml files with CLI argument overrides.

use crate::error::CliError;
use anyhow::{Context, Result};
use exprheat_core::LayoutConfig;
use exprheat_render::{ExportConfig, LegendConfig, RenderConfig, TooltipConfig, ViewConfig};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const DEFAULT_CONFIG_FILE: &str = "exprheat.toml";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub viewport: ViewportConfig,
    #[serde(default)]
    pub layout: LayoutConfig,
    #[serde(default)]
    pub render: RenderConfig,
    #[serde(default)]
    pub legend: LegendConfig,
    #[serde(default)]
    pub tooltip: TooltipConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Chart title printed above exports
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    /// Footer with data summary and generation time
    #[serde(default = "default_true")]
    pub show_footer: bool,

    /// Include the range slider and categorical legend in exports
    #[serde(default = "default_true")]
    pub show_legend: bool,

    #[serde(default = "default_font_family")]
    pub font_family: String,

    #[serde(default = "default_font_size")]
    pub font_size: u32,
}

/// Container size the chart is laid out into, in CSS pixels
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewportConfig {
    #[serde(default = "default_width")]
    pub width: f64,

    #[serde(default = "default_height")]
    pub height: f64,
}

fn default_true() -> bool { true }
fn default_font_family() -> String { "Arial, sans-serif".to_string() }
fn default_font_size() -> u32 { 12 }
fn default_width() -> f64 { 1200.0 }
fn default_height() -> f64 { 900.0 }

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            title: None,
            show_footer: true,
            show_legend: true,
            font_family: default_font_family(),
            font_size: default_font_size(),
        }
    }
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self {
            width: default_width(),
            height: default_height(),
        }
    }
}

impl Config {
    /// Load configuration from file or use defaults
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        let config = match config_path {
            Some(path) => {
                log::info!("Loading configuration from: {}", path.display());
                Self::load_from_file(path)?
            }
            None => {
                let default_path = PathBuf::from(DEFAULT_CONFIG_FILE);
                if default_path.exists() {
                    log::info!("Loading configuration from: {}", DEFAULT_CONFIG_FILE);
                    Self::load_from_file(&default_path)?
                } else {
                    log::debug!("Using default configuration");
                    Self::default()
                }
            }
        };

        Ok(config)
    }

    /// Load configuration from a specific TOML file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read configuration file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .map_err(CliError::from)
            .with_context(|| format!("Failed to parse configuration file: {}", path.display()))?;

        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .context("Failed to serialize configuration")?;

        std::fs::write(path, content)
            .with_context(|| format!("Failed to write configuration file: {}", path.display()))?;

        Ok(())
    }

    /// Example configuration file content
    pub fn example_toml() -> Result<String> {
        toml::to_string_pretty(&Self::default())
            .context("Failed to serialize default configuration")
    }

    pub fn view_config(&self) -> ViewConfig {
        ViewConfig {
            layout: self.layout.clone(),
            render: self.render.clone(),
            legend: self.legend.clone(),
            tooltip: self.tooltip.clone(),
        }
    }

    /// Export options; a command-line title wins over the configured one
    pub fn export_config(&self, title: Option<String>, show_footer: bool) -> ExportConfig {
        ExportConfig {
            title: title.or_else(|| self.general.title.clone()),
            show_legend: self.general.show_legend,
            show_footer: show_footer && self.general.show_footer,
            font_family: self.general.font_family.clone(),
            font_size: self.general.font_size,
            provenance_comment: None,
        }
    }
}
