use crate::grid::DType;
use crate::model::generic::DEFAULT_NBPML;
use crate::model::GridParams;
use crate::presets::PRESETS;
use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Model configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    pub preset: String,
    pub shape: Vec<usize>,
    pub spacing: Vec<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin: Option<Vec<f64>>, // Defaults to zeros
    #[serde(default = "default_nbpml")]
    pub nbpml: usize,
    #[serde(default = "default_space_order")]
    pub space_order: usize,
    #[serde(default)]
    pub dtype: DType,
}

fn default_nbpml() -> usize {
    DEFAULT_NBPML
}

fn default_space_order() -> usize {
    4
}

impl ModelConfig {
    fn validate(&self) -> Result<()> {
        if !PRESETS.contains(&self.preset.as_str()) {
            return Err(anyhow!(
                "Invalid preset '{}'. Must be one of: {:?}",
                self.preset,
                PRESETS
            ));
        }
        if self.shape.is_empty() || self.shape.len() > 3 {
            return Err(anyhow!(
                "shape must have 1 to 3 entries, got {}",
                self.shape.len()
            ));
        }
        if self.spacing.len() != self.shape.len() {
            return Err(anyhow!(
                "spacing has {} entries but shape has {}",
                self.spacing.len(),
                self.shape.len()
            ));
        }
        if let Some(origin) = &self.origin {
            if origin.len() != self.shape.len() {
                return Err(anyhow!(
                    "origin has {} entries but shape has {}",
                    origin.len(),
                    self.shape.len()
                ));
            }
        }
        if self.shape.contains(&0) {
            return Err(anyhow!("Grid dimensions must be positive, got {:?}", self.shape));
        }
        if self.spacing.iter().any(|&h| h <= 0.0) {
            return Err(anyhow!("Grid spacing must be positive, got {:?}", self.spacing));
        }
        Ok(())
    }

    pub fn grid_params(&self) -> GridParams {
        let origin = self
            .origin
            .clone()
            .unwrap_or_else(|| vec![0.0; self.shape.len()]);
        GridParams::new(self.shape.clone(), self.spacing.clone())
            .with_origin(origin)
            .with_nbpml(self.nbpml)
            .with_dtype(self.dtype)
    }
}

/// Output configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plot: Option<String>, // Field to render, e.g. "damp" or "vp"
    #[serde(default = "default_directory")]
    pub directory: String,
    #[serde(default = "default_image_width")]
    pub image_width: u32,
    #[serde(default = "default_image_height")]
    pub image_height: u32,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            plot: None,
            directory: default_directory(),
            image_width: default_image_width(),
            image_height: default_image_height(),
        }
    }
}

fn default_directory() -> String {
    "output".to_string()
}

fn default_image_width() -> u32 {
    1200
}

fn default_image_height() -> u32 {
    1000
}

impl OutputConfig {
    fn validate(&self) -> Result<()> {
        if self.image_width == 0 || self.image_height == 0 {
            return Err(anyhow!(
                "Image dimensions must be positive (width={}, height={})",
                self.image_width,
                self.image_height
            ));
        }
        Ok(())
    }
}

/// Complete run configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub model: ModelConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

impl Config {
    /// Load configuration from TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .map_err(|e| anyhow!("Failed to read config file '{}': {}", path.display(), e))?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config =
            toml::from_str(content).map_err(|e| anyhow!("Failed to parse TOML config: {}", e))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.model.validate()?;
        self.output.validate()?;
        Ok(())
    }
}
