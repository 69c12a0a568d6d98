//! Configuration management for ImageResizer

use std::path::{Path, PathBuf};
use serde::{Deserialize, Serialize};
use crate::error::{Result, ResizeError};

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// How each image is scaled and encoded
    pub resize: ResizeSettings,

    /// Where images come from and how the run is scheduled
    pub processing: ProcessingConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Scale and encoder settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ResizeSettings {
    /// Uniform scale factor applied to width and height
    pub scale: f64,

    /// JPEG quality (1-100)
    pub quality: u8,

    /// Resampling filter
    pub filter: FilterType,
}

impl Default for ResizeSettings {
    fn default() -> Self {
        Self {
            scale: 2.0,
            quality: 90,
            filter: FilterType::default(),
        }
    }
}

/// Run configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessingConfig {
    /// Source directory scanned for images
    pub source: PathBuf,

    /// Destination directory, emptied before each run
    pub destination: PathBuf,

    /// Upper bound on units running at once (None = one per file)
    pub max_concurrent: Option<usize>,

    /// Run with a cancellation signal
    pub cancellable: bool,

    /// Basename that trips the cancellation signal
    pub cancel_on: Option<String>,
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            source: PathBuf::from("images"),
            destination: PathBuf::from("output"),
            max_concurrent: None,
            cancellable: false,
            cancel_on: None,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Enable JSON logging
    pub json_format: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_format: false,
        }
    }
}

/// Resampling filters. All of them interpolate; nearest neighbour is not offered.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FilterType {
    /// Triangle (linear interpolation)
    Triangle,
    /// Catmull-Rom cubic spline
    CatmullRom,
    /// Gaussian
    Gaussian,
    /// Lanczos with radius 3
    #[default]
    Lanczos3,
}

impl Config {
    /// Load configuration from file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)
            .map_err(|e| ResizeError::config(
                format!("Failed to read config file {:?}: {}", path.as_ref(), e)
            ))?;

        let extension = path.as_ref()
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or("");

        match extension.to_lowercase().as_str() {
            "toml" => toml::from_str(&content).map_err(Into::into),
            "yaml" | "yml" => serde_yaml::from_str(&content).map_err(Into::into),
            _ => Err(ResizeError::config(
                "Unsupported config file format. Use .toml or .yaml"
            )),
        }
    }

    /// Save configuration to file
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let extension = path.as_ref()
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or("");

        let content = match extension.to_lowercase().as_str() {
            "toml" => toml::to_string_pretty(self)
                .map_err(|e| ResizeError::config(format!("TOML serialization failed: {}", e)))?,
            "yaml" | "yml" => serde_yaml::to_string(self)
                .map_err(|e| ResizeError::config(format!("YAML serialization failed: {}", e)))?,
            _ => return Err(ResizeError::config(
                "Unsupported config file format. Use .toml or .yaml"
            )),
        };

        std::fs::write(&path, content)
            .map_err(|e| ResizeError::config(
                format!("Failed to write config file {:?}: {}", path.as_ref(), e)
            ))?;

        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if !self.resize.scale.is_finite() || self.resize.scale <= 0.0 {
            return Err(ResizeError::config(
                format!("Scale factor must be a positive number, got {}", self.resize.scale)
            ));
        }

        if self.resize.quality == 0 || self.resize.quality > 100 {
            return Err(ResizeError::config(
                "Quality must be between 1 and 100"
            ));
        }

        if self.processing.max_concurrent == Some(0) {
            return Err(ResizeError::config(
                "Concurrency limit must be greater than 0"
            ));
        }

        if let Some(name) = &self.processing.cancel_on {
            if name.is_empty() {
                return Err(ResizeError::config("Cancellation basename must not be empty"));
            }
        }

        Ok(())
    }
}
