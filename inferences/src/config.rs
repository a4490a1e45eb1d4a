use std::path::PathBuf;

use image::imageops::FilterType;

use crate::error::{InferenceError, Result};

pub const DEFAULT_MODEL_PATH: &str = "xception_v2_10_0.917.onnx";

/// Side length, in pixels, of the square input the model was trained on.
pub const IMAGE_SIZE: u32 = 150;

#[derive(Debug, Clone)]
pub struct ModelConfig {
    pub model_path: PathBuf,
    pub image_size: u32,
    pub resize_filter: FilterType,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from(DEFAULT_MODEL_PATH),
            image_size: IMAGE_SIZE,
            resize_filter: FilterType::Nearest,
        }
    }
}

impl ModelConfig {
    /// Reads `MODEL_PATH` and `RESIZE_FILTER`, falling back to defaults.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(path) = std::env::var("MODEL_PATH") {
            if !path.trim().is_empty() {
                config.model_path = PathBuf::from(path);
            }
        }

        if let Ok(filter) = std::env::var("RESIZE_FILTER") {
            config.resize_filter = parse_filter(&filter)?;
        }

        Ok(config)
    }

    pub fn with_model_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.model_path = path.into();
        self
    }
}

/// Parses an interpolation name as accepted in `RESIZE_FILTER`.
pub fn parse_filter(name: &str) -> Result<FilterType> {
    match name.trim().to_ascii_lowercase().as_str() {
        "nearest" => Ok(FilterType::Nearest),
        "triangle" | "bilinear" => Ok(FilterType::Triangle),
        "catmullrom" | "bicubic" => Ok(FilterType::CatmullRom),
        "gaussian" => Ok(FilterType::Gaussian),
        "lanczos3" | "lanczos" => Ok(FilterType::Lanczos3),
        other => Err(InferenceError::Config(format!(
            "unknown resize filter '{}'",
            other
        ))),
    }
}
