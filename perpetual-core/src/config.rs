/// Application configuration loaded from JSON
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::asset::{ModelSource, DEFAULT_MODEL_SCALE};
use crate::controls::DEFAULT_AUTO_ROTATE_SPEED;
use crate::lighting::LightingPreset;
use crate::Result;

/// Top-level configuration structure for the application.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub target_fps: u32,
    pub model: ModelConfig,
    /// Panel snapshot used to seed parameter values.
    pub snapshot: Option<PathBuf>,
    pub lighting: LightingPreset,
    pub auto_rotate: bool,
    pub auto_rotate_speed: f32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            target_fps: 30,
            model: ModelConfig::default(),
            snapshot: None,
            lighting: LightingPreset::default(),
            auto_rotate: true,
            auto_rotate_speed: DEFAULT_AUTO_ROTATE_SPEED,
        }
    }
}

impl AppConfig {
    /// Read a JSON config; missing fields take their defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }
}

/// Configuration of the pencil model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// STL file to load; the procedural pencil when absent.
    pub path: Option<PathBuf>,
    pub scale: f32,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            path: None,
            scale: DEFAULT_MODEL_SCALE,
        }
    }
}

impl ModelConfig {
    pub fn source(&self) -> ModelSource {
        match &self.path {
            Some(path) => ModelSource::File(path.clone()),
            None => ModelSource::Builtin,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_json_gives_defaults() {
        assert_eq!(AppConfig::from_json("{}").unwrap(), AppConfig::default());
    }

    #[test]
    fn partial_json_overrides_fields() {
        let config = AppConfig::from_json(
            r#"{"target_fps": 60, "lighting": "night", "model": {"path": "pencil.stl"}}"#,
        )
        .unwrap();
        assert_eq!(config.target_fps, 60);
        assert_eq!(config.lighting, LightingPreset::Night);
        assert_eq!(config.model.scale, DEFAULT_MODEL_SCALE);
        assert_eq!(config.model.source(), ModelSource::File(PathBuf::from("pencil.stl")));
    }

    #[test]
    fn default_model_is_builtin() {
        assert_eq!(AppConfig::default().model.source(), ModelSource::Builtin);
    }

    #[test]
    fn bad_json_is_a_config_error() {
        let err = AppConfig::from_json("{").unwrap_err();
        assert!(err.to_string().starts_with("invalid configuration"));
    }
}
