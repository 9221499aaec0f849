//! Editor tuning values, read from TOML.

use crate::error::EditorError;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct EditorConfig {
    /// Width of one spatial index cell, in viewport units.
    pub chunk_width: f32,
    /// Height of one spatial index cell, in viewport units.
    pub chunk_height: f32,
    /// Pointer travel (screen px) below which a press/release pair is a click.
    pub click_threshold: f32,
    /// Max distance (screen px) from a wire curve that still picks the wire.
    pub connector_hit_tolerance: f32,
    /// Radius (viewport units) around a port anchor that picks the port.
    pub port_hit_radius: f32,
    /// Number of line segments used to approximate a wire curve.
    pub connector_curve_samples: usize,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            chunk_width: 500.0,
            chunk_height: 300.0,
            click_threshold: 2.0,
            connector_hit_tolerance: 5.0,
            port_hit_radius: 10.0,
            connector_curve_samples: 24,
        }
    }
}

impl EditorConfig {
    pub fn from_toml_str(toml_str: &str) -> Result<Self, EditorError> {
        let config: EditorConfig = toml::from_str(toml_str)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> Result<String, EditorError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Reads `path`, falling back to defaults when the file is missing or
    /// cannot be parsed.
    pub fn load_or_default(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }
        match fs::read_to_string(path) {
            Ok(toml_str) => match Self::from_toml_str(&toml_str) {
                Ok(config) => {
                    info!("Editor config loaded from {}", path.display());
                    config
                }
                Err(e) => {
                    warn!("Failed to parse editor config, using defaults: {}", e);
                    Self::default()
                }
            },
            Err(e) => {
                warn!("Failed to read editor config, using defaults: {}", e);
                Self::default()
            }
        }
    }

    fn validate(&self) -> Result<(), EditorError> {
        if !(self.chunk_width > 0.0 && self.chunk_height > 0.0) {
            return Err(EditorError::InvalidArgument(format!(
                "chunk size must be positive, got {}x{}",
                self.chunk_width, self.chunk_height
            )));
        }
        if self.connector_curve_samples == 0 {
            return Err(EditorError::InvalidArgument(
                "connector_curve_samples must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = EditorConfig::from_toml_str("chunk_width = 250.0\n").unwrap();
        assert_eq!(config.chunk_width, 250.0);
        assert_eq!(config.chunk_height, 300.0);
        assert_eq!(config.connector_curve_samples, 24);
    }

    #[test]
    fn test_rejects_zero_chunk() {
        let err = EditorConfig::from_toml_str("chunk_height = 0.0\n").unwrap_err();
        assert!(matches!(err, EditorError::InvalidArgument(_)));
    }

    #[test]
    fn test_toml_round_trip() {
        let mut config = EditorConfig::default();
        config.click_threshold = 4.0;
        let text = config.to_toml_string().unwrap();
        assert_eq!(EditorConfig::from_toml_str(&text).unwrap(), config);
    }

    #[test]
    fn test_missing_file_falls_back() {
        let config = EditorConfig::load_or_default(Path::new("/nonexistent/blueprint.toml"));
        assert_eq!(config, EditorConfig::default());
    }
}
