//! Engine settings
//!
//! Loaded from TOML. Every field has a default, so a partial file (or a
//! missing one, through [`EngineConfig::load_or_default`]) is valid.

use super::{DEFAULT_NODE_CAPACITY, DEFAULT_POLL_RATE_HZ};
use crate::error::{PixelGraphError, Result};
use crate::graph::{EvalMode, MAX_TABLE_CAPACITY};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Graph table and evaluation settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphConfig {
    /// Operator table capacity. Connections get twice as many slots.
    pub node_capacity: usize,
    /// Execution granularity used by `NodeSystem::process`
    pub eval_mode: EvalMode,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            node_capacity: DEFAULT_NODE_CAPACITY,
            eval_mode: EvalMode::default(),
        }
    }
}

/// Camera capture settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// Start the capture producer when a camera source is created
    pub enabled: bool,
    /// Device polling rate (0 = as fast as possible)
    pub poll_rate_hz: u32,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            poll_rate_hz: DEFAULT_POLL_RATE_HZ,
        }
    }
}

/// Complete engine configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub graph: GraphConfig,
    pub capture: CaptureConfig,
}

impl EngineConfig {
    /// Load and validate a config file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            PixelGraphError::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;

        let config: Self = toml::from_str(&content)
            .map_err(|e| PixelGraphError::Config(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load a config file, returning defaults on any error
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        if !path.exists() {
            return Self::default();
        }
        Self::load(path).unwrap_or_else(|e| {
            tracing::warn!("Failed to load engine config, using defaults: {}", e);
            Self::default()
        })
    }

    /// Save the config as TOML, creating parent directories
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    PixelGraphError::Config(format!("Failed to create config directory: {}", e))
                })?;
            }
        }

        let content = toml::to_string_pretty(self)
            .map_err(|e| PixelGraphError::Config(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, content)
            .map_err(|e| PixelGraphError::Config(format!("Failed to write config: {}", e)))
    }

    /// Reject settings the graph tables cannot honour
    pub fn validate(&self) -> Result<()> {
        let capacity = self.graph.node_capacity;
        if capacity == 0 {
            return Err(PixelGraphError::Config(
                "graph.node_capacity must be at least 1".to_string(),
            ));
        }
        // Connections need 2 * capacity addressable slots
        if capacity * 2 > MAX_TABLE_CAPACITY {
            return Err(PixelGraphError::Config(format!(
                "graph.node_capacity {} exceeds the maximum of {}",
                capacity,
                MAX_TABLE_CAPACITY / 2
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.graph.node_capacity, 128);
        assert_eq!(config.graph.eval_mode, EvalMode::PerPixel);
        assert!(config.capture.enabled);
        assert_eq!(config.capture.poll_rate_hz, 10);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let config: EngineConfig = toml::from_str(
            r#"
            [graph]
            eval_mode = "per_image"
            "#,
        )
        .unwrap();
        assert_eq!(config.graph.eval_mode, EvalMode::PerImage);
        assert_eq!(config.graph.node_capacity, 128);
        assert_eq!(config.capture, CaptureConfig::default());
    }

    #[test]
    fn test_save_and_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("engine.toml");

        let mut config = EngineConfig::default();
        config.graph.node_capacity = 16;
        config.capture.enabled = false;
        config.save(&path).unwrap();

        let loaded = EngineConfig::load(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_validate_rejects_bad_capacity() {
        let mut config = EngineConfig::default();
        config.graph.node_capacity = 0;
        assert!(config.validate().is_err());
        config.graph.node_capacity = 4000;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_or_default_on_garbage() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("engine.toml");
        std::fs::write(&path, "graph = 5").unwrap();
        assert_eq!(EngineConfig::load_or_default(&path), EngineConfig::default());
    }
}
