//! Configuration module for pixelgraph
//!
//! The engine reads a single TOML file with two sections:
//!
//! ```toml
//! [graph]
//! node_capacity = 128
//! eval_mode = "per_pixel"
//!
//! [capture]
//! enabled = true
//! poll_rate_hz = 10
//! ```
//!
//! # Config Location
//!
//! - **Linux**: `~/.config/pixelgraph/engine.toml`
//! - **macOS**: `~/Library/Application Support/pixelgraph/engine.toml`
//! - **Windows**: `%APPDATA%\pixelgraph\engine.toml`

pub mod settings;

pub use settings::*;

use crate::error::{PixelGraphError, Result};
use std::path::PathBuf;

/// Application identifier for config directories
pub const APP_ID: &str = "pixelgraph";

/// Engine config filename
pub const CONFIG_FILE: &str = "engine.toml";

/// Default operator table capacity
pub const DEFAULT_NODE_CAPACITY: usize = 128;

/// Default camera polling rate in Hz
pub const DEFAULT_POLL_RATE_HZ: u32 = 10;

/// Get the platform config directory for pixelgraph
pub fn config_dir() -> Option<PathBuf> {
    dirs_next::config_dir().map(|p| p.join(APP_ID))
}

/// Get the path to the engine config file
pub fn default_config_path() -> Option<PathBuf> {
    config_dir().map(|p| p.join(CONFIG_FILE))
}

/// Ensure the config directory exists
pub fn ensure_config_dir() -> Result<PathBuf> {
    let dir = config_dir().ok_or_else(|| {
        PixelGraphError::Config("Could not determine config directory".to_string())
    })?;

    if !dir.exists() {
        std::fs::create_dir_all(&dir).map_err(|e| {
            PixelGraphError::Config(format!("Failed to create config directory: {}", e))
        })?;
    }

    Ok(dir)
}
