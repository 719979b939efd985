//! Configuration loading and parsing

use anyhow::{Context, Result};
use race_state::SnapshotEncoder;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Main application configuration (loaded from config.toml)
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AppConfig {
    #[serde(default)]
    pub snapshot: SnapshotConfig,
    #[serde(default)]
    pub race: RaceConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SnapshotConfig {
    /// Largest snapshot the transport can carry, in bytes
    pub max_bytes: Option<usize>,
    #[serde(default = "default_true")]
    pub include_board: bool,
}

impl Default for SnapshotConfig {
    fn default() -> Self {
        Self {
            max_bytes: None,
            include_board: true,
        }
    }
}

impl SnapshotConfig {
    pub fn encoder(&self) -> SnapshotEncoder {
        match self.max_bytes {
            Some(bytes) => SnapshotEncoder::with_capacity(bytes),
            None => SnapshotEncoder::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RaceConfig {
    /// Clear results when a setup command arrives
    #[serde(default = "default_true")]
    pub auto_reset_on_setup: bool,
}

impl Default for RaceConfig {
    fn default() -> Self {
        Self {
            auto_reset_on_setup: true,
        }
    }
}

fn default_true() -> bool {
    true
}

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<AppConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let config: AppConfig = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    if config.snapshot.max_bytes == Some(0) {
        anyhow::bail!("snapshot.max_bytes must be greater than zero in {:?}", path);
    }

    Ok(config)
}
