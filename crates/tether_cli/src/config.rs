//! Configuration for the tether CLI
//!
//! `tether.toml` carries the core [`TetherConfig`] keys at the top level and
//! the soak driver settings under `[soak]`. Every key is optional.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tether_core::TetherConfig;

/// Contents of `tether.toml`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CliConfig {
    #[serde(flatten)]
    pub core: TetherConfig,

    #[serde(default)]
    pub soak: SoakConfig,
}

/// Soak run settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SoakConfig {
    /// Instances mounted at any one time
    #[serde(default = "default_instances")]
    pub instances: usize,

    /// Ticks published over the whole run
    #[serde(default = "default_ticks")]
    pub ticks: u64,

    /// Share of instances replaced halfway through (0.0 - 1.0)
    #[serde(default = "default_churn")]
    pub churn: f64,

    /// Pause between two published ticks
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,

    /// Quiet period before the report is taken
    #[serde(default = "default_settle_ms")]
    pub settle_ms: u64,
}

fn default_instances() -> usize {
    8
}

fn default_ticks() -> u64 {
    100
}

fn default_churn() -> f64 {
    0.5
}

fn default_tick_interval_ms() -> u64 {
    1
}

fn default_settle_ms() -> u64 {
    100
}

impl Default for SoakConfig {
    fn default() -> Self {
        Self {
            instances: default_instances(),
            ticks: default_ticks(),
            churn: default_churn(),
            tick_interval_ms: default_tick_interval_ms(),
            settle_ms: default_settle_ms(),
        }
    }
}

impl SoakConfig {
    /// Instances removed and replaced by the churn step
    pub fn churn_count(&self) -> usize {
        let churn = self.churn.clamp(0.0, 1.0);
        (self.instances as f64 * churn).round() as usize
    }
}

impl CliConfig {
    /// Load from `path`, falling back to defaults if the file does not exist
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!("{} not found, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;

        Self::from_toml_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))
    }

    pub fn from_toml_str(source: &str) -> Result<Self> {
        Ok(toml::from_str(source)?)
    }

    /// Serialize to TOML string
    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }
}
