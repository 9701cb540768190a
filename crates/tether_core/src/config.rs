//! Coordinator configuration
//!
//! Usually left at its defaults. A host that needs different hook or event
//! names (for instance to run two independent tether layers side by side) can
//! load them from a `tether.toml`:
//!
//! ```toml
//! hook_name = "tether"
//! detach_event = "tether:detach"
//! warn_without_actor = true
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Configuration shared by the interception hooks and the update dispatcher
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct TetherConfig {
    /// Name both interception hooks are attached under
    pub hook_name: String,
    /// Reserved UI event fired by an instance's root removal binding
    pub detach_event: String,
    /// Warn when a component's `on_mount` asks for no background actor
    pub warn_without_actor: bool,
}

impl Default for TetherConfig {
    fn default() -> Self {
        Self {
            hook_name: "tether".to_string(),
            detach_event: "tether:detach".to_string(),
            warn_without_actor: true,
        }
    }
}

impl TetherConfig {
    /// Parse from TOML; missing keys keep their defaults
    pub fn from_toml_str(source: &str) -> Result<Self> {
        Ok(toml::from_str(source)?)
    }

    /// Load from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }
}
