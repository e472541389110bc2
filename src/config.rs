//! Application configuration.
//!
//! The configuration is loaded from a JSON file, by default
//! `$XDG_CONFIG_HOME/gridded/config.json`.  Command-line flags override the
//! `"layout"` section.
//!
//! # Example
//!
//! ```json
//! {
//!   "layout": { "rows": 2, "cols": 2, "full": false, "mirror": false },
//!   "exit_policy": "with_last_child",
//!   "consume_bound_keys": false,
//!   "bindings": [
//!     { "modifiers": ["control"], "key": "space", "action": "mirror" },
//!     { "modifiers": ["control"], "key": "f", "action": "toggle_full" }
//!   ]
//! }
//! ```

use crate::bindings::{default_bindings, KeyBinding};
use crate::grid::GridConfig;
use crate::supervisor::ExitPolicy;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Top-level configuration.
///
/// Every field is optional — a minimal `{}` file is valid and all sections
/// fall back to their compiled-in defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Initial grid shape.
    pub layout: LayoutConfig,

    /// What happens when the last child exits.
    pub exit_policy: ExitPolicy,

    /// Do not replay bound key presses to the focused child.
    pub consume_bound_keys: bool,

    /// Key bindings.  Replaces the defaults entirely when present.
    pub bindings: Vec<KeyBinding>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            layout: LayoutConfig::default(),
            exit_policy: ExitPolicy::default(),
            consume_bound_keys: false,
            bindings: default_bindings(),
        }
    }
}

/// Initial grid shape.  `0` rows or columns means unconstrained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    pub rows: u32,
    pub cols: u32,
    /// Start in full mode.
    pub full: bool,
    /// Mirror once after spawning.
    pub mirror: bool,
}

impl LayoutConfig {
    pub fn grid(&self) -> GridConfig {
        GridConfig::new(self.rows, self.cols, self.full)
    }
}

impl Config {
    /// Load configuration from a JSON file at `path`.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError(format!("failed to read {}: {}", path.display(), e)))?;
        let config: Self = serde_json::from_str(&contents)
            .map_err(|e| ConfigError(format!("failed to parse {}: {}", path.display(), e)))?;
        Ok(config)
    }
}

/// Error from loading or parsing a configuration file.
#[derive(Debug, thiserror::Error)]
#[error("config error: {0}")]
pub struct ConfigError(String);
