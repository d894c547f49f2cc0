//! Configuration module for the model evaluation panel
//!
//! Configuration can be loaded from a TOML file and/or environment variables.
//! Caching can additionally be switched off with the
//! `MODELEVAL_DISABLE_EVALUATION_CACHING` flag.

mod defaults;
mod loading;


use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub use defaults::{CACHE_TTL, DISABLE_CACHING_ENV, TRUTHY_VALUES};

use defaults::*;

/// Returns the path to the global configuration file
///
/// The global config is stored at `~/.modeleval/config.toml`.
pub fn global_config_path() -> Result<PathBuf> {
    let home_dir = dirs::home_dir()
        .ok_or_else(|| Error::config("Unable to determine home directory".to_string()))?;
    Ok(home_dir.join(".modeleval").join("config.toml"))
}

/// Returns true when `value` is one of the recognised truthy flag values
pub fn is_truthy(value: &str) -> bool {
    TRUTHY_VALUES.contains(&value)
}

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Panel behaviour
    #[serde(default)]
    pub panel: PanelConfig,

    /// Backing key-value store
    #[serde(default)]
    pub store: StoreConfig,
}

/// Panel configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PanelConfig {
    /// Whether computed metrics bundles are cached by evaluation id
    #[serde(default = "default_enable_caching")]
    pub enable_caching: bool,

    /// Namespace for every key the panel writes to the store
    #[serde(default = "default_store_name")]
    pub store_name: String,
}

impl Default for PanelConfig {
    fn default() -> Self {
        Self {
            enable_caching: default_enable_caching(),
            store_name: default_store_name(),
        }
    }
}

/// In-memory store configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Maximum number of entries held before eviction
    #[serde(default = "default_store_max_capacity")]
    pub max_capacity: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            max_capacity: default_store_max_capacity(),
        }
    }
}

impl Config {
    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.panel.store_name.trim().is_empty() {
            return Err(Error::config("panel.store_name must not be empty"));
        }

        if self.store.max_capacity == 0 {
            return Err(Error::config(
                "store.max_capacity must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }

    /// Turns caching off when the legacy disable flag carries a truthy value
    pub fn apply_caching_flag(&mut self, flag: Option<&str>) {
        if flag.is_some_and(is_truthy) {
            self.panel.enable_caching = false;
        }
    }
}
