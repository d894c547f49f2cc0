//! Configuration loading from files and environment variables

use crate::error::{Error, Result};
use config::{Config as ConfigLib, ConfigBuilder as LibConfigBuilder, Environment, File};
use std::path::Path;
use tracing::debug;

use super::defaults::*;
use super::{global_config_path, Config};

/// Helper to set a config default with consistent error mapping
fn set_config_default<T: Into<config::Value>>(
    builder: LibConfigBuilder<config::builder::DefaultState>,
    key: &str,
    value: T,
) -> Result<LibConfigBuilder<config::builder::DefaultState>> {
    builder
        .set_default(key, value)
        .map_err(|e| Error::config(format!("Failed to set {key} default: {e}")))
}

impl Config {
    /// Loads configuration from a TOML file with environment variable overrides
    ///
    /// Environment variables are prefixed with `MODELEVAL_` and use double underscores
    /// for nested values. For example:
    /// - `MODELEVAL_PANEL__ENABLE_CACHING=false`
    /// - `MODELEVAL_STORE__MAX_CAPACITY=500`
    ///
    /// `MODELEVAL_DISABLE_EVALUATION_CACHING` set to a truthy value always wins
    /// over the file and the prefixed variables.
    pub fn from_file(path: &Path) -> Result<Self> {
        let builder = ConfigLib::builder();

        // config crate doesn't apply serde defaults for missing sections
        let builder = set_config_default(builder, "panel.enable_caching", default_enable_caching())?;
        let builder = set_config_default(builder, "panel.store_name", default_store_name())?;
        let mut builder = set_config_default(
            builder,
            "store.max_capacity",
            default_store_max_capacity() as i64,
        )?;

        if path.exists() {
            debug!("Loading configuration from {}", path.display());
            builder = builder.add_source(File::from(path));
        }

        builder = builder.add_source(
            Environment::with_prefix("MODELEVAL")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder
            .build()
            .map_err(|e| Error::config(format!("Failed to build config: {e}")))?;

        let mut config: Config = config
            .try_deserialize()
            .map_err(|e| Error::config(format!("Failed to deserialize config: {e}")))?;

        let flag = std::env::var(DISABLE_CACHING_ENV).ok();
        config.apply_caching_flag(flag.as_deref());

        Ok(config)
    }

    /// Creates a config from a TOML string (useful for testing)
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::config(format!("Failed to parse TOML: {e}")))
    }

    /// Load configuration
    ///
    /// Precedence (lowest to highest):
    /// 1. Hardcoded defaults
    /// 2. Config file (~/.modeleval/config.toml or custom --config path)
    /// 3. Environment variables (MODELEVAL_*)
    /// 4. MODELEVAL_DISABLE_EVALUATION_CACHING
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        let path = match config_path {
            Some(p) => p.to_path_buf(),
            None => global_config_path()?,
        };
        Self::from_file(&path)
    }
}
