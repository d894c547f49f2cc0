//! Default values and functions for configuration

use std::time::Duration;

// Default constants
pub(crate) const DEFAULT_STORE_NAME: &str = "model_evaluation_panel_builtin";
pub(crate) const DEFAULT_STORE_MAX_CAPACITY: u64 = 10_000;

/// Time-to-live of a cached metrics bundle (30 days)
pub const CACHE_TTL: Duration = Duration::from_secs(30 * 24 * 60 * 60);

/// Environment flag that turns evaluation caching off when set to a truthy value
pub const DISABLE_CACHING_ENV: &str = "MODELEVAL_DISABLE_EVALUATION_CACHING";

/// Values of [`DISABLE_CACHING_ENV`] that count as "set"
pub const TRUTHY_VALUES: [&str; 3] = ["true", "True", "1"];

pub(crate) fn default_enable_caching() -> bool {
    true
}

pub(crate) fn default_store_name() -> String {
    DEFAULT_STORE_NAME.to_string()
}

pub(crate) fn default_store_max_capacity() -> u64 {
    DEFAULT_STORE_MAX_CAPACITY
}
