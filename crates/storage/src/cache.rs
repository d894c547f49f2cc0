//! Best-effort cache of metrics bundles keyed by evaluation id

use crate::KeyValueStore;
use modeleval_core::{Config, MetricsBundle};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, warn};

/// Caches [`MetricsBundle`]s by evaluation identity
///
/// Keys are evaluation ids, never evaluation keys: a key can be reassigned to
/// a new run, an id cannot. Every store failure is logged and swallowed; a
/// failed read is a miss and a failed write leaves the caller's bundle usable.
#[derive(Clone)]
pub struct ResultsCache {
    store: Arc<dyn KeyValueStore>,
    enabled: bool,
}

impl ResultsCache {
    pub fn new(store: Arc<dyn KeyValueStore>, enabled: bool) -> Self {
        Self { store, enabled }
    }

    pub fn from_config(store: Arc<dyn KeyValueStore>, config: &Config) -> Self {
        Self::new(store, config.panel.enable_caching)
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Cached bundle for `eval_id`; always `None` while caching is disabled
    pub async fn get(&self, eval_id: &str) -> Option<MetricsBundle> {
        if !self.enabled {
            return None;
        }

        let value = match self.store.get(eval_id).await {
            Ok(Some(value)) => value,
            Ok(None) => {
                debug!("Cache miss for evaluation {eval_id}");
                return None;
            }
            Err(e) => {
                warn!("Failed to read cached bundle for evaluation {eval_id}: {e}");
                return None;
            }
        };

        match serde_json::from_value(value) {
            Ok(bundle) => {
                debug!("Cache hit for evaluation {eval_id}");
                Some(bundle)
            }
            Err(e) => {
                warn!("Discarding unreadable cached bundle for evaluation {eval_id}: {e}");
                None
            }
        }
    }

    /// Store `bundle` under `eval_id` for `ttl`; a no-op while caching is disabled
    pub async fn set(&self, eval_id: &str, bundle: &MetricsBundle, ttl: Duration) {
        if !self.enabled {
            return;
        }

        let value = match serde_json::to_value(bundle) {
            Ok(value) => value,
            Err(e) => {
                error!("Failed to serialize metrics bundle for evaluation {eval_id}: {e}");
                return;
            }
        };

        if let Err(e) = self.store.set(eval_id, value, Some(ttl)).await {
            error!("Failed to cache metrics bundle for evaluation {eval_id}: {e}");
        }
    }
}

impl std::fmt::Debug for ResultsCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResultsCache")
            .field("store", &self.store.name())
            .field("enabled", &self.enabled)
            .finish()
    }
}
