#![deny(warnings)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

pub mod error;
mod cache;
mod memory;
pub mod mock;
mod pending;
mod repository;

pub use cache::ResultsCache;
pub use error::StorageError;
pub use memory::InMemoryStore;
pub use pending::PendingEvaluationsTracker;
pub use repository::{PanelRepository, NOTES_KEY, PENDING_EVALUATIONS_KEY, STATUSES_KEY};

use async_trait::async_trait;
use modeleval_core::{Config, Error};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

// ==== Traits ====

/// Named key-value store holding JSON documents
///
/// Entries written with a TTL disappear once it elapses; entries written
/// without one persist until overwritten or evicted. Expiry is enforced by
/// the store, callers never check timestamps themselves.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Name of the store, used as the namespace of every key in it
    fn name(&self) -> &str;

    async fn get(&self, key: &str) -> Result<Option<Value>, Error>;

    async fn set(&self, key: &str, value: Value, ttl: Option<Duration>) -> Result<(), Error>;
}

// ==== Factory ====

/// Creates the panel's store from configuration
///
/// The store is named after `panel.store_name` and bounded by
/// `store.max_capacity`.
pub fn create_store(config: &Config) -> Result<Arc<dyn KeyValueStore>, Error> {
    config.validate()?;
    debug!(
        "Creating in-memory store '{}' (capacity {})",
        config.panel.store_name, config.store.max_capacity
    );
    let store = InMemoryStore::new(&config.panel.store_name, config.store.max_capacity);
    Ok(Arc::new(store) as Arc<dyn KeyValueStore>)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_store_uses_configured_name() {
        let mut config = Config::default();
        config.panel.store_name = "custom_panel".to_string();

        let store = create_store(&config).unwrap();
        assert_eq!(store.name(), "custom_panel");
        assert!(store.get("statuses").await.unwrap().is_none());
    }

    #[test]
    fn test_create_store_rejects_invalid_config() {
        let mut config = Config::default();
        config.store.max_capacity = 0;
        assert!(create_store(&config).is_err());
    }
}
