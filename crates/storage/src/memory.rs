//! In-process store backed by a bounded moka cache

use crate::KeyValueStore;
use async_trait::async_trait;
use modeleval_core::Error;
use moka::future::Cache;
use moka::Expiry;
use serde_json::Value;
use std::time::{Duration, Instant};
use tracing::trace;

#[derive(Debug, Clone)]
struct StoredValue {
    value: Value,
    ttl: Option<Duration>,
}

/// Expires each entry after the TTL it was written with
struct PerEntryTtl;

impl Expiry<String, StoredValue> for PerEntryTtl {
    fn expire_after_create(
        &self,
        _key: &String,
        value: &StoredValue,
        _created_at: Instant,
    ) -> Option<Duration> {
        value.ttl
    }

    fn expire_after_update(
        &self,
        _key: &String,
        value: &StoredValue,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        // an overwrite restarts the clock with the new entry's TTL
        value.ttl
    }
}

/// [`KeyValueStore`] kept in process memory
///
/// Capacity-bounded; once full, the least recently used entries are evicted.
pub struct InMemoryStore {
    name: String,
    entries: Cache<String, StoredValue>,
}

impl InMemoryStore {
    pub fn new(name: impl Into<String>, max_capacity: u64) -> Self {
        Self {
            name: name.into(),
            entries: Cache::builder()
                .max_capacity(max_capacity)
                .expire_after(PerEntryTtl)
                .build(),
        }
    }
}

impl std::fmt::Debug for InMemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryStore")
            .field("name", &self.name)
            .field("entries", &self.entries.entry_count())
            .finish()
    }
}

#[async_trait]
impl KeyValueStore for InMemoryStore {
    fn name(&self) -> &str {
        &self.name
    }

    async fn get(&self, key: &str) -> Result<Option<Value>, Error> {
        let stored = self.entries.get(key).await;
        trace!("{}: get '{}' (hit: {})", self.name, key, stored.is_some());
        Ok(stored.map(|s| s.value))
    }

    async fn set(&self, key: &str, value: Value, ttl: Option<Duration>) -> Result<(), Error> {
        trace!("{}: set '{}' (ttl: {:?})", self.name, key, ttl);
        self.entries
            .insert(key.to_string(), StoredValue { value, ttl })
            .await;
        Ok(())
    }
}
