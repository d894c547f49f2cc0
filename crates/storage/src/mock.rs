//! Mock store for testing

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use crate::{KeyValueStore, StorageError};
use async_trait::async_trait;
use modeleval_core::Error;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// One recorded `set` call
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedWrite {
    pub key: String,
    pub value: Value,
    pub ttl: Option<Duration>,
}

/// Store that records every write and can be told to fail
///
/// Values never expire; the TTL of each write is recorded instead so tests
/// can assert on it.
#[derive(Debug, Default)]
pub struct RecordingStore {
    data: Arc<Mutex<HashMap<String, Value>>>,
    writes: Arc<Mutex<Vec<RecordedWrite>>>,
    reads: AtomicUsize,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
}

impl RecordingStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent `set` fail (or succeed again)
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Make every subsequent `get` fail (or succeed again)
    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// Seed a value without recording a write
    pub fn insert(&self, key: &str, value: Value) {
        self.data.lock().unwrap().insert(key.to_string(), value);
    }

    pub fn value(&self, key: &str) -> Option<Value> {
        self.data.lock().unwrap().get(key).cloned()
    }

    pub fn writes(&self) -> Vec<RecordedWrite> {
        self.writes.lock().unwrap().clone()
    }

    pub fn write_count(&self) -> usize {
        self.writes.lock().unwrap().len()
    }

    /// Number of writes to `key`
    pub fn writes_to(&self, key: &str) -> usize {
        self.writes
            .lock()
            .unwrap()
            .iter()
            .filter(|w| w.key == key)
            .count()
    }

    pub fn read_count(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl KeyValueStore for RecordingStore {
    fn name(&self) -> &str {
        "recording"
    }

    async fn get(&self, key: &str) -> Result<Option<Value>, Error> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(StorageError::Unavailable(self.name().to_string()).into());
        }
        Ok(self.value(key))
    }

    async fn set(&self, key: &str, value: Value, ttl: Option<Duration>) -> Result<(), Error> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StorageError::WriteRejected {
                key: key.to_string(),
                reason: "writes disabled".to_string(),
            }
            .into());
        }
        self.writes.lock().unwrap().push(RecordedWrite {
            key: key.to_string(),
            value: value.clone(),
            ttl,
        });
        self.data.lock().unwrap().insert(key.to_string(), value);
        Ok(())
    }
}
