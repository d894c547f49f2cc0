//! Typed access to the panel's persisted state
//!
//! Statuses and notes are keyed by evaluation id, pending evaluation lists by
//! dataset id. Each map lives under a single store key and is written back
//! whole; none of them expire.

use crate::{KeyValueStore, StorageError};
use modeleval_core::{Error, PendingEvaluation, ReviewStatus};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

pub const STATUSES_KEY: &str = "statuses";
pub const NOTES_KEY: &str = "notes";
pub const PENDING_EVALUATIONS_KEY: &str = "pending_evaluations";

#[derive(Clone)]
pub struct PanelRepository {
    store: Arc<dyn KeyValueStore>,
}

impl PanelRepository {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    async fn read_map<T: DeserializeOwned>(&self, key: &str) -> Result<BTreeMap<String, T>, Error> {
        match self.store.get(key).await? {
            // an explicit null is treated like an absent key
            Some(serde_json::Value::Null) | None => Ok(BTreeMap::new()),
            Some(value) => serde_json::from_value(value)
                .map_err(|e| StorageError::invalid_value(key, e).into()),
        }
    }

    async fn write_map<T: Serialize>(&self, key: &str, map: &BTreeMap<String, T>) -> Result<(), Error> {
        let value = serde_json::to_value(map)
            .map_err(|e| StorageError::SerializationError(e.to_string()))?;
        self.store.set(key, value, None).await
    }

    // ==== Statuses ====

    pub async fn get_statuses(&self) -> Result<BTreeMap<String, ReviewStatus>, Error> {
        self.read_map(STATUSES_KEY).await
    }

    pub async fn get_status(&self, eval_id: &str) -> Result<Option<ReviewStatus>, Error> {
        Ok(self.get_statuses().await?.remove(eval_id))
    }

    pub async fn set_status(&self, eval_id: &str, status: ReviewStatus) -> Result<(), Error> {
        let mut statuses = self.get_statuses().await?;
        statuses.insert(eval_id.to_string(), status);
        debug!("Setting status of evaluation {eval_id} to {status:?}");
        self.write_map(STATUSES_KEY, &statuses).await
    }

    // ==== Notes ====

    pub async fn get_notes(&self) -> Result<BTreeMap<String, String>, Error> {
        self.read_map(NOTES_KEY).await
    }

    pub async fn get_note(&self, eval_id: &str) -> Result<Option<String>, Error> {
        Ok(self.get_notes().await?.remove(eval_id))
    }

    pub async fn set_note(&self, eval_id: &str, note: &str) -> Result<(), Error> {
        let mut notes = self.get_notes().await?;
        notes.insert(eval_id.to_string(), note.to_string());
        self.write_map(NOTES_KEY, &notes).await
    }

    // ==== Pending evaluations ====

    pub async fn get_pending_evaluations(
        &self,
        dataset_id: &str,
    ) -> Result<Vec<PendingEvaluation>, Error> {
        let mut all: BTreeMap<String, Vec<PendingEvaluation>> =
            self.read_map(PENDING_EVALUATIONS_KEY).await?;
        Ok(all.remove(dataset_id).unwrap_or_default())
    }

    /// Replace the pending list of `dataset_id`, leaving other datasets untouched
    pub async fn set_pending_evaluations(
        &self,
        dataset_id: &str,
        pending: Vec<PendingEvaluation>,
    ) -> Result<(), Error> {
        let mut all: BTreeMap<String, Vec<PendingEvaluation>> =
            self.read_map(PENDING_EVALUATIONS_KEY).await?;
        debug!(
            "Writing {} pending evaluations for dataset {dataset_id}",
            pending.len()
        );
        all.insert(dataset_id.to_string(), pending);
        self.write_map(PENDING_EVALUATIONS_KEY, &all).await
    }
}

impl std::fmt::Debug for PanelRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PanelRepository")
            .field("store", &self.store.name())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::RecordingStore;
    use serde_json::json;

    fn repository() -> (Arc<RecordingStore>, PanelRepository) {
        let store = Arc::new(RecordingStore::new());
        (store.clone(), PanelRepository::new(store))
    }

    #[tokio::test]
    async fn test_empty_store_reads_as_empty_maps() {
        let (_, repo) = repository();
        assert!(repo.get_statuses().await.unwrap().is_empty());
        assert!(repo.get_notes().await.unwrap().is_empty());
        assert!(repo.get_pending_evaluations("ds").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_status_is_keyed_by_eval_id() {
        let (store, repo) = repository();
        repo.set_status("id-1", ReviewStatus::InReview).await.unwrap();
        repo.set_status("id-2", ReviewStatus::Reviewed).await.unwrap();

        assert_eq!(repo.get_status("id-1").await.unwrap(), Some(ReviewStatus::InReview));
        assert_eq!(
            store.value(STATUSES_KEY),
            Some(json!({"id-1": "in_review", "id-2": "reviewed"}))
        );
        assert!(store.writes().iter().all(|w| w.ttl.is_none()));
    }

    #[tokio::test]
    async fn test_note_overwrites_previous() {
        let (_, repo) = repository();
        repo.set_note("id-1", "first").await.unwrap();
        repo.set_note("id-1", "second").await.unwrap();
        assert_eq!(repo.get_note("id-1").await.unwrap().as_deref(), Some("second"));
    }

    #[tokio::test]
    async fn test_pending_lists_are_per_dataset() {
        let (_, repo) = repository();
        repo.set_pending_evaluations("a", vec![PendingEvaluation::new("e1")])
            .await
            .unwrap();
        repo.set_pending_evaluations("b", vec![PendingEvaluation::new("e2")])
            .await
            .unwrap();

        assert_eq!(
            repo.get_pending_evaluations("a").await.unwrap(),
            vec![PendingEvaluation::new("e1")]
        );
        assert_eq!(
            repo.get_pending_evaluations("b").await.unwrap(),
            vec![PendingEvaluation::new("e2")]
        );
    }

    #[tokio::test]
    async fn test_malformed_value_is_an_error() {
        let (store, repo) = repository();
        store.insert(NOTES_KEY, json!(["not", "a", "map"]));
        assert!(repo.get_notes().await.is_err());
    }

    #[tokio::test]
    async fn test_null_value_reads_as_empty() {
        let (store, repo) = repository();
        store.insert(STATUSES_KEY, serde_json::Value::Null);
        assert!(repo.get_statuses().await.unwrap().is_empty());
    }
}
