//! In-memory collaborators for testing

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use crate::dataset::{Dataset, DatasetView};
use crate::notify::{Notifier, Severity};
use async_trait::async_trait;
use modeleval_core::{Error, EvaluationInfo, EvaluationResults, LabelPaths, MaskTargets};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

#[derive(Debug, Clone)]
struct StoredEvaluation {
    info: EvaluationInfo,
    results: Option<EvaluationResults>,
}

/// Dataset whose evaluations live in memory
///
/// Evaluations are listed in insertion order. An evaluation added without
/// results is listed but reports no results, like a run still in progress.
#[derive(Debug, Default)]
pub struct InMemoryDataset {
    id: String,
    evaluations: Mutex<Vec<(String, StoredEvaluation)>>,
    mask_targets: BTreeMap<String, MaskTargets>,
    default_mask_targets: Option<MaskTargets>,
    results_loads: AtomicUsize,
    results_checks: AtomicUsize,
}

impl InMemoryDataset {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    pub fn with_evaluation(self, info: EvaluationInfo, results: Option<EvaluationResults>) -> Self {
        self.add_evaluation(info, results);
        self
    }

    pub fn with_mask_targets(mut self, field: &str, targets: MaskTargets) -> Self {
        self.mask_targets.insert(field.to_string(), targets);
        self
    }

    pub fn with_default_mask_targets(mut self, targets: MaskTargets) -> Self {
        self.default_mask_targets = Some(targets);
        self
    }

    /// Add or replace an evaluation
    pub fn add_evaluation(&self, info: EvaluationInfo, results: Option<EvaluationResults>) {
        let mut evaluations = self.evaluations.lock().unwrap();
        let key = info.key.clone();
        let stored = StoredEvaluation { info, results };
        match evaluations.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = stored,
            None => evaluations.push((key, stored)),
        }
    }

    /// Number of times results were loaded
    pub fn results_loads(&self) -> usize {
        self.results_loads.load(Ordering::SeqCst)
    }

    /// Number of `has_evaluation_results` calls
    pub fn results_checks(&self) -> usize {
        self.results_checks.load(Ordering::SeqCst)
    }

    fn find(&self, eval_key: &str) -> Result<StoredEvaluation, Error> {
        self.evaluations
            .lock()
            .unwrap()
            .iter()
            .find(|(k, _)| k == eval_key)
            .map(|(_, stored)| stored.clone())
            .ok_or_else(|| Error::evaluation_not_found(eval_key))
    }
}

impl LabelPaths for InMemoryDataset {
    fn label_list_path(&self, field: &str) -> String {
        format!("{field}.detections")
    }
}

#[async_trait]
impl Dataset for InMemoryDataset {
    fn id(&self) -> &str {
        &self.id
    }

    async fn list_evaluations(&self) -> Result<Vec<String>, Error> {
        Ok(self
            .evaluations
            .lock()
            .unwrap()
            .iter()
            .map(|(k, _)| k.clone())
            .collect())
    }

    async fn evaluation_id(&self, eval_key: &str) -> Option<String> {
        self.find(eval_key).ok().and_then(|stored| stored.info.id)
    }

    async fn has_evaluation_results(&self, eval_key: &str) -> bool {
        self.results_checks.fetch_add(1, Ordering::SeqCst);
        self.find(eval_key)
            .map(|stored| stored.results.is_some())
            .unwrap_or(false)
    }

    async fn get_evaluation_info(&self, eval_key: &str) -> Result<EvaluationInfo, Error> {
        Ok(self.find(eval_key)?.info)
    }

    async fn load_evaluation_results(&self, eval_key: &str) -> Result<EvaluationResults, Error> {
        self.results_loads.fetch_add(1, Ordering::SeqCst);
        self.find(eval_key)?
            .results
            .ok_or_else(|| Error::dataset(format!("Evaluation '{eval_key}' has no results")))
    }

    async fn load_evaluation_view(&self, eval_key: &str) -> Result<DatasetView, Error> {
        self.find(eval_key)?;
        Ok(DatasetView::new(&self.id, eval_key))
    }

    async fn mask_targets(&self, field: &str) -> Option<MaskTargets> {
        self.mask_targets.get(field).cloned()
    }

    async fn default_mask_targets(&self) -> Option<MaskTargets> {
        self.default_mask_targets.clone()
    }
}

/// A delivered notification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub message: String,
    pub severity: Severity,
}

/// Notifier that keeps every message
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    notifications: Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notifications(&self) -> Vec<Notification> {
        self.notifications.lock().unwrap().clone()
    }

    pub fn last(&self) -> Option<Notification> {
        self.notifications.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, message: &str, severity: Severity) {
        self.notifications.lock().unwrap().push(Notification {
            message: message.to_string(),
            severity,
        });
    }
}
