//! Request handlers of the model evaluation panel
//!
//! Every handler runs to completion on its own. Failures of the key-value
//! store degrade to empty data, logged warnings or user notifications;
//! failures of the dataset are returned to the caller.

use crate::dataset::{Dataset, DatasetView};
use crate::notify::{Notifier, Severity};
use crate::permissions::Permissions;
use modeleval_core::labels::MISSING_DISPLAY;
use modeleval_core::{
    Config, DrillDownCompiler, Error, EvaluationInfo, EvaluationSummary, EvaluationType, LabelPaths,
    MaskTargets, MetricsAggregator, MetricsBundle, PendingEvaluation, ReviewStatus, Selection,
    CACHE_TTL,
};
use modeleval_storage::{KeyValueStore, PanelRepository, PendingEvaluationsTracker, ResultsCache};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Error marker of evaluations whose type the panel cannot display
pub const UNSUPPORTED_ERROR: &str = "unsupported";

/// Everything the panel shows when it opens
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PanelSnapshot {
    /// Evaluations that currently have results
    pub evaluations: Vec<EvaluationSummary>,
    pub pending_evaluations: Vec<PendingEvaluation>,
    pub statuses: BTreeMap<String, ReviewStatus>,
    pub notes: BTreeMap<String, String>,
    pub permissions: Permissions,
}

/// An evaluation the panel cannot display
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnsupportedEvaluation {
    pub error: String,
    pub info: EvaluationInfo,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EvaluationData {
    Loaded(Box<MetricsBundle>),
    Unsupported(UnsupportedEvaluation),
}

/// Result of [`EvaluationPanel::load_evaluation`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoadedEvaluation {
    pub eval_key: String,
    pub data: EvaluationData,
    /// How the missing marker is displayed for this evaluation
    pub missing: String,
}

impl LoadedEvaluation {
    /// Panel data key the evaluation is published under
    pub fn data_key(&self) -> String {
        match self.data {
            EvaluationData::Loaded(_) => format!("evaluation_{}", self.eval_key),
            EvaluationData::Unsupported(_) => format!("evaluation_{}_error", self.eval_key),
        }
    }

    pub fn bundle(&self) -> Option<&MetricsBundle> {
        match &self.data {
            EvaluationData::Loaded(bundle) => Some(bundle.as_ref()),
            EvaluationData::Unsupported(_) => None,
        }
    }

    pub fn is_unsupported(&self) -> bool {
        matches!(self.data, EvaluationData::Unsupported(_))
    }
}

/// What the user asked to see in the dataset grid
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ViewRequest {
    /// Drop any drill-down and show the whole dataset
    Clear,
    /// Narrow the evaluation view to a selection
    Drill {
        eval_key: String,
        #[serde(default)]
        compare_key: Option<String>,
        selection: Selection,
    },
}

/// How the dataset grid should change
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", content = "view", rename_all = "snake_case")]
pub enum ViewChange {
    Clear,
    Set(DatasetView),
    Unchanged,
}

/// The model evaluation panel opened on one dataset
pub struct EvaluationPanel {
    dataset: Arc<dyn Dataset>,
    repository: PanelRepository,
    cache: ResultsCache,
    tracker: PendingEvaluationsTracker,
    notifier: Arc<dyn Notifier>,
    permissions: Permissions,
    aggregator: MetricsAggregator,
}

impl EvaluationPanel {
    pub fn new(
        dataset: Arc<dyn Dataset>,
        store: Arc<dyn KeyValueStore>,
        notifier: Arc<dyn Notifier>,
        config: &Config,
    ) -> Self {
        let repository = PanelRepository::new(store.clone());
        Self {
            dataset,
            cache: ResultsCache::from_config(store, config),
            tracker: PendingEvaluationsTracker::new(repository.clone()),
            repository,
            notifier,
            permissions: Permissions::default(),
            aggregator: MetricsAggregator::default(),
        }
    }

    pub fn with_permissions(mut self, permissions: Permissions) -> Self {
        self.permissions = permissions;
        self
    }

    pub fn with_aggregator(mut self, aggregator: MetricsAggregator) -> Self {
        self.aggregator = aggregator;
        self
    }

    pub fn permissions(&self) -> Permissions {
        self.permissions
    }

    // ==== Loading ====

    pub async fn on_load(&self) -> Result<PanelSnapshot, Error> {
        let keys = self.dataset.list_evaluations().await?;
        let with_results = self.keys_with_results(&keys).await;

        let mut evaluations = Vec::new();
        for key in keys.iter().filter(|k| with_results.contains(k.as_str())) {
            evaluations.push(EvaluationSummary {
                key: key.clone(),
                id: self.dataset.evaluation_id(key).await,
            });
        }

        let statuses = self.repository.get_statuses().await.unwrap_or_else(|e| {
            warn!("Failed to load evaluation statuses: {e}");
            BTreeMap::new()
        });
        let notes = self.repository.get_notes().await.unwrap_or_else(|e| {
            warn!("Failed to load evaluation notes: {e}");
            BTreeMap::new()
        });
        let pending_evaluations = self.reconcile_pending(&keys, &with_results).await;

        Ok(PanelSnapshot {
            evaluations,
            pending_evaluations,
            statuses,
            notes,
            permissions: self.permissions,
        })
    }

    /// Metrics bundle of `eval_key`, from the cache when `eval_id` has one
    ///
    /// Unsupported evaluation types come back as data, without their results
    /// ever being loaded.
    pub async fn load_evaluation(
        &self,
        eval_key: &str,
        eval_id: Option<&str>,
    ) -> Result<LoadedEvaluation, Error> {
        if let Some(id) = eval_id {
            if let Some(bundle) = self.cache.get(id).await {
                return Ok(LoadedEvaluation {
                    eval_key: eval_key.to_string(),
                    data: EvaluationData::Loaded(Box::new(bundle)),
                    missing: MISSING_DISPLAY.to_string(),
                });
            }
        }

        let info = self.dataset.get_evaluation_info(eval_key).await?;
        let Some(eval_type) = info.evaluation_type() else {
            warn!(
                "Evaluation '{eval_key}' has unsupported type '{}'",
                info.config.eval_type
            );
            return Ok(LoadedEvaluation {
                eval_key: eval_key.to_string(),
                data: EvaluationData::Unsupported(UnsupportedEvaluation {
                    error: UNSUPPORTED_ERROR.to_string(),
                    info,
                }),
                missing: MISSING_DISPLAY.to_string(),
            });
        };

        let mask_targets = match eval_type {
            EvaluationType::Segmentation => self.mask_targets_for(&info.config.gt_field).await,
            EvaluationType::Classification(_) | EvaluationType::Detection => None,
        };

        let results = self.dataset.load_evaluation_results(eval_key).await?;
        results.validate(eval_key)?;

        let mut bundle = self.aggregator.aggregate(&info, eval_type, &results);
        bundle.mask_targets = mask_targets;

        if let Some(id) = eval_id {
            self.cache.set(id, &bundle, CACHE_TTL).await;
        }

        Ok(LoadedEvaluation {
            eval_key: eval_key.to_string(),
            data: EvaluationData::Loaded(Box::new(bundle)),
            missing: results.missing,
        })
    }

    /// Mask targets of `gt_field`, falling back to the dataset defaults
    async fn mask_targets_for(&self, gt_field: &str) -> Option<MaskTargets> {
        if let Some(targets) = self.dataset.mask_targets(gt_field).await {
            if !targets.is_empty() {
                return Some(targets);
            }
        }
        self.dataset
            .default_mask_targets()
            .await
            .filter(|targets| !targets.is_empty())
    }

    pub async fn load_pending_evaluations(&self) -> Result<Vec<PendingEvaluation>, Error> {
        let keys = self.dataset.list_evaluations().await?;
        let with_results = self.keys_with_results(&keys).await;
        Ok(self.reconcile_pending(&keys, &with_results).await)
    }

    async fn keys_with_results(&self, keys: &[String]) -> HashSet<String> {
        let mut with_results = HashSet::new();
        for key in keys {
            if self.dataset.has_evaluation_results(key).await {
                with_results.insert(key.clone());
            }
        }
        with_results
    }

    async fn reconcile_pending(
        &self,
        keys: &[String],
        with_results: &HashSet<String>,
    ) -> Vec<PendingEvaluation> {
        self.tracker
            .reconcile(self.dataset.id(), keys, |key| with_results.contains(key))
            .await
            .unwrap_or_else(|e| {
                warn!("Failed to reconcile pending evaluations: {e}");
                keys.iter()
                    .filter(|key| !with_results.contains(key.as_str()))
                    .map(PendingEvaluation::new)
                    .collect()
            })
    }

    // ==== Review state ====

    /// Set the review status of an evaluation, returning every status
    ///
    /// Returns `None` when the user lacks permission or the write failed; the
    /// user is notified either way.
    pub async fn set_status(
        &self,
        eval_id: &str,
        status: ReviewStatus,
    ) -> Option<BTreeMap<String, ReviewStatus>> {
        if !self.permissions.can_edit_status {
            self.deny("You do not have permission to update the status of this evaluation")
                .await;
            return None;
        }

        let updated = match self.repository.set_status(eval_id, status).await {
            Ok(()) => self.repository.get_statuses().await,
            Err(e) => Err(e),
        };
        match updated {
            Ok(statuses) => {
                self.notifier
                    .notify(
                        &format!("Status updated to {} successfully!", status.label()),
                        Severity::Success,
                    )
                    .await;
                Some(statuses)
            }
            Err(e) => {
                warn!("Failed to update status of evaluation {eval_id}: {e}");
                self.notifier
                    .notify("Failed to update the status of this evaluation", Severity::Error)
                    .await;
                None
            }
        }
    }

    /// Set the note of an evaluation, returning every note
    ///
    /// Returns `None` when the user lacks permission or the write failed.
    pub async fn set_note(&self, eval_id: &str, note: &str) -> Option<BTreeMap<String, String>> {
        if !self.permissions.can_edit_note {
            self.deny("You do not have permission to update the note of this evaluation")
                .await;
            return None;
        }

        let updated = match self.repository.set_note(eval_id, note).await {
            Ok(()) => self.repository.get_notes().await,
            Err(e) => Err(e),
        };
        match updated {
            Ok(notes) => {
                self.notifier
                    .notify("Note updated successfully!", Severity::Success)
                    .await;
                Some(notes)
            }
            Err(e) => {
                warn!("Failed to update note of evaluation {eval_id}: {e}");
                self.notifier
                    .notify("Failed to update the note of this evaluation", Severity::Error)
                    .await;
                None
            }
        }
    }

    async fn deny(&self, message: &str) {
        info!("Permission denied: {message}");
        self.notifier.notify(message, Severity::Error).await;
    }

    // ==== Evaluating ====

    /// Whether the user may open the evaluate-model prompt
    pub async fn on_evaluate_model(&self) -> bool {
        if !self.permissions.can_evaluate {
            self.deny("You do not have permission to evaluate models").await;
            return false;
        }
        true
    }

    /// Record a submitted evaluation job and return the reconciled pending list
    ///
    /// `result` is the submission result: `eval_key` is read from the result
    /// itself or from `context.params.eval_key`, and its `id`, when present,
    /// becomes the pending entry's document id.
    pub async fn on_evaluate_model_success(
        &self,
        result: &Value,
    ) -> Result<Vec<PendingEvaluation>, Error> {
        match submitted_evaluation(result) {
            Some(pending) => {
                if let Err(e) = self
                    .tracker
                    .record_submission(self.dataset.id(), pending)
                    .await
                {
                    warn!("Failed to record pending evaluation: {e}");
                }
            }
            None => warn!("Evaluation submission result has no eval_key; not tracking it"),
        }
        self.load_pending_evaluations().await
    }

    // ==== Views ====

    /// Resolve a view request into a change of the dataset grid
    pub async fn load_view(&self, request: &ViewRequest) -> Result<ViewChange, Error> {
        let ViewRequest::Drill {
            eval_key,
            compare_key,
            selection,
        } = request
        else {
            return Ok(ViewChange::Clear);
        };

        let view = self.dataset.load_evaluation_view(eval_key).await?;
        let info = self.dataset.get_evaluation_info(eval_key).await?;
        let comparison = match compare_key {
            Some(key) => Some(self.dataset.get_evaluation_info(key).await?),
            None => None,
        };

        let paths: &dyn LabelPaths = &*self.dataset;
        let predicate =
            DrillDownCompiler::new(paths).compile(&info, comparison.as_ref(), selection);

        Ok(match predicate {
            Some(predicate) => ViewChange::Set(view.filter(predicate)),
            None => {
                debug!("No drill-down for {selection:?} on '{eval_key}'");
                ViewChange::Unchanged
            }
        })
    }

    /// The unfiltered view of an evaluation
    pub async fn load_evaluation_view(&self, eval_key: &str) -> Result<DatasetView, Error> {
        self.dataset.load_evaluation_view(eval_key).await
    }
}

/// Pending entry described by an evaluation submission result
fn submitted_evaluation(result: &Value) -> Option<PendingEvaluation> {
    let eval_key = result
        .get("eval_key")
        .or_else(|| result.pointer("/context/params/eval_key"))
        .and_then(Value::as_str)?;

    let pending = PendingEvaluation::new(eval_key);
    Some(match result.get("id") {
        None | Some(Value::Null) => pending,
        Some(Value::String(id)) => pending.with_doc_id(id.as_str()),
        Some(other) => pending.with_doc_id(other.to_string()),
    })
}
