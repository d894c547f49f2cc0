//! Metrics aggregation for evaluation runs
//!
//! [`MetricsAggregator::aggregate`] turns an [`EvaluationResults`] view and the
//! run's [`EvaluationInfo`] into a [`MetricsBundle`]: summary scalars, per-class
//! statistics and confusion matrices under five class orderings. Aggregation is
//! pure and deterministic, so concurrent computations of the same run agree.

mod colorscale;
mod confusion;
mod report;

pub use colorscale::{ColorStop, Colorscale, LogColorscale, ORANGES};
pub use confusion::{
    ground_truth_frequencies, ClassOrderings, ConfusionMatrices, ConfusionMatrix, ConfusionOrdering,
};
pub use report::{ClassReport, ClassificationReport};

use crate::entities::{ClassificationMethod, EvaluationInfo, EvaluationType};
use crate::labels::ClassLabel;
use crate::results::EvaluationResults;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tracing::{debug, warn};

/// Mapping from a segmentation mask value to its class name
pub type MaskTargets = BTreeMap<String, String>;

/// Per-class statistics; fields are absent when the type does not report them
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClassMetrics {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iou: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub precision: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recall: Option<f64>,

    #[serde(default, rename = "f1-score", skip_serializing_if = "Option::is_none")]
    pub f1_score: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub support: Option<u64>,
}

/// True positive / false positive / false negative counts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutcomeCounts {
    pub tp: u64,
    pub fp: u64,
    pub fn_count: u64,
}

/// Summary scalars of a run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateMetrics {
    pub accuracy: f64,
    pub precision: f64,
    pub recall: f64,
    pub fscore: f64,
    pub support: u64,
    pub average_confidence: Option<f64>,
    pub tp: Option<u64>,
    pub fp: Option<u64>,
    #[serde(rename = "fn")]
    pub fn_count: Option<u64>,
    #[serde(rename = "mAP")]
    pub map: Option<f64>,
    #[serde(rename = "mAR")]
    pub mar: Option<f64>,
}

/// Everything the panel shows for one evaluation run
///
/// Computed once per evaluation id and cached; never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsBundle {
    pub metrics: AggregateMetrics,
    pub info: EvaluationInfo,
    pub confusion_matrices: ConfusionMatrices,
    pub per_class_metrics: BTreeMap<String, ClassMetrics>,
    #[serde(default)]
    pub mask_targets: Option<MaskTargets>,
}

/// Average of `values` keyed by predicted class, 0.0 for classes never predicted
///
/// Items without a value still count, contributing 0.0 to the sum.
pub fn average_by_predicted_class(
    results: &EvaluationResults,
    values: &[Option<f64>],
) -> BTreeMap<String, f64> {
    let mut sums: HashMap<&str, (f64, u64)> = HashMap::new();
    for (pred, value) in results.ypred.iter().zip(values) {
        if let ClassLabel::Class(name) = pred {
            let entry = sums.entry(name.as_str()).or_insert((0.0, 0));
            entry.0 += value.unwrap_or(0.0);
            entry.1 += 1;
        }
    }

    results
        .classes
        .iter()
        .map(|c| {
            let average = match sums.get(c.as_str()) {
                Some(&(sum, count)) if count > 0 => sum / count as f64,
                _ => 0.0,
            };
            (c.clone(), average)
        })
        .collect()
}

/// tp / fp / fn counts for binary classification and detection runs
///
/// Binary classification expects exactly `[negative, positive]` classes.
/// Other types have no such counts.
pub fn outcome_counts(
    eval_type: EvaluationType,
    results: &EvaluationResults,
) -> Option<OutcomeCounts> {
    let pairs = || results.ytrue.iter().zip(&results.ypred);
    match eval_type {
        EvaluationType::Classification(ClassificationMethod::Binary) => {
            let [_, positive] = results.classes.as_slice() else {
                warn!(
                    "Binary classification results have {} classes, expected 2",
                    results.classes.len()
                );
                return None;
            };
            let positive = ClassLabel::Class(positive.clone());
            let mut counts = OutcomeCounts {
                tp: 0,
                fp: 0,
                fn_count: 0,
            };
            for (truth, pred) in pairs() {
                match (*truth == positive, *pred == positive) {
                    (true, true) => counts.tp += 1,
                    (false, true) => counts.fp += 1,
                    (true, false) => counts.fn_count += 1,
                    (false, false) => {}
                }
            }
            Some(counts)
        }
        EvaluationType::Detection => {
            let mut counts = OutcomeCounts {
                tp: 0,
                fp: 0,
                fn_count: 0,
            };
            for (truth, pred) in pairs() {
                match (truth, pred) {
                    (ClassLabel::Missing, _) => counts.fp += 1,
                    (_, ClassLabel::Missing) => counts.fn_count += 1,
                    (t, p) if t == p => counts.tp += 1,
                    _ => {}
                }
            }
            Some(counts)
        }
        EvaluationType::Classification(_) | EvaluationType::Segmentation => None,
    }
}

/// Mean of the per-class confidences that were computed, `None` if there are none
pub fn average_confidence(per_class: &BTreeMap<String, ClassMetrics>) -> Option<f64> {
    let confidences: Vec<f64> = per_class.values().filter_map(|m| m.confidence).collect();
    if confidences.is_empty() {
        None
    } else {
        Some(confidences.iter().sum::<f64>() / confidences.len() as f64)
    }
}

/// Builds [`MetricsBundle`]s
#[derive(Clone)]
pub struct MetricsAggregator {
    colorscale: Arc<dyn Colorscale>,
}

impl Default for MetricsAggregator {
    fn default() -> Self {
        Self::new(Arc::new(LogColorscale::default()))
    }
}

impl std::fmt::Debug for MetricsAggregator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetricsAggregator").finish_non_exhaustive()
    }
}

impl MetricsAggregator {
    pub fn new(colorscale: Arc<dyn Colorscale>) -> Self {
        Self { colorscale }
    }

    /// Per-class confidence, IoU, precision, recall, F1 and support
    pub fn per_class_metrics(
        &self,
        eval_type: EvaluationType,
        results: &EvaluationResults,
        report: &ClassificationReport,
    ) -> BTreeMap<String, ClassMetrics> {
        let confidences = eval_type
            .reports_confidence()
            .then(|| results.confs.as_deref())
            .flatten()
            .map(|confs| average_by_predicted_class(results, confs));
        let ious = eval_type
            .reports_iou()
            .then(|| results.ious.as_deref())
            .flatten()
            .map(|ious| average_by_predicted_class(results, ious));

        results
            .classes
            .iter()
            .map(|class| {
                let mut metrics = ClassMetrics {
                    confidence: confidences.as_ref().and_then(|c| c.get(class).copied()),
                    iou: ious.as_ref().and_then(|i| i.get(class).copied()),
                    ..ClassMetrics::default()
                };
                if let Some(entry) = report.get(class) {
                    metrics.precision = Some(entry.precision);
                    metrics.recall = Some(entry.recall);
                    metrics.f1_score = Some(entry.f1_score);
                    metrics.support = Some(entry.support);
                }
                (class.clone(), metrics)
            })
            .collect()
    }

    /// Compute the metrics bundle of a run
    ///
    /// `eval_type` must be the resolved type of `info`. `mask_targets` is left
    /// empty; it comes from the dataset, not the results.
    pub fn aggregate(
        &self,
        info: &EvaluationInfo,
        eval_type: EvaluationType,
        results: &EvaluationResults,
    ) -> MetricsBundle {
        debug!(
            "Aggregating {} items of evaluation '{}' ({:?})",
            results.len(),
            info.key,
            eval_type
        );

        let report = ClassificationReport::compute(results);
        let per_class_metrics = self.per_class_metrics(eval_type, results, &report);
        let counts = outcome_counts(eval_type, results);

        let metrics = AggregateMetrics {
            accuracy: report.accuracy,
            precision: report.precision,
            recall: report.recall,
            fscore: report.fscore,
            support: report.support,
            average_confidence: average_confidence(&per_class_metrics),
            tp: counts.map(|c| c.tp),
            fp: counts.map(|c| c.fp),
            fn_count: counts.map(|c| c.fn_count),
            map: results.mean_average_precision(),
            mar: results.mean_average_recall(),
        };

        MetricsBundle {
            metrics,
            info: info.clone(),
            confusion_matrices: ConfusionMatrices::compute(results, self.colorscale.as_ref()),
            per_class_metrics,
            mask_targets: None,
        }
    }
}
