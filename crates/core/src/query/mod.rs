//! Drill-down query compilation
//!
//! A user selection in the panel (a class, a confusion matrix cell, or a
//! tp/fp/fn style field) is compiled into a [`FilterPredicate`] over the
//! evaluation's dataset view. Compilation is pure; the only dataset knowledge
//! it needs is where a label field keeps its list of labels, supplied through
//! [`LabelPaths`].

mod expr;

pub use expr::{Expr, FilterPredicate, ViewStage};

use crate::entities::{ClassificationMethod, EvaluationInfo, EvaluationType};
use crate::labels::ClassLabel;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Resolves the path of the label list inside a label field
///
/// For a detections field `ground_truth` this is `ground_truth.detections`.
pub trait LabelPaths: Send + Sync {
    fn label_list_path(&self, field: &str) -> String;
}

/// [`LabelPaths`] for datasets whose label fields are `Detections`
#[derive(Debug, Clone, Copy, Default)]
pub struct DetectionsPaths;

impl LabelPaths for DetectionsPaths {
    fn label_list_path(&self, field: &str) -> String {
        format!("{field}.detections")
    }
}

/// What the user selected
///
/// For matrix cells `x` is the predicted class (column) and `y` the ground
/// truth class (row).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Selection {
    Class { x: ClassLabel },
    Matrix { x: ClassLabel, y: ClassLabel },
    Field { field: String },
}

/// Label fields of the comparison evaluation that add OR terms to class selections
struct ComparisonFields<'a> {
    gt_field: Option<&'a str>,
    pred_field: &'a str,
}

/// Compiles [`Selection`]s into [`FilterPredicate`]s
pub struct DrillDownCompiler<'a> {
    paths: &'a dyn LabelPaths,
}

impl<'a> DrillDownCompiler<'a> {
    pub fn new(paths: &'a dyn LabelPaths) -> Self {
        Self { paths }
    }

    /// Compile a selection against the primary evaluation
    ///
    /// `comparison` is a second evaluation shown alongside; its prediction
    /// field, and its ground truth field when it differs from the primary's,
    /// extend class selections. Returns `None` when the evaluation type has no
    /// drill-down (segmentation, unsupported types).
    pub fn compile(
        &self,
        primary: &EvaluationInfo,
        comparison: Option<&EvaluationInfo>,
        selection: &Selection,
    ) -> Option<FilterPredicate> {
        let comparison = comparison.map(|other| ComparisonFields {
            gt_field: (other.config.gt_field != primary.config.gt_field)
                .then_some(other.config.gt_field.as_str()),
            pred_field: other.config.pred_field.as_str(),
        });

        let predicate = match primary.evaluation_type()? {
            EvaluationType::Classification(method) => {
                Self::classification(primary, method, comparison.as_ref(), selection)
            }
            EvaluationType::Detection => self.detection(primary, comparison.as_ref(), selection),
            EvaluationType::Segmentation => None,
        };

        debug!(
            "Compiled {:?} on '{}' to {}",
            selection,
            primary.key,
            predicate
                .as_ref()
                .map_or_else(|| "no-op".to_string(), ToString::to_string)
        );
        predicate
    }

    fn classification(
        info: &EvaluationInfo,
        method: ClassificationMethod,
        comparison: Option<&ComparisonFields<'_>>,
        selection: &Selection,
    ) -> Option<FilterPredicate> {
        let gt = info.config.gt_field.as_str();
        let pred = info.config.pred_field.as_str();
        let label = |field: &str| format!("{field}.label");

        let expr = match selection {
            Selection::Class { x } => {
                let mut expr = Expr::field_eq(label(gt), x).or(Expr::field_eq(label(pred), x));
                if let Some(other) = comparison {
                    if let Some(gt2) = other.gt_field {
                        expr = expr.or(Expr::field_eq(label(gt2), x));
                    }
                    expr = expr.or(Expr::field_eq(label(other.pred_field), x));
                }
                expr
            }
            Selection::Matrix { x, y } => {
                Expr::field_eq(label(gt), y).and(Expr::field_eq(label(pred), x))
            }
            Selection::Field { field } => match method {
                ClassificationMethod::Binary => Expr::field_eq(&info.key, field.to_uppercase()),
                ClassificationMethod::Simple | ClassificationMethod::TopK => {
                    Expr::field_eq(&info.key, field.as_str())
                }
            },
        };
        Some(FilterPredicate::new().matching(expr))
    }

    fn detection(
        &self,
        info: &EvaluationInfo,
        comparison: Option<&ComparisonFields<'_>>,
        selection: &Selection,
    ) -> Option<FilterPredicate> {
        let eval_key = info.key.as_str();
        let gt = info.config.gt_field.as_str();
        let pred = info.config.pred_field.as_str();
        let is_label = |class: &ClassLabel| Expr::field_eq("label", class);
        let has_outcome = |outcome: &str| Expr::field_eq(eval_key, outcome);

        let predicate = match selection {
            Selection::Class { x } => {
                let mut fields = vec![gt, pred];
                if let Some(other) = comparison {
                    fields.extend(other.gt_field);
                    fields.push(other.pred_field);
                }

                let mut predicate = FilterPredicate::new();
                let mut any_present: Option<Expr> = None;
                for field in fields {
                    predicate = predicate.filter_labels(field, is_label(x), false);
                    let present = Expr::non_empty(self.paths.label_list_path(field));
                    any_present = Some(match any_present {
                        Some(expr) => expr.or(present),
                        None => present,
                    });
                }
                match any_present {
                    Some(expr) => predicate.matching(expr),
                    None => predicate,
                }
            }
            Selection::Matrix { x, y } if y.is_missing() => {
                // false positives of class x
                FilterPredicate::new().filter_labels(pred, is_label(x).and(has_outcome("fp")), true)
            }
            Selection::Matrix { x, y } if x.is_missing() => {
                // false negatives of class y
                FilterPredicate::new().filter_labels(gt, is_label(y).and(has_outcome("fn")), true)
            }
            Selection::Matrix { x, y } => FilterPredicate::new()
                .filter_labels(gt, is_label(y), false)
                .filter_labels(pred, is_label(x), false)
                .matching(
                    Expr::non_empty(self.paths.label_list_path(gt))
                        .and(Expr::non_empty(self.paths.label_list_path(pred))),
                ),
            Selection::Field { field } if field == "tp" => FilterPredicate::new()
                .filter_labels(gt, has_outcome("tp"), false)
                .filter_labels(pred, has_outcome("tp"), true),
            Selection::Field { field } if field == "fn" => {
                FilterPredicate::new().filter_labels(gt, has_outcome("fn"), true)
            }
            Selection::Field { field } => {
                FilterPredicate::new().filter_labels(pred, has_outcome(field.as_str()), true)
            }
        };
        Some(predicate)
    }
}
