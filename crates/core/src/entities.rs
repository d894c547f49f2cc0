use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use strum_macros::{Display, EnumString};

/// Classification evaluation method
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum ClassificationMethod {
    Simple,
    TopK,
    Binary,
}

/// Evaluation type of a run the panel knows how to present
///
/// Built from the raw [`EvaluationConfig`] with [`EvaluationType::from_config`];
/// a config whose `type` is anything else is unsupported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EvaluationType {
    Classification(ClassificationMethod),
    Detection,
    Segmentation,
}

impl EvaluationType {
    /// Resolve the evaluation type of a config, or `None` if it is unsupported
    ///
    /// An absent or unrecognised classification method is treated as `simple`.
    pub fn from_config(config: &EvaluationConfig) -> Option<Self> {
        match config.eval_type.as_str() {
            "classification" => {
                let method = config
                    .method
                    .as_deref()
                    .and_then(|m| ClassificationMethod::from_str(m).ok())
                    .unwrap_or(ClassificationMethod::Simple);
                Some(Self::Classification(method))
            }
            "detection" => Some(Self::Detection),
            "segmentation" => Some(Self::Segmentation),
            _ => None,
        }
    }

    /// Whether per-class average confidence is reported
    pub fn reports_confidence(&self) -> bool {
        matches!(self, Self::Classification(_) | Self::Detection)
    }

    /// Whether per-class average IoU is reported
    pub fn reports_iou(&self) -> bool {
        matches!(self, Self::Detection)
    }

    pub fn is_binary_classification(&self) -> bool {
        matches!(self, Self::Classification(ClassificationMethod::Binary))
    }
}

/// Raw evaluation config as stored by the dataset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationConfig {
    #[serde(rename = "type")]
    pub eval_type: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,

    pub gt_field: String,

    pub pred_field: String,

    /// Method-specific parameters, carried through serialization untouched
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl EvaluationConfig {
    pub fn new(
        eval_type: impl Into<String>,
        method: Option<&str>,
        gt_field: impl Into<String>,
        pred_field: impl Into<String>,
    ) -> Self {
        Self {
            eval_type: eval_type.into(),
            method: method.map(str::to_string),
            gt_field: gt_field.into(),
            pred_field: pred_field.into(),
            extra: serde_json::Map::new(),
        }
    }
}

/// Information about one completed evaluation run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationInfo {
    /// Human-assigned key, unique per dataset
    pub key: String,

    /// Stable identity of the run
    #[serde(default)]
    pub id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,

    pub config: EvaluationConfig,
}

impl EvaluationInfo {
    pub fn new(key: impl Into<String>, id: Option<&str>, config: EvaluationConfig) -> Self {
        Self {
            key: key.into(),
            id: id.map(str::to_string),
            timestamp: None,
            config,
        }
    }

    pub fn evaluation_type(&self) -> Option<EvaluationType> {
        EvaluationType::from_config(&self.config)
    }
}

/// An evaluation that currently has results, as listed to the UI
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluationSummary {
    pub key: String,
    pub id: Option<String>,
}

/// An evaluation that was requested but has no materialized results yet
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PendingEvaluation {
    pub eval_key: String,

    /// Job / document id of the submission, when known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doc_id: Option<String>,
}

impl PendingEvaluation {
    pub fn new(eval_key: impl Into<String>) -> Self {
        Self {
            eval_key: eval_key.into(),
            doc_id: None,
        }
    }

    pub fn with_doc_id(mut self, doc_id: impl Into<String>) -> Self {
        self.doc_id = Some(doc_id.into());
        self
    }
}

/// Review status of an evaluation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ReviewStatus {
    NeedsReview,
    InReview,
    Reviewed,
}

impl ReviewStatus {
    /// Human readable label used in notifications
    pub fn label(&self) -> &'static str {
        match self {
            Self::NeedsReview => "needs review",
            Self::InReview => "in review",
            Self::Reviewed => "reviewed",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(eval_type: &str, method: Option<&str>) -> EvaluationConfig {
        EvaluationConfig::new(eval_type, method, "ground_truth", "predictions")
    }

    #[test]
    fn test_evaluation_type_from_config() {
        assert_eq!(
            EvaluationType::from_config(&config("classification", Some("binary"))),
            Some(EvaluationType::Classification(ClassificationMethod::Binary))
        );
        assert_eq!(
            EvaluationType::from_config(&config("classification", Some("top-k"))),
            Some(EvaluationType::Classification(ClassificationMethod::TopK))
        );
        assert_eq!(
            EvaluationType::from_config(&config("classification", None)),
            Some(EvaluationType::Classification(ClassificationMethod::Simple))
        );
        assert_eq!(
            EvaluationType::from_config(&config("detection", Some("coco"))),
            Some(EvaluationType::Detection)
        );
        assert_eq!(
            EvaluationType::from_config(&config("segmentation", None)),
            Some(EvaluationType::Segmentation)
        );
        assert_eq!(EvaluationType::from_config(&config("regression", None)), None);
    }

    #[test]
    fn test_reported_fields_per_type() {
        let binary = EvaluationType::Classification(ClassificationMethod::Binary);
        assert!(binary.reports_confidence());
        assert!(!binary.reports_iou());
        assert!(EvaluationType::Detection.reports_iou());
        assert!(!EvaluationType::Segmentation.reports_confidence());
    }

    #[test]
    fn test_config_round_trips_extra_fields() {
        let json = serde_json::json!({
            "type": "detection",
            "method": "coco",
            "gt_field": "ground_truth",
            "pred_field": "predictions",
            "iou": 0.5,
        });
        let parsed: EvaluationConfig = serde_json::from_value(json.clone()).unwrap();
        assert_eq!(parsed.extra.get("iou"), Some(&serde_json::json!(0.5)));
        assert_eq!(serde_json::to_value(&parsed).unwrap(), json);
    }

    #[test]
    fn test_review_status_labels() {
        let status: ReviewStatus = serde_json::from_str(r#""in_review""#).unwrap();
        assert_eq!(status, ReviewStatus::InReview);
        assert_eq!(status.label(), "in review");
        assert_eq!(ReviewStatus::NeedsReview.to_string(), "needs_review");
    }
}
