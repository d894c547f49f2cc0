//! Read-only view over the per-item results of one evaluation run

use crate::error::{Error, Result};
use crate::labels::{ClassLabel, MISSING_DISPLAY};
use derive_builder::Builder;
use serde::{Deserialize, Serialize};

fn default_missing() -> String {
    MISSING_DISPLAY.to_string()
}

/// Per-item ground truth / prediction pairs of one evaluation run
///
/// `ytrue`, `ypred` and, when present, `confs` and `ious` have one entry per
/// scored item. `missing` is only the text the dataset renders for
/// [`ClassLabel::Missing`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Builder)]
#[builder(setter(into))]
pub struct EvaluationResults {
    /// Ordered class list of the run
    pub classes: Vec<String>,

    pub ytrue: Vec<ClassLabel>,

    pub ypred: Vec<ClassLabel>,

    #[builder(default, setter(into, strip_option))]
    #[serde(default)]
    pub confs: Option<Vec<Option<f64>>>,

    #[builder(default, setter(into, strip_option))]
    #[serde(default)]
    pub ious: Option<Vec<Option<f64>>>,

    #[builder(default = "default_missing()")]
    #[serde(default = "default_missing")]
    pub missing: String,

    /// Mean average precision, when the evaluation method computes one
    #[builder(default, setter(into, strip_option))]
    #[serde(default, rename = "mAP")]
    pub map: Option<f64>,

    /// Mean average recall, when the evaluation method computes one
    #[builder(default, setter(into, strip_option))]
    #[serde(default, rename = "mAR")]
    pub mar: Option<f64>,
}

impl EvaluationResults {
    /// Number of scored items
    pub fn len(&self) -> usize {
        self.ytrue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ytrue.is_empty()
    }

    /// Check that every per-item sequence has the same length
    pub fn validate(&self, eval_key: &str) -> Result<()> {
        let expected = self.ytrue.len();
        let check = |name: &str, actual: usize| -> Result<()> {
            if actual == expected {
                Ok(())
            } else {
                Err(Error::malformed_results(
                    eval_key,
                    format!("{name} has {actual} entries, ytrue has {expected}"),
                ))
            }
        };

        check("ypred", self.ypred.len())?;
        if let Some(confs) = &self.confs {
            check("confs", confs.len())?;
        }
        if let Some(ious) = &self.ious {
            check("ious", ious.len())?;
        }
        Ok(())
    }

    /// Mean average precision, `None` when not applicable to this run
    pub fn mean_average_precision(&self) -> Option<f64> {
        self.map.filter(|v| v.is_finite())
    }

    /// Mean average recall, `None` when not applicable to this run
    pub fn mean_average_recall(&self) -> Option<f64> {
        self.mar.filter(|v| v.is_finite())
    }
}
