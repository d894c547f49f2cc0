//! Dataset collaborator consumed by the panel

use async_trait::async_trait;
use modeleval_core::query::ViewStage;
use modeleval_core::{
    Error, EvaluationInfo, EvaluationResults, FilterPredicate, LabelPaths, MaskTargets,
};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A view over the samples of one evaluation, narrowed by view stages
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetView {
    pub dataset_id: String,
    pub eval_key: String,
    #[serde(default)]
    pub stages: Vec<ViewStage>,
}

impl DatasetView {
    pub fn new(dataset_id: impl Into<String>, eval_key: impl Into<String>) -> Self {
        Self {
            dataset_id: dataset_id.into(),
            eval_key: eval_key.into(),
            stages: Vec::new(),
        }
    }

    /// Append the stages of `predicate` to this view
    pub fn filter(mut self, predicate: FilterPredicate) -> Self {
        self.stages.extend(predicate.stages);
        self
    }
}

impl fmt::Display for DatasetView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.load_evaluation_view(\"{}\")", self.dataset_id, self.eval_key)?;
        for stage in &self.stages {
            write!(f, ".{stage}")?;
        }
        Ok(())
    }
}

/// The dataset an evaluation panel is opened on
///
/// Label list paths are resolved through the [`LabelPaths`] supertrait.
#[async_trait]
pub trait Dataset: LabelPaths {
    fn id(&self) -> &str;

    /// Every evaluation key of the dataset, with or without results
    async fn list_evaluations(&self) -> Result<Vec<String>, Error>;

    /// Stable identity of an evaluation run; `None` when it cannot be resolved
    async fn evaluation_id(&self, eval_key: &str) -> Option<String>;

    async fn has_evaluation_results(&self, eval_key: &str) -> bool;

    async fn get_evaluation_info(&self, eval_key: &str) -> Result<EvaluationInfo, Error>;

    async fn load_evaluation_results(&self, eval_key: &str) -> Result<EvaluationResults, Error>;

    async fn load_evaluation_view(&self, eval_key: &str) -> Result<DatasetView, Error>;

    /// Mask targets declared for a label field
    async fn mask_targets(&self, field: &str) -> Option<MaskTargets>;

    async fn default_mask_targets(&self) -> Option<MaskTargets>;
}
