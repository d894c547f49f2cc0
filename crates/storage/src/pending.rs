//! Reconciliation of submitted evaluation jobs with a dataset's evaluations

use crate::PanelRepository;
use modeleval_core::{Error, PendingEvaluation};
use std::collections::HashSet;
use tracing::{debug, info};

/// Tracks evaluations that were submitted but have not materialized yet
///
/// The stored list is read and written back whole, so two sessions submitting
/// at once can interleave. Reconciliation converges anyway: any later call
/// drops every entry whose evaluation has since appeared.
#[derive(Debug, Clone)]
pub struct PendingEvaluationsTracker {
    repository: PanelRepository,
}

impl PendingEvaluationsTracker {
    pub fn new(repository: PanelRepository) -> Self {
        Self { repository }
    }

    /// Pending evaluations of `dataset_id` given its current evaluation keys
    ///
    /// Stored entries whose key now appears in `current_keys` are dropped and
    /// the remainder written back, only when something was dropped. Keys in
    /// `current_keys` without results are reported as pending even if they
    /// were never recorded. Previously tracked entries come first.
    pub async fn reconcile<F>(
        &self,
        dataset_id: &str,
        current_keys: &[String],
        has_results: F,
    ) -> Result<Vec<PendingEvaluation>, Error>
    where
        F: Fn(&str) -> bool,
    {
        let stored = self.repository.get_pending_evaluations(dataset_id).await?;
        let stored_count = stored.len();

        let current: HashSet<&str> = current_keys.iter().map(String::as_str).collect();
        let kept: Vec<PendingEvaluation> = stored
            .into_iter()
            .filter(|p| !current.contains(p.eval_key.as_str()))
            .collect();

        if kept.len() != stored_count {
            info!(
                "{} pending evaluations of dataset {dataset_id} have materialized",
                stored_count - kept.len()
            );
            self.repository
                .set_pending_evaluations(dataset_id, kept.clone())
                .await?;
        }

        let discovered = current_keys
            .iter()
            .filter(|key| !has_results(key.as_str()))
            .map(PendingEvaluation::new);

        let pending: Vec<PendingEvaluation> = kept.into_iter().chain(discovered).collect();
        debug!(
            "Dataset {dataset_id} has {} pending evaluations",
            pending.len()
        );
        Ok(pending)
    }

    /// Append a submitted evaluation to the pending list of `dataset_id`
    pub async fn record_submission(
        &self,
        dataset_id: &str,
        pending: PendingEvaluation,
    ) -> Result<(), Error> {
        let mut list = self.repository.get_pending_evaluations(dataset_id).await?;
        info!(
            "Recording pending evaluation '{}' for dataset {dataset_id}",
            pending.eval_key
        );
        list.push(pending);
        self.repository.set_pending_evaluations(dataset_id, list).await
    }
}
