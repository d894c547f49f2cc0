//! Classification report over (ytrue, ypred)

use crate::labels::ClassLabel;
use crate::results::EvaluationResults;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Report entry for a single class
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClassReport {
    pub precision: f64,
    pub recall: f64,
    pub f1_score: f64,
    pub support: u64,
}

/// Per-class precision / recall / F1 / support plus micro averages
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ClassificationReport {
    pub classes: BTreeMap<String, ClassReport>,
    pub accuracy: f64,
    pub precision: f64,
    pub recall: f64,
    pub fscore: f64,
    pub support: u64,
}

#[derive(Debug, Default, Clone, Copy)]
struct Tally {
    true_positives: u64,
    predicted: u64,
    actual: u64,
}

fn ratio(numerator: u64, denominator: u64) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

fn harmonic_mean(precision: f64, recall: f64) -> f64 {
    if precision + recall == 0.0 {
        0.0
    } else {
        2.0 * precision * recall / (precision + recall)
    }
}

impl ClassificationReport {
    /// Compute the report for every class of `results` that occurs at least
    /// once in `ytrue` or `ypred`
    ///
    /// Precision, recall and F1 are 0.0 when their denominator is zero.
    pub fn compute(results: &EvaluationResults) -> Self {
        let mut tallies: HashMap<&str, Tally> = results
            .classes
            .iter()
            .map(|c| (c.as_str(), Tally::default()))
            .collect();

        for (truth, pred) in results.ytrue.iter().zip(&results.ypred) {
            if let ClassLabel::Class(t) = truth {
                if let Some(tally) = tallies.get_mut(t.as_str()) {
                    tally.actual += 1;
                    if truth == pred {
                        tally.true_positives += 1;
                    }
                }
            }
            if let ClassLabel::Class(p) = pred {
                if let Some(tally) = tallies.get_mut(p.as_str()) {
                    tally.predicted += 1;
                }
            }
        }

        let mut report = Self::default();
        let mut total = Tally::default();
        for (class, tally) in tallies {
            if tally.actual == 0 && tally.predicted == 0 {
                continue;
            }
            total.true_positives += tally.true_positives;
            total.predicted += tally.predicted;
            total.actual += tally.actual;

            let precision = ratio(tally.true_positives, tally.predicted);
            let recall = ratio(tally.true_positives, tally.actual);
            report.classes.insert(
                class.to_string(),
                ClassReport {
                    precision,
                    recall,
                    f1_score: harmonic_mean(precision, recall),
                    support: tally.actual,
                },
            );
        }

        let correct = results
            .ytrue
            .iter()
            .zip(&results.ypred)
            .filter(|(t, p)| t == p)
            .count() as u64;
        report.accuracy = ratio(correct, results.ytrue.len() as u64);
        report.precision = ratio(total.true_positives, total.predicted);
        report.recall = ratio(total.true_positives, total.actual);
        report.fscore = harmonic_mean(report.precision, report.recall);
        report.support = total.actual;
        report
    }

    pub fn get(&self, class: &str) -> Option<&ClassReport> {
        self.classes.get(class)
    }
}
