//! Confusion matrices under the five class-axis orderings

use super::colorscale::{ColorStop, Colorscale};
use crate::labels::ClassLabel;
use crate::results::EvaluationResults;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use strum_macros::{Display, EnumIter};

/// Ordering of the class axis, applied identically to rows and columns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumIter)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ConfusionOrdering {
    /// Class order of the evaluation run
    Default,
    /// Alphabetical
    Az,
    /// Reverse alphabetical
    Za,
    /// Most common ground truth first
    Mc,
    /// Least common ground truth first
    Lc,
}

/// A confusion matrix with rows = ground truth and columns = prediction
///
/// `classes` labels both axes and ends with [`ClassLabel::Missing`], so the
/// last row holds false positives and the last column false negatives.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfusionMatrix {
    pub classes: Vec<ClassLabel>,
    pub matrix: Vec<Vec<u64>>,
    pub colorscale: Vec<ColorStop>,
}

impl ConfusionMatrix {
    /// Sum of every cell
    pub fn total(&self) -> u64 {
        self.matrix.iter().flatten().sum()
    }

    /// Count for the (ground truth, prediction) cell
    pub fn cell(&self, truth: &ClassLabel, pred: &ClassLabel) -> Option<u64> {
        let row = self.classes.iter().position(|c| c == truth)?;
        let col = self.classes.iter().position(|c| c == pred)?;
        Some(self.matrix[row][col])
    }
}

/// Confusion matrices for every [`ConfusionOrdering`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfusionMatrices {
    pub default: ConfusionMatrix,
    pub az: ConfusionMatrix,
    pub za: ConfusionMatrix,
    pub mc: ConfusionMatrix,
    pub lc: ConfusionMatrix,
}

impl ConfusionMatrices {
    pub fn compute(results: &EvaluationResults, colorscale: &dyn Colorscale) -> Self {
        let orderings = ClassOrderings::compute(results);
        let build = |classes: &[String]| {
            let (classes, matrix) = tabulate(results, classes);
            let colorscale = colorscale.colorscale(&matrix);
            ConfusionMatrix {
                classes,
                matrix,
                colorscale,
            }
        };

        Self {
            default: build(&orderings.default),
            az: build(&orderings.az),
            za: build(&orderings.za),
            mc: build(&orderings.mc),
            lc: build(&orderings.lc),
        }
    }

    pub fn get(&self, ordering: ConfusionOrdering) -> &ConfusionMatrix {
        match ordering {
            ConfusionOrdering::Default => &self.default,
            ConfusionOrdering::Az => &self.az,
            ConfusionOrdering::Za => &self.za,
            ConfusionOrdering::Mc => &self.mc,
            ConfusionOrdering::Lc => &self.lc,
        }
    }
}

/// The five class orderings of a run (the missing marker is not included)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassOrderings {
    pub default: Vec<String>,
    pub az: Vec<String>,
    pub za: Vec<String>,
    pub mc: Vec<String>,
    pub lc: Vec<String>,
}

impl ClassOrderings {
    /// Derive the orderings from the run's class list and ground-truth frequencies
    ///
    /// `mc` / `lc` rank classes by ground-truth count, ties broken by default
    /// order. Classes that never occur in ground truth go last in both, in
    /// default order.
    pub fn compute(results: &EvaluationResults) -> Self {
        let default = results.classes.clone();

        let mut az = default.clone();
        az.sort();
        let mut za = az.clone();
        za.reverse();

        let freq = ground_truth_frequencies(results);
        let (seen, unseen): (Vec<&String>, Vec<&String>) = results
            .classes
            .iter()
            .partition(|c| freq.get(c.as_str()).copied().unwrap_or(0) > 0);
        let count = |c: &String| freq.get(c.as_str()).copied().unwrap_or(0);

        // sort_by_key is stable, so ties keep default order
        let mut mc = seen.clone();
        mc.sort_by_key(|c| std::cmp::Reverse(count(*c)));
        let mut lc = seen;
        lc.sort_by_key(|c| count(*c));

        let finish = |ranked: Vec<&String>| -> Vec<String> {
            ranked
                .into_iter()
                .chain(unseen.iter().copied())
                .cloned()
                .collect()
        };

        Self {
            default,
            az,
            za,
            mc: finish(mc),
            lc: finish(lc),
        }
    }
}

/// Ground-truth occurrence count per class, excluding the missing marker
pub fn ground_truth_frequencies(results: &EvaluationResults) -> HashMap<&str, u64> {
    let mut freq = HashMap::new();
    for label in &results.ytrue {
        if let ClassLabel::Class(name) = label {
            *freq.entry(name.as_str()).or_insert(0) += 1;
        }
    }
    freq
}

/// Count (truth, prediction) pairs over `classes` plus the missing marker
///
/// Pairs involving a class outside `classes` fall into an "other" bucket that
/// is not tabulated.
fn tabulate(results: &EvaluationResults, classes: &[String]) -> (Vec<ClassLabel>, Vec<Vec<u64>>) {
    let missing_index = classes.len();
    let index: HashMap<&str, usize> = classes
        .iter()
        .enumerate()
        .map(|(i, c)| (c.as_str(), i))
        .collect();
    let position = |label: &ClassLabel| match label {
        ClassLabel::Class(name) => index.get(name.as_str()).copied(),
        ClassLabel::Missing => Some(missing_index),
    };

    let size = classes.len() + 1;
    let mut matrix = vec![vec![0u64; size]; size];
    for (truth, pred) in results.ytrue.iter().zip(&results.ypred) {
        if let (Some(row), Some(col)) = (position(truth), position(pred)) {
            matrix[row][col] += 1;
        }
    }

    let labels = classes
        .iter()
        .cloned()
        .map(ClassLabel::Class)
        .chain(std::iter::once(ClassLabel::Missing))
        .collect();
    (labels, matrix)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::colorscale::LogColorscale;
    use crate::results::EvaluationResultsBuilder;
    use strum::IntoEnumIterator;

    fn detection_results() -> EvaluationResults {
        let l = |v: Option<&str>| v.map_or(ClassLabel::Missing, ClassLabel::class);
        EvaluationResultsBuilder::default()
            .classes(vec!["dog".to_string(), "bird".to_string(), "cat".to_string()])
            .ytrue(vec![l(Some("cat")), l(Some("cat")), l(Some("dog")), l(None), l(Some("cat"))])
            .ypred(vec![l(Some("cat")), l(None), l(Some("dog")), l(Some("dog")), l(Some("dog"))])
            .build()
            .unwrap()
    }

    #[test]
    fn test_orderings() {
        let orderings = ClassOrderings::compute(&detection_results());
        assert_eq!(orderings.default, vec!["dog", "bird", "cat"]);
        assert_eq!(orderings.az, vec!["bird", "cat", "dog"]);
        assert_eq!(orderings.za, vec!["dog", "cat", "bird"]);
        assert_eq!(orderings.mc, vec!["cat", "dog", "bird"]);
        assert_eq!(orderings.lc, vec!["dog", "cat", "bird"]);
    }

    #[test]
    fn test_missing_margins() {
        let matrices = ConfusionMatrices::compute(&detection_results(), &LogColorscale::default());
        let m = &matrices.default;
        assert_eq!(m.classes.last(), Some(&ClassLabel::Missing));
        // false negative of cat
        assert_eq!(m.cell(&ClassLabel::class("cat"), &ClassLabel::Missing), Some(1));
        // false positive of dog
        assert_eq!(m.cell(&ClassLabel::Missing, &ClassLabel::class("dog")), Some(1));
        assert_eq!(m.cell(&ClassLabel::class("cat"), &ClassLabel::class("dog")), Some(1));
    }

    #[test]
    fn test_all_orderings_have_equal_totals() {
        let matrices = ConfusionMatrices::compute(&detection_results(), &LogColorscale::default());
        for ordering in ConfusionOrdering::iter() {
            assert_eq!(matrices.get(ordering).total(), 5, "{ordering}");
        }
    }

    #[test]
    fn test_labels_outside_classes_are_not_tabulated() {
        let mut results = detection_results();
        results.ytrue.push(ClassLabel::class("horse"));
        results.ypred.push(ClassLabel::class("dog"));
        let matrices = ConfusionMatrices::compute(&results, &LogColorscale::default());
        assert_eq!(matrices.default.total(), 5);
        assert_eq!(matrices.mc.total(), 5);
    }
}
