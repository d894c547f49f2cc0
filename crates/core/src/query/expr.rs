//! Filter predicate language applied to dataset views

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Boolean expression over sample or label fields
///
/// Paths are sample-relative inside a [`ViewStage::Match`] and label-relative
/// inside a [`ViewStage::FilterLabels`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", content = "args", rename_all = "snake_case")]
pub enum Expr {
    /// `path == value`
    Eq { path: String, value: Value },
    /// The list at `path` has at least one element
    NonEmpty { path: String },
    And(Vec<Expr>),
    Or(Vec<Expr>),
}

impl Expr {
    pub fn field_eq(path: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::Eq {
            path: path.into(),
            value: value.into(),
        }
    }

    pub fn non_empty(path: impl Into<String>) -> Self {
        Self::NonEmpty { path: path.into() }
    }

    /// `self OR other`, flattening nested disjunctions
    pub fn or(self, other: Expr) -> Self {
        match self {
            Self::Or(mut terms) => {
                terms.push(other);
                Self::Or(terms)
            }
            expr => Self::Or(vec![expr, other]),
        }
    }

    /// `self AND other`, flattening nested conjunctions
    pub fn and(self, other: Expr) -> Self {
        match self {
            Self::And(mut terms) => {
                terms.push(other);
                Self::And(terms)
            }
            expr => Self::And(vec![expr, other]),
        }
    }
}

fn join(f: &mut fmt::Formatter<'_>, terms: &[Expr], op: &str) -> fmt::Result {
    write!(f, "(")?;
    for (i, term) in terms.iter().enumerate() {
        if i > 0 {
            write!(f, " {op} ")?;
        }
        write!(f, "{term}")?;
    }
    write!(f, ")")
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Eq { path, value } => write!(f, "F(\"{path}\") == {value}"),
            Self::NonEmpty { path } => write!(f, "F(\"{path}\").length() > 0"),
            Self::And(terms) => join(f, terms, "&"),
            Self::Or(terms) => join(f, terms, "|"),
        }
    }
}

/// One step of a dataset view pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "stage", rename_all = "snake_case")]
pub enum ViewStage {
    /// Keep only the labels of `field` matching `filter`; with `only_matches`
    /// also drop samples left without any matching label
    FilterLabels {
        field: String,
        filter: Expr,
        only_matches: bool,
    },
    /// Keep only the samples matching the expression
    Match { filter: Expr },
}

impl fmt::Display for ViewStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FilterLabels {
                field,
                filter,
                only_matches,
            } => write!(
                f,
                "filter_labels(\"{field}\", {filter}, only_matches={only_matches})"
            ),
            Self::Match { filter } => write!(f, "match({filter})"),
        }
    }
}

/// Ordered view stages that narrow an evaluation view to a drill-down selection
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterPredicate {
    pub stages: Vec<ViewStage>,
}

impl FilterPredicate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filter_labels(mut self, field: impl Into<String>, filter: Expr, only_matches: bool) -> Self {
        self.stages.push(ViewStage::FilterLabels {
            field: field.into(),
            filter,
            only_matches,
        });
        self
    }

    pub fn matching(mut self, filter: Expr) -> Self {
        self.stages.push(ViewStage::Match { filter });
        self
    }
}

impl fmt::Display for FilterPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, stage) in self.stages.iter().enumerate() {
            if i > 0 {
                write!(f, ".")?;
            }
            write!(f, "{stage}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_or_flattens() {
        let expr = Expr::field_eq("a", "x").or(Expr::field_eq("b", "x")).or(Expr::field_eq("c", "x"));
        match expr {
            Expr::Or(terms) => assert_eq!(terms.len(), 3),
            other => panic!("expected Or, got {other:?}"),
        }
    }

    #[test]
    fn test_display() {
        let predicate = FilterPredicate::new()
            .filter_labels("predictions", Expr::field_eq("label", "dog").and(Expr::field_eq("eval", "fp")), true);
        assert_eq!(
            predicate.to_string(),
            r#"filter_labels("predictions", (F("label") == "dog" & F("eval") == "fp"), only_matches=true)"#
        );
    }

    #[test]
    fn test_serialized_shape() {
        let predicate = FilterPredicate::new().matching(Expr::non_empty("gt.detections"));
        assert_eq!(
            serde_json::to_value(&predicate).unwrap(),
            json!({
                "stages": [
                    {"stage": "match", "filter": {"op": "non_empty", "args": {"path": "gt.detections"}}}
                ]
            })
        );
    }
}
