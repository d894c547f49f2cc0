//! Class labels with a typed "missing" marker

use serde::{Deserialize, Serialize};
use std::fmt;

/// Display text used for the missing marker when it has to be rendered
pub const MISSING_DISPLAY: &str = "(none)";

/// One side of a scored item: either a real class or the missing marker
///
/// `Missing` means "no label on this side" (an unmatched prediction or an
/// unmatched ground truth). It can never collide with a class literally named
/// `"(none)"` or `"missing"`. Serialized as JSON `null`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "Option<String>", into = "Option<String>")]
pub enum ClassLabel {
    Class(String),
    Missing,
}

impl ClassLabel {
    /// Creates a real class label
    pub fn class(name: impl Into<String>) -> Self {
        Self::Class(name.into())
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Self::Missing)
    }

    /// Returns the class name, or `None` for the missing marker
    pub fn as_class(&self) -> Option<&str> {
        match self {
            Self::Class(name) => Some(name),
            Self::Missing => None,
        }
    }
}

impl From<Option<String>> for ClassLabel {
    fn from(value: Option<String>) -> Self {
        match value {
            Some(name) => Self::Class(name),
            None => Self::Missing,
        }
    }
}

impl From<ClassLabel> for Option<String> {
    fn from(label: ClassLabel) -> Self {
        match label {
            ClassLabel::Class(name) => Some(name),
            ClassLabel::Missing => None,
        }
    }
}

impl From<&str> for ClassLabel {
    fn from(name: &str) -> Self {
        Self::Class(name.to_string())
    }
}

impl From<&ClassLabel> for serde_json::Value {
    fn from(label: &ClassLabel) -> Self {
        match label {
            ClassLabel::Class(name) => serde_json::Value::String(name.clone()),
            ClassLabel::Missing => serde_json::Value::Null,
        }
    }
}

impl fmt::Display for ClassLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Class(name) => write!(f, "{name}"),
            Self::Missing => write!(f, "{MISSING_DISPLAY}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_serializes_as_null() {
        let labels = vec![ClassLabel::class("cat"), ClassLabel::Missing];
        let json = serde_json::to_string(&labels).unwrap();
        assert_eq!(json, r#"["cat",null]"#);

        let parsed: Vec<ClassLabel> = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, labels);
    }

    #[test]
    fn test_class_named_like_missing_is_a_class() {
        let label: ClassLabel = serde_json::from_str(r#""(none)""#).unwrap();
        assert_eq!(label, ClassLabel::class("(none)"));
        assert!(!label.is_missing());
        assert_ne!(label, ClassLabel::Missing);
    }

    #[test]
    fn test_missing_sorts_after_classes() {
        let mut labels = vec![ClassLabel::Missing, ClassLabel::class("b"), ClassLabel::class("a")];
        labels.sort();
        assert_eq!(
            labels,
            vec![ClassLabel::class("a"), ClassLabel::class("b"), ClassLabel::Missing]
        );
    }
}
