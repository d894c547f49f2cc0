//! Model evaluation panel
//!
//! Wires the core aggregator and drill-down compiler to a dataset, a
//! key-value store and a notifier, exposing one handler per panel action.

#![deny(warnings)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

mod dataset;
pub mod mock;
mod notify;
mod panel;
mod permissions;

pub use dataset::{Dataset, DatasetView};
pub use notify::{Notifier, Severity, TracingNotifier};
pub use panel::{
    EvaluationData, EvaluationPanel, LoadedEvaluation, PanelSnapshot, UnsupportedEvaluation,
    ViewChange, ViewRequest, UNSUPPORTED_ERROR,
};
pub use permissions::Permissions;
