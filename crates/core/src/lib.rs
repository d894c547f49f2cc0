//! Core types and algorithms for the model evaluation panel
//!
//! This crate provides the storage-independent parts of the panel:
//!
//! - **Entities**: evaluation info, review statuses and pending evaluations
//! - **Results**: the per-item view over one evaluation run
//! - **Metrics**: aggregation of results into a cacheable metrics bundle
//! - **Query**: compilation of drill-down selections into view filters
//! - **Configuration**: panel configuration management
//! - **Error handling**: unified error types
//!

#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]

pub mod config;
pub mod entities;
pub mod error;
pub mod labels;
pub mod metrics;
pub mod query;
pub mod results;

// Re-export main types for convenience
pub use config::{Config, PanelConfig, StoreConfig, CACHE_TTL};
pub use entities::{
    ClassificationMethod, EvaluationConfig, EvaluationInfo, EvaluationSummary, EvaluationType,
    PendingEvaluation, ReviewStatus,
};
pub use error::{Error, Result};
pub use labels::ClassLabel;
pub use metrics::{MaskTargets, MetricsAggregator, MetricsBundle};
pub use query::{DrillDownCompiler, FilterPredicate, LabelPaths, Selection};
pub use results::{EvaluationResults, EvaluationResultsBuilder};
