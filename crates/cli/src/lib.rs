//! Library surface of the `modeleval` binary
//!
//! Commands read exported evaluation info and results as JSON files and run
//! them through the core aggregator and drill-down compiler.

#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]

use anyhow::{anyhow, Context, Result};
use modeleval_core::query::DetectionsPaths;
use modeleval_core::{
    Config, DrillDownCompiler, EvaluationInfo, EvaluationResults, FilterPredicate,
    MetricsAggregator, MetricsBundle, Selection,
};
use serde::de::DeserializeOwned;
use std::path::Path;
use tracing::{debug, info};

/// Read and deserialize a JSON file
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("Failed to parse {}", path.display()))
}

/// Compute the metrics bundle of an exported evaluation run
pub fn aggregate(info_path: &Path, results_path: &Path) -> Result<MetricsBundle> {
    let info: EvaluationInfo = read_json(info_path)?;
    let eval_type = info.evaluation_type().ok_or_else(|| {
        anyhow!(
            "Evaluation '{}' has unsupported type '{}'",
            info.key,
            info.config.eval_type
        )
    })?;

    let results: EvaluationResults = read_json(results_path)?;
    results.validate(&info.key)?;
    info!(
        "Aggregating {} items of evaluation '{}'",
        results.len(),
        info.key
    );

    Ok(MetricsAggregator::default().aggregate(&info, eval_type, &results))
}

/// Compile a drill-down selection against exported evaluation infos
///
/// Label lists are assumed to live at `<field>.detections`.
pub fn drilldown(
    info_path: &Path,
    compare_path: Option<&Path>,
    selection: &Selection,
) -> Result<Option<FilterPredicate>> {
    let info: EvaluationInfo = read_json(info_path)?;
    let comparison = compare_path
        .map(read_json::<EvaluationInfo>)
        .transpose()?;
    debug!("Compiling {selection:?} for evaluation '{}'", info.key);

    Ok(DrillDownCompiler::new(&DetectionsPaths).compile(&info, comparison.as_ref(), selection))
}

/// Load the effective configuration and render it as TOML
pub fn effective_config(config_path: Option<&Path>) -> Result<String> {
    let config = Config::load(config_path)?;
    config.validate()?;
    toml::to_string_pretty(&config).context("Failed to render configuration")
}
