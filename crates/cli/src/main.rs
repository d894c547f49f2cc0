//! Model evaluation CLI
//!
//! Computes metrics bundles and drill-down predicates from exported
//! evaluation runs.

#![deny(warnings)]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use modeleval::{aggregate, drilldown, effective_config};
use modeleval_core::{ClassLabel, Selection};
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "modeleval")]
#[command(about = "Model evaluation metrics and drill-down")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Configuration file path
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute the metrics bundle of an evaluation run
    Aggregate {
        /// Evaluation info JSON
        #[arg(long, value_name = "FILE")]
        info: PathBuf,
        /// Evaluation results JSON
        #[arg(long, value_name = "FILE")]
        results: PathBuf,
        /// Pretty-print the bundle
        #[arg(long)]
        pretty: bool,
    },
    /// Print the filter a drill-down selection compiles to
    Drilldown {
        /// Evaluation info JSON
        #[arg(long, value_name = "FILE")]
        info: PathBuf,
        /// Info JSON of a comparison evaluation
        #[arg(long, value_name = "FILE")]
        compare: Option<PathBuf>,
        /// Print the predicate as JSON
        #[arg(long)]
        json: bool,
        #[command(subcommand)]
        view: ViewCommands,
    },
    /// Print the effective configuration
    Config,
}

#[derive(Subcommand)]
enum ViewCommands {
    /// Every sample with ground truth or predictions of a class
    Class {
        #[arg(long)]
        x: String,
    },
    /// A confusion matrix cell; omit a side to select the missing marker
    Matrix {
        /// Predicted class (column)
        #[arg(long)]
        x: Option<String>,
        /// Ground truth class (row)
        #[arg(long)]
        y: Option<String>,
    },
    /// Samples or labels with an evaluation outcome (tp, fp, fn, correct, ...)
    Field { name: String },
}

impl ViewCommands {
    fn into_selection(self) -> Selection {
        match self {
            ViewCommands::Class { x } => Selection::Class {
                x: ClassLabel::class(x),
            },
            ViewCommands::Matrix { x, y } => Selection::Matrix {
                x: ClassLabel::from(x),
                y: ClassLabel::from(y),
            },
            ViewCommands::Field { name } => Selection::Field { field: name },
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    init_logging(cli.verbose)?;

    match cli.command {
        Some(Commands::Aggregate {
            info,
            results,
            pretty,
        }) => run_aggregate(&info, &results, pretty),
        Some(Commands::Drilldown {
            info,
            compare,
            json,
            view,
        }) => run_drilldown(&info, compare.as_deref(), view.into_selection(), json),
        Some(Commands::Config) => {
            print!("{}", effective_config(cli.config.as_deref())?);
            Ok(())
        }
        None => {
            println!("Run 'modeleval aggregate --info <FILE> --results <FILE>', or --help for more options");
            Ok(())
        }
    }
}

/// Initialize logging system
fn init_logging(verbose: bool) -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(log_filter(verbose))
        .init();

    Ok(())
}

/// `RUST_LOG` when set, otherwise warnings from the workspace crates
///
/// `--verbose` always wins and enables debug output.
fn log_filter(verbose: bool) -> EnvFilter {
    let crate_filter = |level: &str| {
        EnvFilter::new(format!(
            "modeleval_core={level},{}={level}",
            env!("CARGO_PKG_NAME")
        ))
    };

    if verbose {
        crate_filter("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| crate_filter("warn"))
    }
}

fn run_aggregate(info_path: &Path, results_path: &Path, pretty: bool) -> Result<()> {
    let bundle = aggregate(info_path, results_path)?;
    let output = if pretty {
        serde_json::to_string_pretty(&bundle)
    } else {
        serde_json::to_string(&bundle)
    }
    .context("Failed to serialize metrics bundle")?;

    println!("{output}");
    info!("Wrote metrics bundle of '{}'", bundle.info.key);
    Ok(())
}

fn run_drilldown(
    info_path: &Path,
    compare_path: Option<&Path>,
    selection: Selection,
    json: bool,
) -> Result<()> {
    match drilldown(info_path, compare_path, &selection)? {
        Some(predicate) if json => {
            let output = serde_json::to_string_pretty(&predicate)
                .context("Failed to serialize predicate")?;
            println!("{output}");
        }
        Some(predicate) => println!("{predicate}"),
        None => warn!("No drill-down is defined for this evaluation type"),
    }
    Ok(())
}
