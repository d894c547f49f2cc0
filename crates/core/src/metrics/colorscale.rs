//! Colorscales for confusion matrix heatmaps

use serde::{Deserialize, Serialize};

/// A `(position, color)` stop, with position in `[0, 1]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColorStop(pub f64, pub String);

/// Maps a count matrix to colorscale stops
pub trait Colorscale: Send + Sync {
    fn colorscale(&self, matrix: &[Vec<u64>]) -> Vec<ColorStop>;
}

/// Sequential "oranges" palette, lightest first
pub const ORANGES: [&str; 9] = [
    "rgb(255,245,235)",
    "rgb(254,230,206)",
    "rgb(253,208,162)",
    "rgb(253,174,107)",
    "rgb(253,141,60)",
    "rgb(241,105,19)",
    "rgb(217,72,1)",
    "rgb(166,54,3)",
    "rgb(127,39,4)",
];

/// Logarithmic colorscale keyed on the matrix maximum
///
/// Palette color `i` of `n` is placed at the count `(max + 1)^(i / (n - 1)) - 1`,
/// expressed as a fraction of `max`, so small counts already move away from
/// the lightest color even when a single cell dominates.
#[derive(Debug, Clone)]
pub struct LogColorscale {
    palette: Vec<String>,
}

impl LogColorscale {
    /// Create a colorscale from a palette of at least two colors
    pub fn new(palette: Vec<String>) -> Option<Self> {
        (palette.len() >= 2).then_some(Self { palette })
    }

    pub fn oranges() -> Self {
        Self {
            palette: ORANGES.iter().map(|c| c.to_string()).collect(),
        }
    }

    /// Stops for a matrix whose largest cell is `max_value`
    pub fn stops(&self, max_value: u64) -> Vec<ColorStop> {
        let last = (self.palette.len() - 1) as f64;
        let max = max_value as f64;
        self.palette
            .iter()
            .enumerate()
            .map(|(i, color)| {
                let fraction = i as f64 / last;
                let position = if max_value <= 1 {
                    fraction
                } else {
                    ((max + 1.0).powf(fraction) - 1.0) / max
                };
                ColorStop(position.clamp(0.0, 1.0), color.clone())
            })
            .collect()
    }
}

impl Default for LogColorscale {
    fn default() -> Self {
        Self::oranges()
    }
}

impl Colorscale for LogColorscale {
    fn colorscale(&self, matrix: &[Vec<u64>]) -> Vec<ColorStop> {
        let max_value = matrix.iter().flatten().copied().max().unwrap_or(0);
        self.stops(max_value)
    }
}
