//! Metrics tracking and token estimation for extraction runs.

use std::time::Duration;

use crate::gateway::TokenUsage;

/// Metrics collected during one extraction run, reported on every outcome.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtractionMetrics {
    /// Calls made in the category phase.
    pub category_attempts: usize,
    /// Calls made in the product phase.
    pub product_attempts: usize,
    /// Total USD spent.
    pub spent_usd: f64,
    /// Summed token usage across calls.
    pub usage: TokenUsage,
    /// Wall-clock time elapsed during the run.
    pub wall_time: Duration,
}

impl ExtractionMetrics {
    /// Total model calls made.
    #[must_use]
    pub const fn calls(&self) -> usize {
        self.category_attempts + self.product_attempts
    }
}

/// Estimate token count from text using the standard 4-chars-per-token heuristic.
///
/// Uses `chars().count()` to handle UTF-8 correctly (not `len()` which counts bytes).
/// Returns ceiling division to avoid underestimation.
#[must_use]
pub fn estimate_tokens(text: &str) -> usize {
    text.chars().count().div_ceil(4)
}
