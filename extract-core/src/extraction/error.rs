//! Terminal outcomes of an extraction run.

use std::fmt;

use thiserror::Error;

use super::config::ConfigError;
use super::metrics::ExtractionMetrics;
use crate::sink::SinkError;

/// The two sequential extraction phases.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Category inference.
    Category,
    /// Full product inference.
    Product,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Category => "category",
            Self::Product => "product",
        })
    }
}

/// Errors that terminate an extraction run.
///
/// Validation failures never appear here directly: they are retried inside
/// the orchestrator and only surface as [`ExtractionError::RetriesExhausted`].
#[derive(Debug, Error)]
pub enum ExtractionError {
    /// The run configuration was rejected before any call.
    #[error("Invalid extraction config: {source}")]
    InvalidConfig {
        /// The out-of-range value.
        #[source]
        source: ConfigError,
        /// Empty metrics; no call was made.
        metrics: ExtractionMetrics,
    },

    /// Cumulative spend reached or passed the configured ceiling.
    #[error("Budget exceeded during {phase} phase: spent ${spent_usd:.6} of ${limit_usd:.6}")]
    BudgetExceeded {
        /// Phase that was running or about to run.
        phase: Phase,
        /// Configured ceiling.
        limit_usd: f64,
        /// Total spent, including the call that crossed the ceiling.
        spent_usd: f64,
        /// Metrics tracked across all calls.
        metrics: ExtractionMetrics,
    },

    /// A phase stayed invalid for its whole retry bound.
    #[error("The {phase} phase failed after {attempts} attempts: {last_error}")]
    RetriesExhausted {
        /// Phase that gave up.
        phase: Phase,
        /// Attempts made in that phase.
        attempts: usize,
        /// Validation error of the final attempt.
        last_error: String,
        /// Metrics tracked across all calls.
        metrics: ExtractionMetrics,
    },

    /// The gateway call itself failed.
    #[error("Model call failed during {phase} phase: {message}")]
    Transport {
        /// Phase of the failed call.
        phase: Phase,
        /// Transport error text.
        message: String,
        /// Metrics tracked up to the failure.
        metrics: ExtractionMetrics,
    },

    /// The product was valid but could not be stored.
    #[error("Failed to persist record '{key}': {source}")]
    Persistence {
        /// Source key of the record.
        key: String,
        /// Underlying sink error.
        #[source]
        source: SinkError,
        /// Metrics tracked across all calls.
        metrics: ExtractionMetrics,
    },
}

impl ExtractionError {
    /// Metrics of the run that produced this error.
    #[must_use]
    pub const fn metrics(&self) -> &ExtractionMetrics {
        match self {
            Self::InvalidConfig { metrics, .. }
            | Self::BudgetExceeded { metrics, .. }
            | Self::RetriesExhausted { metrics, .. }
            | Self::Transport { metrics, .. }
            | Self::Persistence { metrics, .. } => metrics,
        }
    }
}
