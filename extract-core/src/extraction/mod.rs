//! Budget-bounded, two-phase extraction orchestration.
//!
//! - [`ExtractionOrchestrator`] - State machine sequencing the category and product phases
//! - [`ExtractionContext`] - Per-run mutable state
//! - [`ExtractionError`] - Typed terminal outcomes carrying run metrics
//! - [`ExtractionMetrics`] - Attempts, spend, tokens and timing
//! - [`ExtractionConfig`] - Model, retry bound, budget and category policy

pub mod config;
pub mod context;
pub mod error;
pub mod metrics;
pub mod orchestrator;

pub use config::{check_budget, check_max_attempts, ConfigError, ExtractionConfig, DEFAULT_MODEL};
pub use context::{ExtractionContext, RunStatus};
pub use error::{ExtractionError, Phase};
pub use metrics::{estimate_tokens, ExtractionMetrics};
pub use orchestrator::{ExtractionOrchestrator, ExtractionOutput, ExtractionRequest};
