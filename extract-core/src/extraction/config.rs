//! Per-run configuration: model, retry bound, budget and category policy.

use thiserror::Error;

/// Default model used when none is configured.
pub const DEFAULT_MODEL: &str = "openai/gpt-5-nano";

/// A configuration value outside its domain.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// The budget is not a finite positive amount.
    #[error("Budget must be a finite amount above zero, got {0}")]
    InvalidBudget(f64),

    /// The retry bound allows no attempts.
    #[error("Max attempts must be at least 1")]
    ZeroAttempts,
}

/// Checks that `budget` is a finite amount above zero.
///
/// # Errors
/// Returns `ConfigError::InvalidBudget` for NaN, infinite, zero or negative values.
pub fn check_budget(budget: f64) -> Result<f64, ConfigError> {
    if budget.is_finite() && budget > 0.0 {
        Ok(budget)
    } else {
        Err(ConfigError::InvalidBudget(budget))
    }
}

/// Checks that `max` allows at least one attempt.
///
/// # Errors
/// Returns `ConfigError::ZeroAttempts` when `max` is zero.
pub const fn check_max_attempts(max: usize) -> Result<usize, ConfigError> {
    if max == 0 {
        Err(ConfigError::ZeroAttempts)
    } else {
        Ok(max)
    }
}

/// Configuration for one extraction run.
///
/// Callers can vary every field per invocation (single file, batch or
/// multi-model comparison).
#[derive(Debug, Clone)]
pub struct ExtractionConfig {
    /// Model id sent to the gateway (default: `openai/gpt-5-nano`).
    pub model: String,
    /// Maximum attempts per phase before giving up (default: 5).
    pub max_attempts: usize,
    /// Spend ceiling in USD for the whole run (default: 1.00).
    pub budget_usd: f64,
    /// Reject a product whose category differs from the one fixed in the
    /// category phase (default: false).
    pub pin_category: bool,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            max_attempts: 5,
            budget_usd: 1.0,
            pin_category: false,
        }
    }
}

impl ExtractionConfig {
    /// Set the model id.
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set the maximum number of attempts per phase.
    #[must_use]
    pub const fn with_max_attempts(mut self, max: usize) -> Self {
        self.max_attempts = max;
        self
    }

    /// Set the spend ceiling in USD.
    #[must_use]
    pub const fn with_budget_usd(mut self, budget: f64) -> Self {
        self.budget_usd = budget;
        self
    }

    /// Checks the retry bound and budget.
    ///
    /// # Errors
    /// Returns the first out-of-range value as a [`ConfigError`].
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_max_attempts(self.max_attempts)?;
        check_budget(self.budget_usd)?;
        Ok(())
    }

    /// Set whether a drifted product category is a validation failure.
    #[must_use]
    pub const fn with_pin_category(mut self, pin: bool) -> Self {
        self.pin_category = pin;
        self
    }
}
