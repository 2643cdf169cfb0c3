//! Mutable state threaded through one extraction run.

use crate::gateway::TokenUsage;
use crate::ledger::CostLedger;
use crate::model::{Category, Product};

/// Lifecycle status of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    /// Still issuing calls.
    Running,
    /// Spend reached or passed the budget.
    CostExceeded,
    /// Category phase exhausted its attempts.
    CategoryFailed,
    /// Product phase exhausted its attempts.
    ProductFailed,
    /// A gateway call failed; no further calls are made.
    TransportFailed,
    /// Product extracted (and persisted when keyed).
    Succeeded,
}

/// State of one run. Created per call, owned by the orchestrator, never shared.
#[derive(Debug)]
pub struct ExtractionContext {
    raw_input: String,
    filtered_input: Option<String>,
    source_key: Option<String>,
    pub(crate) category: Option<Category>,
    pub(crate) category_retry_error: Option<String>,
    pub(crate) category_attempts: usize,
    pub(crate) product: Option<Product>,
    pub(crate) product_retry_error: Option<String>,
    pub(crate) product_attempts: usize,
    pub(crate) ledger: CostLedger,
    pub(crate) usage: TokenUsage,
    pub(crate) status: RunStatus,
}

impl ExtractionContext {
    pub(crate) fn new(raw_input: String, source_key: Option<String>, budget_usd: f64) -> Self {
        Self {
            raw_input,
            filtered_input: None,
            source_key,
            category: None,
            category_retry_error: None,
            category_attempts: 0,
            product: None,
            product_retry_error: None,
            product_attempts: 0,
            ledger: CostLedger::new(budget_usd),
            usage: TokenUsage::default(),
            status: RunStatus::Running,
        }
    }

    /// Caller-supplied HTML.
    #[must_use]
    pub fn raw_input(&self) -> &str {
        &self.raw_input
    }

    /// Filtered HTML; empty until preparation has run.
    #[must_use]
    pub fn filtered_input(&self) -> &str {
        self.filtered_input.as_deref().unwrap_or_default()
    }

    /// Persistence key, if the run should be stored.
    #[must_use]
    pub fn source_key(&self) -> Option<&str> {
        self.source_key.as_deref()
    }

    /// Current status.
    #[must_use]
    pub const fn status(&self) -> RunStatus {
        self.status
    }

    /// Spend so far.
    #[must_use]
    pub const fn spent_usd(&self) -> f64 {
        self.ledger.spent_usd()
    }

    /// Sets the filtered input. Only the first call has any effect.
    pub(crate) fn prepare(&mut self, filtered: String) {
        if self.filtered_input.is_none() {
            self.filtered_input = Some(filtered);
        }
    }

    /// Books the cost and usage of a completed call; returns `true` if spend
    /// is now strictly over budget.
    pub(crate) fn book(&mut self, cost_usd: f64, usage: TokenUsage) -> bool {
        self.usage = self.usage.saturating_add(usage);
        self.ledger.accumulate(cost_usd)
    }

    /// Merges the fields a transition changed.
    pub(crate) fn apply(&mut self, update: ContextUpdate) {
        let ContextUpdate {
            category,
            category_retry_error,
            category_attempted,
            product,
            product_retry_error,
            product_attempted,
            status,
        } = update;

        if category.is_some() {
            self.category = category;
        }
        if category_retry_error.is_some() {
            self.category_retry_error = category_retry_error;
        }
        if category_attempted {
            self.category_attempts += 1;
        }
        if product.is_some() {
            self.product = product;
        }
        if product_retry_error.is_some() {
            self.product_retry_error = product_retry_error;
        }
        if product_attempted {
            self.product_attempts += 1;
        }
        if let Some(status) = status {
            self.status = status;
        }
    }
}

/// Fields changed by a single transition. Absent fields are left untouched.
#[derive(Debug, Default)]
pub(crate) struct ContextUpdate {
    pub category: Option<Category>,
    pub category_retry_error: Option<String>,
    pub category_attempted: bool,
    pub product: Option<Product>,
    pub product_retry_error: Option<String>,
    pub product_attempted: bool,
    pub status: Option<RunStatus>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prepare_is_write_once() {
        let mut ctx = ExtractionContext::new("<html/>".to_string(), None, 1.0);
        assert_eq!(ctx.filtered_input(), "");
        ctx.prepare("first".to_string());
        ctx.prepare("second".to_string());
        assert_eq!(ctx.filtered_input(), "first");
    }

    #[test]
    fn apply_merges_only_changed_fields() {
        let mut ctx = ExtractionContext::new(String::new(), Some("a.html".to_string()), 1.0);
        ctx.apply(ContextUpdate {
            category_retry_error: Some("bad".to_string()),
            category_attempted: true,
            ..ContextUpdate::default()
        });
        ctx.apply(ContextUpdate {
            category: Some(Category::new("Hardware")),
            category_attempted: true,
            ..ContextUpdate::default()
        });

        assert_eq!(ctx.category_attempts, 2);
        assert_eq!(ctx.category_retry_error.as_deref(), Some("bad"));
        assert_eq!(ctx.category, Some(Category::new("Hardware")));
        assert_eq!(ctx.status(), RunStatus::Running);
        assert_eq!(ctx.source_key(), Some("a.html"));
    }

    #[test]
    fn status_changes_only_when_set() {
        let mut ctx = ExtractionContext::new(String::new(), None, 1.0);
        ctx.apply(ContextUpdate {
            product_attempted: true,
            ..ContextUpdate::default()
        });
        assert_eq!(ctx.status(), RunStatus::Running);
        ctx.apply(ContextUpdate {
            status: Some(RunStatus::TransportFailed),
            ..ContextUpdate::default()
        });
        assert_eq!(ctx.status(), RunStatus::TransportFailed);
        assert_eq!(ctx.product_attempts, 1);
    }

    #[test]
    fn booking_is_monotonic() {
        let mut ctx = ExtractionContext::new(String::new(), None, 5.0);
        assert!(!ctx.book(3.0, TokenUsage::default()));
        assert!(ctx.book(3.0, TokenUsage::default()));
        assert!((ctx.spent_usd() - 6.0).abs() < 1e-9);
    }
}
