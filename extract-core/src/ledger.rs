//! Per-call pricing and cumulative spend tracking against a budget ceiling.

use std::collections::HashMap;

use crate::gateway::TokenUsage;

/// USD price per million tokens for one model.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ModelPrice {
    /// Price per million input tokens.
    pub input_per_million: f64,
    /// Price per million output tokens. Reasoning tokens bill at this rate.
    pub output_per_million: f64,
}

impl ModelPrice {
    /// Creates a price entry.
    #[must_use]
    pub const fn new(input_per_million: f64, output_per_million: f64) -> Self {
        Self {
            input_per_million,
            output_per_million,
        }
    }
}

const DEFAULT_PRICES: &[(&str, ModelPrice)] = &[
    ("google/gemini-2.0-flash-lite-001", ModelPrice::new(0.075, 0.30)),
    ("google/gemini-2.5-flash-lite", ModelPrice::new(0.10, 0.40)),
    ("google/gemini-3-flash-preview", ModelPrice::new(0.50, 3.00)),
    ("google/gemini-3-pro-preview", ModelPrice::new(2.00, 12.00)),
    ("openai/gpt-5", ModelPrice::new(1.25, 10.00)),
    ("openai/gpt-5-mini", ModelPrice::new(0.25, 2.00)),
    ("openai/gpt-5-nano", ModelPrice::new(0.05, 0.40)),
];

/// Static model price table.
///
/// Unknown models cost nothing and log a warning. This understates spend for
/// unrecognized models, so keep the table current.
#[derive(Debug, Clone)]
pub struct PriceTable {
    prices: HashMap<String, ModelPrice>,
}

impl Default for PriceTable {
    fn default() -> Self {
        DEFAULT_PRICES
            .iter()
            .map(|(model, price)| ((*model).to_string(), *price))
            .collect()
    }
}

impl FromIterator<(String, ModelPrice)> for PriceTable {
    fn from_iter<I: IntoIterator<Item = (String, ModelPrice)>>(iter: I) -> Self {
        Self {
            prices: iter.into_iter().collect(),
        }
    }
}

impl PriceTable {
    /// An empty table; every model prices at zero.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            prices: HashMap::new(),
        }
    }

    /// Adds or replaces the price of `model` (fluent builder pattern).
    #[must_use]
    pub fn with_price(mut self, model: impl Into<String>, price: ModelPrice) -> Self {
        self.prices.insert(model.into(), price);
        self
    }

    /// Looks up the price of `model`, falling back to zero for unknown ids.
    #[must_use]
    pub fn price(&self, model: &str) -> ModelPrice {
        self.prices.get(model).copied().unwrap_or_else(|| {
            tracing::warn!(model, "No price entry for model; counting its cost as $0");
            ModelPrice::default()
        })
    }

    /// Computes the USD cost of one call.
    ///
    /// `input/1e6 * input_rate + (output + reasoning)/1e6 * output_rate`
    #[must_use]
    pub fn compute_cost(&self, model: &str, usage: &TokenUsage) -> f64 {
        let price = self.price(model);
        #[allow(clippy::cast_precision_loss)]
        let (input, billed_output) = (
            usage.input_tokens as f64,
            (usage.output_tokens + usage.reasoning_tokens) as f64,
        );
        let cost = (input / 1_000_000.0).mul_add(
            price.input_per_million,
            billed_output / 1_000_000.0 * price.output_per_million,
        );

        let million_calls = cost * 1_000_000.0;
        tracing::info!(
            model,
            input_tokens = usage.input_tokens,
            output_tokens = usage.output_tokens,
            reasoning_tokens = usage.reasoning_tokens,
            "Token usage | this call: ${cost:.6} | 1M calls: ${million_calls:.2} | 10M calls: ${:.2}",
            million_calls * 10.0
        );

        cost
    }
}

/// Cumulative spend of one run against its budget ceiling.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CostLedger {
    spent_usd: f64,
    budget_usd: f64,
}

impl CostLedger {
    /// Opens a ledger with nothing spent.
    #[must_use]
    pub const fn new(budget_usd: f64) -> Self {
        Self {
            spent_usd: 0.0,
            budget_usd,
        }
    }

    /// Total spent so far.
    #[must_use]
    pub const fn spent_usd(&self) -> f64 {
        self.spent_usd
    }

    /// Configured ceiling.
    #[must_use]
    pub const fn budget_usd(&self) -> f64 {
        self.budget_usd
    }

    /// Books `delta` and reports whether spend is now strictly over budget.
    ///
    /// Money already spent is never undone: the delta is recorded even when it
    /// pushes the total past the ceiling. Landing exactly on budget is allowed.
    pub fn accumulate(&mut self, delta: f64) -> bool {
        self.spent_usd += delta.max(0.0);
        self.spent_usd > self.budget_usd
    }

    /// Returns `true` once no further call may be issued.
    #[must_use]
    pub fn is_exhausted(&self) -> bool {
        self.spent_usd >= self.budget_usd
    }
}
