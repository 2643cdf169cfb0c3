//! Two-phase state machine driving one extraction run to a terminal outcome.

use std::sync::Arc;

use tokio::time::Instant;

use super::config::ExtractionConfig;
use super::context::{ContextUpdate, ExtractionContext, RunStatus};
use super::error::{ExtractionError, Phase};
use super::metrics::ExtractionMetrics;
use crate::filter::filter_html;
use crate::gateway::{AiGateway, GatewayError};
use crate::ledger::PriceTable;
use crate::model::{Category, Product};
use crate::sink::PersistenceSink;
use crate::steps::{extract_category, extract_product, StepContext};
use crate::taxonomy::Taxonomy;
use crate::validation::{validate_category, validate_product};

/// Input of one run.
#[derive(Debug, Clone)]
pub struct ExtractionRequest {
    /// Raw page HTML.
    pub html: String,
    /// Persistence key; `None` evaluates without storing.
    pub source_key: Option<String>,
}

impl ExtractionRequest {
    /// A request that is stored under `key` on success.
    #[must_use]
    pub fn keyed(html: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            html: html.into(),
            source_key: Some(key.into()),
        }
    }

    /// A request that is evaluated only.
    #[must_use]
    pub fn unkeyed(html: impl Into<String>) -> Self {
        Self {
            html: html.into(),
            source_key: None,
        }
    }
}

/// Successful outcome of a run.
#[derive(Debug, Clone)]
pub struct ExtractionOutput {
    /// The validated product.
    pub product: Product,
    /// Metrics of the run.
    pub metrics: ExtractionMetrics,
}

/// Machine states. Terminal states end the loop.
#[derive(Debug)]
enum Stage {
    Preparing,
    ExtractingCategory,
    ExtractingProduct(Category),
    Persisting(Product),
    Succeeded(Product),
    Terminated(Phase),
}

/// Next stage plus the context fields the transition changed.
#[derive(Debug)]
struct Transition {
    next: Stage,
    update: ContextUpdate,
}

/// Orchestrator for budget-bounded, validation-driven extraction runs.
///
/// Holds only immutable collaborators; each call to [`run`](Self::run) owns a
/// fresh [`ExtractionContext`], so one orchestrator can serve many concurrent
/// runs.
pub struct ExtractionOrchestrator {
    gateway: Arc<dyn AiGateway>,
    taxonomy: Arc<Taxonomy>,
    prices: Arc<PriceTable>,
    sink: Option<Arc<dyn PersistenceSink>>,
}

impl ExtractionOrchestrator {
    /// Creates an orchestrator with the default price table and no sink.
    #[must_use]
    pub fn new(gateway: Arc<dyn AiGateway>, taxonomy: Arc<Taxonomy>) -> Self {
        Self {
            gateway,
            taxonomy,
            prices: Arc::new(PriceTable::default()),
            sink: None,
        }
    }

    /// Replaces the price table (fluent builder pattern).
    #[must_use]
    pub fn with_prices(mut self, prices: Arc<PriceTable>) -> Self {
        self.prices = prices;
        self
    }

    /// Stores keyed results in `sink` (fluent builder pattern).
    #[must_use]
    pub fn with_sink(mut self, sink: Arc<dyn PersistenceSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Runs one extraction to a terminal outcome.
    ///
    /// # Errors
    ///
    /// Returns `ExtractionError::InvalidConfig` before any call when the budget is not a
    /// finite positive amount or `max_attempts` is zero.
    /// Returns `ExtractionError::BudgetExceeded` when spend reaches the ceiling before a call
    /// or passes it after one.
    /// Returns `ExtractionError::RetriesExhausted` when a phase stays invalid for
    /// `max_attempts` calls.
    /// Returns `ExtractionError::Transport` when a gateway call fails.
    /// Returns `ExtractionError::Persistence` when the sink rejects the record.
    pub async fn run(
        &self,
        request: ExtractionRequest,
        config: &ExtractionConfig,
    ) -> Result<ExtractionOutput, ExtractionError> {
        let start = Instant::now();
        config
            .validate()
            .map_err(|source| ExtractionError::InvalidConfig {
                source,
                metrics: ExtractionMetrics::default(),
            })?;
        let mut ctx = ExtractionContext::new(request.html, request.source_key, config.budget_usd);
        let mut stage = Stage::Preparing;

        tracing::info!(
            model = %config.model,
            budget_usd = config.budget_usd,
            max_attempts = config.max_attempts,
            source_key = ?ctx.source_key(),
            "Starting extraction"
        );

        loop {
            stage = match stage {
                Stage::Preparing => {
                    let filtered = filter_html(ctx.raw_input());
                    tracing::debug!(
                        raw_bytes = ctx.raw_input().len(),
                        filtered_bytes = filtered.len(),
                        "Filtered input HTML"
                    );
                    ctx.prepare(filtered);
                    Stage::ExtractingCategory
                }
                Stage::ExtractingCategory => self
                    .category_phase(&mut ctx, config)
                    .await
                    .map_err(|e| transport_error(&mut ctx, Phase::Category, &e, start))?,
                Stage::ExtractingProduct(category) => self
                    .product_phase(&mut ctx, config, &category)
                    .await
                    .map_err(|e| transport_error(&mut ctx, Phase::Product, &e, start))?,
                Stage::Persisting(product) => {
                    self.persist(&ctx, &product)
                        .await
                        .map_err(|(key, source)| ExtractionError::Persistence {
                            key,
                            source,
                            metrics: metrics_of(&ctx, start),
                        })?;
                    Stage::Succeeded(product)
                }
                Stage::Succeeded(product) => {
                    ctx.apply(ContextUpdate {
                        status: Some(RunStatus::Succeeded),
                        ..ContextUpdate::default()
                    });
                    let metrics = metrics_of(&ctx, start);
                    tracing::info!(
                        product = %product.name,
                        category = %product.category.name,
                        calls = metrics.calls(),
                        spent_usd = metrics.spent_usd,
                        "Extraction succeeded"
                    );
                    return Ok(ExtractionOutput { product, metrics });
                }
                Stage::Terminated(phase) => return Err(terminal_error(&ctx, phase, start)),
            };
        }
    }

    async fn category_phase(
        &self,
        ctx: &mut ExtractionContext,
        config: &ExtractionConfig,
    ) -> Result<Stage, GatewayError> {
        if let Some(stage) = out_of_budget(ctx, Phase::Category) {
            return Ok(stage);
        }

        let output = extract_category(
            self.step_context(config),
            ctx.filtered_input(),
            ctx.category_retry_error.as_deref(),
        )
        .await?;

        if ctx.book(output.cost_usd, output.usage) {
            return Ok(over_budget(ctx, Phase::Category));
        }

        let transition = self.resolve_category(ctx, config, output.outcome);
        ctx.apply(transition.update);
        Ok(transition.next)
    }

    async fn product_phase(
        &self,
        ctx: &mut ExtractionContext,
        config: &ExtractionConfig,
        category: &Category,
    ) -> Result<Stage, GatewayError> {
        if let Some(stage) = out_of_budget(ctx, Phase::Product) {
            return Ok(stage);
        }

        let output = extract_product(
            self.step_context(config),
            ctx.filtered_input(),
            &category.name,
            ctx.product_retry_error.as_deref(),
        )
        .await?;

        if ctx.book(output.cost_usd, output.usage) {
            return Ok(over_budget(ctx, Phase::Product));
        }

        let transition = self.resolve_product(ctx, config, category, output.outcome);
        ctx.apply(transition.update);
        Ok(transition.next)
    }

    /// Re-checks taxonomy membership before advancing to the product phase.
    fn resolve_category(
        &self,
        ctx: &ExtractionContext,
        config: &ExtractionConfig,
        outcome: Result<Category, String>,
    ) -> Transition {
        let checked = outcome.and_then(|category| {
            validate_category(&category.name, &self.taxonomy)
                .map(|()| category)
                .map_err(|e| e.to_string())
        });

        match checked {
            Ok(category) => {
                tracing::info!(
                    category = %category.name,
                    attempt = ctx.category_attempts + 1,
                    "Category accepted"
                );
                Transition {
                    next: Stage::ExtractingProduct(category.clone()),
                    update: ContextUpdate {
                        category: Some(category),
                        category_attempted: true,
                        ..ContextUpdate::default()
                    },
                }
            }
            Err(error) => {
                let attempts = ctx.category_attempts + 1;
                let exhausted = attempts >= config.max_attempts;
                log_rejection(Phase::Category, attempts, config.max_attempts, &error);
                Transition {
                    next: if exhausted {
                        Stage::Terminated(Phase::Category)
                    } else {
                        Stage::ExtractingCategory
                    },
                    update: ContextUpdate {
                        category_retry_error: Some(error),
                        category_attempted: true,
                        status: exhausted.then_some(RunStatus::CategoryFailed),
                        ..ContextUpdate::default()
                    },
                }
            }
        }
    }

    /// Re-validates the full product before advancing to persistence.
    fn resolve_product(
        &self,
        ctx: &ExtractionContext,
        config: &ExtractionConfig,
        category: &Category,
        outcome: Result<Product, String>,
    ) -> Transition {
        let checked = outcome.and_then(|product| {
            validate_product(&product, &self.taxonomy).map_err(|e| e.to_string())?;
            if product.category != *category {
                if config.pin_category {
                    return Err(format!(
                        "Category changed from '{}' to '{}'; it must stay '{}'",
                        category.name, product.category.name, category.name
                    ));
                }
                tracing::warn!(
                    fixed = %category.name,
                    returned = %product.category.name,
                    "Product category drifted from the fixed category"
                );
            }
            Ok(product)
        });

        match checked {
            Ok(product) => {
                tracing::info!(
                    product = %product.name,
                    attempt = ctx.product_attempts + 1,
                    "Product accepted"
                );
                Transition {
                    next: Stage::Persisting(product.clone()),
                    update: ContextUpdate {
                        product: Some(product),
                        product_attempted: true,
                        ..ContextUpdate::default()
                    },
                }
            }
            Err(error) => {
                let attempts = ctx.product_attempts + 1;
                let exhausted = attempts >= config.max_attempts;
                log_rejection(Phase::Product, attempts, config.max_attempts, &error);
                Transition {
                    next: if exhausted {
                        Stage::Terminated(Phase::Product)
                    } else {
                        Stage::ExtractingProduct(category.clone())
                    },
                    update: ContextUpdate {
                        product_retry_error: Some(error),
                        product_attempted: true,
                        status: exhausted.then_some(RunStatus::ProductFailed),
                        ..ContextUpdate::default()
                    },
                }
            }
        }
    }

    async fn persist(
        &self,
        ctx: &ExtractionContext,
        product: &Product,
    ) -> Result<(), (String, crate::sink::SinkError)> {
        let Some(key) = ctx.source_key() else {
            tracing::debug!("No source key; skipping persistence");
            return Ok(());
        };
        let Some(sink) = &self.sink else {
            tracing::warn!(key, "No persistence sink configured; result not stored");
            return Ok(());
        };
        sink.upsert(key, product)
            .await
            .map_err(|e| (key.to_string(), e))
    }

    fn step_context<'a>(&'a self, config: &'a ExtractionConfig) -> StepContext<'a> {
        StepContext {
            gateway: self.gateway.as_ref(),
            model: &config.model,
            taxonomy: &self.taxonomy,
            prices: &self.prices,
        }
    }
}

/// Stops before a call once spend has reached the ceiling.
fn out_of_budget(ctx: &mut ExtractionContext, phase: Phase) -> Option<Stage> {
    if !ctx.ledger.is_exhausted() {
        return None;
    }
    tracing::warn!(
        %phase,
        spent_usd = ctx.spent_usd(),
        budget_usd = ctx.ledger.budget_usd(),
        "Budget exhausted; not issuing another call"
    );
    ctx.apply(ContextUpdate {
        status: Some(RunStatus::CostExceeded),
        ..ContextUpdate::default()
    });
    Some(Stage::Terminated(phase))
}

/// Terminates after a call pushed spend past the ceiling. The call still
/// counts as an attempt of its phase.
fn over_budget(ctx: &mut ExtractionContext, phase: Phase) -> Stage {
    tracing::warn!(
        %phase,
        spent_usd = ctx.spent_usd(),
        budget_usd = ctx.ledger.budget_usd(),
        "Call pushed spend past the budget"
    );
    ctx.apply(ContextUpdate {
        category_attempted: phase == Phase::Category,
        product_attempted: phase == Phase::Product,
        status: Some(RunStatus::CostExceeded),
        ..ContextUpdate::default()
    });
    Stage::Terminated(phase)
}

fn log_rejection(phase: Phase, attempt: usize, max_attempts: usize, error: &str) {
    tracing::warn!(%phase, attempt, max_attempts, error, "Result rejected");
}

fn transport_error(
    ctx: &mut ExtractionContext,
    phase: Phase,
    error: &GatewayError,
    start: Instant,
) -> ExtractionError {
    tracing::error!(%phase, error = %error, "Gateway call failed");
    ctx.apply(ContextUpdate {
        status: Some(RunStatus::TransportFailed),
        ..ContextUpdate::default()
    });
    ExtractionError::Transport {
        phase,
        message: error.to_string(),
        metrics: metrics_of(ctx, start),
    }
}

fn terminal_error(ctx: &ExtractionContext, phase: Phase, start: Instant) -> ExtractionError {
    let metrics = metrics_of(ctx, start);
    match (ctx.status(), phase) {
        (RunStatus::CostExceeded, _) => ExtractionError::BudgetExceeded {
            phase,
            limit_usd: ctx.ledger.budget_usd(),
            spent_usd: ctx.spent_usd(),
            metrics,
        },
        (_, Phase::Category) => ExtractionError::RetriesExhausted {
            phase,
            attempts: ctx.category_attempts,
            last_error: ctx.category_retry_error.clone().unwrap_or_default(),
            metrics,
        },
        (_, Phase::Product) => ExtractionError::RetriesExhausted {
            phase,
            attempts: ctx.product_attempts,
            last_error: ctx.product_retry_error.clone().unwrap_or_default(),
            metrics,
        },
    }
}

fn metrics_of(ctx: &ExtractionContext, start: Instant) -> ExtractionMetrics {
    ExtractionMetrics {
        category_attempts: ctx.category_attempts,
        product_attempts: ctx.product_attempts,
        spent_usd: ctx.spent_usd(),
        usage: ctx.usage,
        wall_time: start.elapsed(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_failure_leaves_a_terminal_status() {
        let mut ctx = ExtractionContext::new(String::new(), None, 1.0);
        let error = GatewayError::Transport("connection reset".to_string());

        let err = transport_error(&mut ctx, Phase::Category, &error, Instant::now());

        assert_eq!(ctx.status(), RunStatus::TransportFailed);
        assert!(matches!(
            err,
            ExtractionError::Transport {
                phase: Phase::Category,
                ..
            }
        ));
    }
}
