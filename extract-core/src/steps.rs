//! The two extraction steps. Each performs exactly one gateway call.
//!
//! A step only fails with `Err` when the gateway transport fails. Invalid
//! payloads come back as `Ok` with a failed [`StepOutput::outcome`] and the
//! cost of the call, because the call was paid for either way.

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::extraction::metrics::estimate_tokens;
use crate::gateway::{AiGateway, GatewayError, Message, OutputSchema, TokenUsage};
use crate::ledger::PriceTable;
use crate::model::{category_schema, product_schema, Category, Product};
use crate::prompts::{category_messages, product_messages};
use crate::taxonomy::Taxonomy;
use crate::validation::{collect_validation_errors, validate_category, validate_product};

/// Collaborators shared by both steps.
#[derive(Clone, Copy)]
pub struct StepContext<'a> {
    /// Model gateway.
    pub gateway: &'a dyn AiGateway,
    /// Model id to call.
    pub model: &'a str,
    /// Valid categories.
    pub taxonomy: &'a Taxonomy,
    /// Price table used to cost the call.
    pub prices: &'a PriceTable,
}

/// Result of one completed model call.
#[derive(Debug, Clone)]
pub struct StepOutput<T> {
    /// Validated value, or the error text to thread into the retry.
    pub outcome: Result<T, String>,
    /// Token usage of the call.
    pub usage: TokenUsage,
    /// USD cost of the call.
    pub cost_usd: f64,
}

/// Infers the product category.
///
/// # Errors
/// Returns the gateway error if the call itself failed.
pub async fn extract_category(
    ctx: StepContext<'_>,
    filtered_html: &str,
    prior_error: Option<&str>,
) -> Result<StepOutput<Category>, GatewayError> {
    let messages = category_messages(ctx.taxonomy, filtered_html, prior_error);
    let schema = OutputSchema {
        name: "Category".to_string(),
        schema: category_schema(),
    };

    let mut output = call_structured::<Category>(ctx, &messages, &schema).await?;
    output.outcome = output.outcome.and_then(|category| {
        validate_category(&category.name, ctx.taxonomy)
            .map(|()| category)
            .map_err(|e| e.to_string())
    });
    Ok(output)
}

/// Infers the full product with the category pinned in the prompt.
///
/// # Errors
/// Returns the gateway error if the call itself failed.
pub async fn extract_product(
    ctx: StepContext<'_>,
    filtered_html: &str,
    category_name: &str,
    prior_error: Option<&str>,
) -> Result<StepOutput<Product>, GatewayError> {
    let messages = product_messages(filtered_html, category_name, prior_error);
    let schema = OutputSchema {
        name: "Product".to_string(),
        schema: product_schema(),
    };

    let mut output = call_structured::<Product>(ctx, &messages, &schema).await?;
    output.outcome = output.outcome.and_then(|product| {
        validate_product(&product, ctx.taxonomy)
            .map(|()| product)
            .map_err(|e| e.to_string())
    });
    Ok(output)
}

/// Calls the gateway and runs the payload through schema validation and
/// typed deserialization.
async fn call_structured<T: DeserializeOwned>(
    ctx: StepContext<'_>,
    messages: &[Message],
    schema: &OutputSchema,
) -> Result<StepOutput<T>, GatewayError> {
    tracing::debug!(
        model = ctx.model,
        schema = %schema.name,
        estimated_input_tokens = messages.iter().map(|m| estimate_tokens(&m.content)).sum::<usize>(),
        "Calling model"
    );

    let (outcome, usage) = match ctx.gateway.call(ctx.model, messages, schema).await {
        Ok(response) => (parse_payload(&schema.schema, response.data), response.usage),
        Err(GatewayError::MalformedOutput { message, usage }) => {
            (Err(format!("Response was not valid JSON: {message}")), usage)
        }
        Err(e) => return Err(e),
    };

    let cost_usd = ctx.prices.compute_cost(ctx.model, &usage);
    Ok(StepOutput {
        outcome,
        usage,
        cost_usd,
    })
}

fn parse_payload<T: DeserializeOwned>(schema: &Value, data: Value) -> Result<T, String> {
    let errors = collect_validation_errors(schema, &data);
    if !errors.is_empty() {
        return Err(errors.join("; "));
    }
    serde_json::from_value(data).map_err(|e| format!("Deserialization failed: {e}"))
}
