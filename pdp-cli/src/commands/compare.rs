use super::extract::resolve_inputs;
use super::Settings;
use crate::errors::CliError;
use pdp_extract::extraction::{ExtractionError, ExtractionOutput, ExtractionRequest};
use pdp_extract::gateway::AiGateway;
use pdp_extract::model::Product;
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Models compared when none are given.
pub const DEFAULT_MODELS: [&str; 2] = ["openai/gpt-5-nano", "openai/gpt-5-mini"];

/// Default results file.
pub const DEFAULT_RESULTS: &str = "model_test_results.json";

/// Outcome of one model on the comparison page.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ComparisonRecord {
    /// Model id.
    pub model: String,
    /// Wall time, rounded to milliseconds.
    pub time_seconds: f64,
    /// Spend, rounded to six decimals.
    pub cost_usd: f64,
    /// Why no product was produced.
    pub error: Option<String>,
    /// Extracted product on success.
    pub product: Option<Product>,
}

impl ComparisonRecord {
    /// Summarizes one orchestrator run.
    #[must_use]
    pub fn from_outcome(
        model: &str,
        elapsed: Duration,
        outcome: Result<ExtractionOutput, ExtractionError>,
    ) -> Self {
        let (spent, error, product) = match outcome {
            Ok(output) => (output.metrics.spent_usd, None, Some(output.product)),
            Err(e) => {
                let error = match &e {
                    ExtractionError::BudgetExceeded { .. } => "cost limit exceeded".to_string(),
                    ExtractionError::RetriesExhausted { last_error, .. } => last_error.clone(),
                    other => other.to_string(),
                };
                (e.metrics().spent_usd, Some(error), None)
            }
        };

        Self {
            model: model.to_string(),
            time_seconds: round_to(elapsed.as_secs_f64(), 3),
            cost_usd: round_to(spent, 6),
            error,
            product,
        }
    }

    /// One-line human summary.
    #[must_use]
    pub fn summary_line(&self) -> String {
        format!(
            "  time={}s cost=${} error={}",
            self.time_seconds,
            self.cost_usd,
            self.error.as_deref().unwrap_or("none")
        )
    }
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let scale = 10f64.powi(decimals);
    (value * scale).round() / scale
}

/// Runs every model against one page without persisting, then writes the
/// records as a JSON array to `out`.
///
/// Without `html`, the first `*.html` in the data directory is used.
///
/// # Errors
/// Returns an error if no page is found, the taxonomy cannot be loaded, or
/// the results cannot be written. Model failures are recorded, not raised.
pub async fn run(
    settings: &Settings,
    gateway: Arc<dyn AiGateway>,
    html: Option<&Path>,
    models: &[String],
    out: &Path,
) -> Result<Vec<ComparisonRecord>, CliError> {
    let page = resolve_inputs(&settings.data_dir, html)
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| CliError::InputNotFound(settings.data_dir.join("*.html")))?;
    let content = String::from_utf8_lossy(&tokio::fs::read(&page).await?).into_owned();
    let orchestrator = settings.orchestrator(gateway).await?;

    let mut records = Vec::with_capacity(models.len());
    for model in models {
        println!("Testing {model}...");
        let config = settings.config.clone().with_model(model.as_str());
        let start = Instant::now();
        let outcome = orchestrator
            .run(ExtractionRequest::unkeyed(content.as_str()), &config)
            .await;
        let record = ComparisonRecord::from_outcome(model, start.elapsed(), outcome);
        println!("{}", record.summary_line());
        records.push(record);
    }

    write_results(out, &records).await?;
    println!("Wrote {} results to {}", records.len(), out.display());
    Ok(records)
}

async fn write_results(out: &Path, records: &[ComparisonRecord]) -> Result<(), CliError> {
    if let Some(parent) = out.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(out, serde_json::to_string_pretty(records)?).await?;
    Ok(())
}

/// Default models as owned strings, for argument defaults.
#[must_use]
pub fn default_models() -> Vec<String> {
    DEFAULT_MODELS.iter().map(ToString::to_string).collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pdp_extract::extraction::{ExtractionMetrics, Phase};

    fn metrics(spent_usd: f64) -> ExtractionMetrics {
        ExtractionMetrics {
            spent_usd,
            ..ExtractionMetrics::default()
        }
    }

    #[test]
    fn budget_failure_reads_as_cost_limit() {
        let record = ComparisonRecord::from_outcome(
            "openai/gpt-5",
            Duration::from_millis(1234),
            Err(ExtractionError::BudgetExceeded {
                phase: Phase::Product,
                limit_usd: 1.0,
                spent_usd: 1.2,
                metrics: metrics(1.200_000_4),
            }),
        );

        assert_eq!(record.error.as_deref(), Some("cost limit exceeded"));
        assert!((record.time_seconds - 1.234).abs() < 1e-9);
        assert!((record.cost_usd - 1.2).abs() < 1e-9);
        assert!(record.product.is_none());
    }

    #[test]
    fn retry_failure_reports_last_error() {
        let record = ComparisonRecord::from_outcome(
            "openai/gpt-5-nano",
            Duration::ZERO,
            Err(ExtractionError::RetriesExhausted {
                phase: Phase::Category,
                attempts: 5,
                last_error: "Category 'Shoes' is not a valid category in the taxonomy".into(),
                metrics: metrics(0.002),
            }),
        );

        assert!(record.summary_line().contains("error=Category 'Shoes'"));
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["product"], serde_json::Value::Null);
        assert_eq!(json["model"], "openai/gpt-5-nano");
    }
}
