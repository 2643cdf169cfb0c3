//! Sequential batch runs over many source documents.

use crate::extraction::{ExtractionConfig, ExtractionOrchestrator, ExtractionRequest};

/// One input document.
#[derive(Debug, Clone)]
pub struct SourceDocument {
    /// Persistence key, usually the file name.
    pub key: String,
    /// Raw HTML.
    pub html: String,
}

/// Aggregate outcome of a batch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchSummary {
    /// Keys that were extracted successfully.
    pub succeeded: Vec<String>,
    /// Keys that failed, with the error text.
    pub failed: Vec<(String, String)>,
    /// Total USD spent across all documents.
    pub spent_usd: f64,
}

impl BatchSummary {
    /// Number of documents processed.
    #[must_use]
    pub fn total(&self) -> usize {
        self.succeeded.len() + self.failed.len()
    }
}

/// Runs the orchestrator once per document, one after another.
///
/// A failed document is logged and skipped; it never aborts the batch. An
/// empty batch is a no-op.
pub async fn run_batch(
    orchestrator: &ExtractionOrchestrator,
    documents: Vec<SourceDocument>,
    config: &ExtractionConfig,
) -> BatchSummary {
    let mut summary = BatchSummary::default();
    if documents.is_empty() {
        tracing::warn!("No documents to process");
        return summary;
    }

    for document in documents {
        tracing::info!(key = %document.key, "Processing document");
        let request = ExtractionRequest::keyed(document.html, document.key.clone());

        match orchestrator.run(request, config).await {
            Ok(output) => {
                summary.spent_usd += output.metrics.spent_usd;
                tracing::info!(
                    key = %document.key,
                    product = %output.product.name,
                    spent_usd = output.metrics.spent_usd,
                    "Document extracted"
                );
                summary.succeeded.push(document.key);
            }
            Err(e) => {
                summary.spent_usd += e.metrics().spent_usd;
                tracing::error!(key = %document.key, error = %e, "Document failed");
                summary.failed.push((document.key, e.to_string()));
            }
        }
    }

    tracing::info!(
        succeeded = summary.succeeded.len(),
        failed = summary.failed.len(),
        spent_usd = summary.spent_usd,
        "Batch complete"
    );
    summary
}
