//! Subcommand implementations. Each takes its collaborators explicitly so it
//! can be driven with an in-memory gateway.

/// Key balance lookup.
pub mod balance;
/// Multi-model comparison on one page.
pub mod compare;
/// Single-file or whole-directory extraction with CSV persistence.
pub mod extract;

use crate::errors::CliError;
use anyhow::Context;
use pdp_extract::extraction::{ExtractionConfig, ExtractionOrchestrator};
use pdp_extract::gateway::AiGateway;
use pdp_extract::taxonomy::Taxonomy;
use std::path::PathBuf;
use std::sync::Arc;

/// Options shared by the extraction subcommands.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Directory holding input pages and, by default, the output CSV.
    pub data_dir: PathBuf,
    /// Newline-delimited category taxonomy.
    pub categories: PathBuf,
    /// Per-run model, retry bound, budget and category policy.
    pub config: ExtractionConfig,
}

impl Settings {
    /// Loads the taxonomy and builds an orchestrator without a sink.
    ///
    /// # Errors
    /// Returns an error if the config is out of range or the categories file
    /// cannot be read.
    pub async fn orchestrator(
        &self,
        gateway: Arc<dyn AiGateway>,
    ) -> Result<ExtractionOrchestrator, CliError> {
        self.config.validate()?;
        let taxonomy = Taxonomy::load(&self.categories)
            .await
            .with_context(|| format!("loading categories from {}", self.categories.display()))?;
        if taxonomy.is_empty() {
            tracing::warn!(path = %self.categories.display(), "Category taxonomy is empty");
        }
        Ok(ExtractionOrchestrator::new(gateway, Arc::new(taxonomy)))
    }
}
