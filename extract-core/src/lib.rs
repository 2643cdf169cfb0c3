//! Extraction of structured product records from product detail pages.
//!
//! Semantic understanding is delegated to an external model behind the
//! [`gateway::AiGateway`] trait. The [`extraction::ExtractionOrchestrator`]
//! infers a category, then the full product with that category pinned,
//! retrying each phase on validation failure and stopping at a spend ceiling.

pub mod batch;
pub mod extraction;
pub mod filter;
pub mod gateway;
pub mod ledger;
pub mod model;
pub mod prompts;
pub mod sink;
pub mod steps;
pub mod taxonomy;
pub mod validation;

/// Common traits and types for ergonomic usage of the extraction pipeline.
pub mod prelude {
    pub use crate::batch::{run_batch, BatchSummary, SourceDocument};
    pub use crate::extraction::{
        ConfigError, ExtractionConfig, ExtractionError, ExtractionMetrics, ExtractionOrchestrator,
        ExtractionOutput, ExtractionRequest, Phase,
    };
    pub use crate::gateway::{
        AiGateway, GatewayError, GatewayResponse, Message, OutputSchema, TokenUsage,
    };
    pub use crate::ledger::{ModelPrice, PriceTable};
    pub use crate::model::{Category, OptionEntry, Price, Product, Variant};
    pub use crate::sink::{CsvSink, PersistenceSink, SinkError};
    pub use crate::taxonomy::Taxonomy;
}
