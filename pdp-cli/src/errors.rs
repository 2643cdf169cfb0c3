use std::path::PathBuf;
use thiserror::Error;

/// Errors surfaced by the `pdp-extract` binary.
#[derive(Debug, Error)]
pub enum CliError {
    /// Error from the OpenRouter adapter.
    #[error("OpenRouter error: {0}")]
    OpenRouter(#[from] openrouter_adapter::OpenRouterError),

    /// The extraction settings are out of range.
    #[error("Invalid settings: {0}")]
    Config(#[from] pdp_extract::extraction::ConfigError),

    /// The requested input file does not exist.
    #[error("File not found: {}", .0.display())]
    InputNotFound(PathBuf),

    /// I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Anyhow error.
    #[error("Anyhow error: {0}")]
    Anyhow(#[from] anyhow::Error),
}
