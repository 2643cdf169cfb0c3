use thiserror::Error;

#[derive(Debug, Error)]
pub enum OpenRouterError {
    #[error("OpenRouter API key not found: {0}")]
    ApiKeyNotFound(String),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("OpenRouter returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("OpenRouter response had no message content")]
    EmptyResponse,

    #[error("Failed to decode OpenRouter response: {0}")]
    Decode(#[from] serde_json::Error),
}
