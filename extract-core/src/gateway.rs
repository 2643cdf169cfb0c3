//! Interface to the external model service.
//!
//! The orchestrator never talks to a provider directly; the binary builds a
//! concrete gateway once and injects it as an `Arc<dyn AiGateway>`.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Role of a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Instructions.
    System,
    /// Task input.
    User,
}

/// One chat message sent to the model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Author role.
    pub role: Role,
    /// Text content.
    pub content: String,
}

impl Message {
    /// A system message.
    #[must_use]
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    /// A user message.
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// Schema the model output must conform to.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputSchema {
    /// Schema name reported to the provider.
    pub name: String,
    /// JSON schema document.
    pub schema: Value,
}

/// Token counts reported for one call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    /// Prompt tokens.
    pub input_tokens: u64,
    /// Completion tokens.
    pub output_tokens: u64,
    /// Reasoning tokens, if the provider reports them.
    #[serde(default)]
    pub reasoning_tokens: u64,
}

impl TokenUsage {
    /// Field-wise sum.
    #[must_use]
    pub const fn saturating_add(self, other: Self) -> Self {
        Self {
            input_tokens: self.input_tokens.saturating_add(other.input_tokens),
            output_tokens: self.output_tokens.saturating_add(other.output_tokens),
            reasoning_tokens: self.reasoning_tokens.saturating_add(other.reasoning_tokens),
        }
    }
}

/// Structured result of one gateway call.
#[derive(Debug, Clone, PartialEq)]
pub struct GatewayResponse {
    /// Parsed JSON payload.
    pub data: Value,
    /// Token usage of the call.
    pub usage: TokenUsage,
    /// Model id that served the call.
    pub model: String,
}

/// Errors surfaced by a gateway.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The call completed but its output was not valid JSON.
    ///
    /// Validation-shaped: the orchestrator retries it and books its cost.
    #[error("Model output is not valid JSON: {message}")]
    MalformedOutput {
        /// Parse error text.
        message: String,
        /// Usage of the completed call.
        usage: TokenUsage,
    },

    /// The call itself failed (network, auth, provider error).
    #[error("Gateway transport failed: {0}")]
    Transport(String),
}

/// Sends a prompt and expected schema to a model and returns parsed output.
#[async_trait]
pub trait AiGateway: Send + Sync {
    /// Performs one structured-output call.
    async fn call(
        &self,
        model: &str,
        messages: &[Message],
        schema: &OutputSchema,
    ) -> Result<GatewayResponse, GatewayError>;
}
