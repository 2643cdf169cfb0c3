use async_trait::async_trait;
use openrouter_adapter::{build_request, ChatMessage, OpenRouterClient, Usage};
use pdp_extract::gateway::{
    AiGateway, GatewayError, GatewayResponse, Message, OutputSchema, Role, TokenUsage,
};

/// [`AiGateway`] backed by the OpenRouter chat-completions API.
#[derive(Debug, Clone)]
pub struct OpenRouterGateway {
    client: OpenRouterClient,
}

impl OpenRouterGateway {
    /// Wraps a configured client.
    #[must_use]
    pub const fn new(client: OpenRouterClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl AiGateway for OpenRouterGateway {
    async fn call(
        &self,
        model: &str,
        messages: &[Message],
        schema: &OutputSchema,
    ) -> Result<GatewayResponse, GatewayError> {
        let request = build_request(
            model,
            messages.iter().map(to_chat_message).collect(),
            &schema.name,
            schema.schema.clone(),
        );

        let completion = self
            .client
            .chat_json(&request)
            .await
            .map_err(|e| GatewayError::Transport(e.to_string()))?;

        let usage = to_token_usage(&completion.usage);
        let data = parse_content(&completion.content, usage)?;

        Ok(GatewayResponse {
            data,
            usage,
            model: completion.model,
        })
    }
}

fn to_chat_message(message: &Message) -> ChatMessage {
    let role = match message.role {
        Role::System => "system",
        Role::User => "user",
    };
    ChatMessage::new(role, message.content.clone())
}

/// Maps wire usage onto the ledger's token counts.
#[must_use]
pub fn to_token_usage(usage: &Usage) -> TokenUsage {
    TokenUsage {
        input_tokens: usage.prompt_tokens,
        output_tokens: usage.completion_tokens,
        reasoning_tokens: usage.reasoning_tokens(),
    }
}

/// Parses assistant content as JSON, tolerating a surrounding Markdown fence.
///
/// # Errors
/// Returns [`GatewayError::MalformedOutput`] carrying `usage` when the content
/// is not JSON.
pub fn parse_content(
    content: &str,
    usage: TokenUsage,
) -> Result<serde_json::Value, GatewayError> {
    serde_json::from_str(strip_fence(content)).map_err(|e| GatewayError::MalformedOutput {
        message: e.to_string(),
        usage,
    })
}

fn strip_fence(content: &str) -> &str {
    let trimmed = content.trim();
    trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .and_then(|rest| rest.strip_suffix("```"))
        .map_or(trimmed, str::trim)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use openrouter_adapter::CompletionTokensDetails;
    use serde_json::json;

    #[test]
    fn usage_maps_reasoning_separately() {
        let usage = Usage {
            prompt_tokens: 1000,
            completion_tokens: 200,
            completion_tokens_details: Some(CompletionTokensDetails {
                reasoning_tokens: Some(150),
            }),
        };
        assert_eq!(
            to_token_usage(&usage),
            TokenUsage {
                input_tokens: 1000,
                output_tokens: 200,
                reasoning_tokens: 150,
            }
        );
    }

    #[test]
    fn parses_plain_and_fenced_json() {
        let usage = TokenUsage::default();
        assert_eq!(
            parse_content(r#"{"name":"Hardware > Tools"}"#, usage).unwrap(),
            json!({"name": "Hardware > Tools"})
        );
        assert_eq!(
            parse_content("```json\n{\"name\": \"A\"}\n```", usage).unwrap(),
            json!({"name": "A"})
        );
    }

    #[test]
    fn malformed_content_keeps_usage() {
        let usage = TokenUsage {
            input_tokens: 10,
            output_tokens: 5,
            reasoning_tokens: 0,
        };
        match parse_content("Sure! Here is the product:", usage) {
            Err(GatewayError::MalformedOutput { usage: kept, .. }) => assert_eq!(kept, usage),
            other => panic!("expected malformed output, got {other:?}"),
        }
    }

    #[test]
    fn roles_are_lowercase_on_the_wire() {
        let message = to_chat_message(&Message::system("be precise"));
        assert_eq!(message.role, "system");
        assert_eq!(to_chat_message(&Message::user("x")).role, "user");
    }
}
