//! Request body builder for structured chat completions.
//!
//! OpenRouter forwards `response_format` to providers that support JSON
//! schema output. `strict` is off; replies are validated by the caller.

use crate::types::{ChatMessage, ChatRequest, JsonSchemaFormat, ResponseFormat};
use serde_json::Value;

/// Builds a chat-completions body asking for JSON matching `schema`.
#[must_use]
pub fn build_request(
    model: &str,
    messages: Vec<ChatMessage>,
    schema_name: &str,
    schema: Value,
) -> ChatRequest {
    ChatRequest {
        model: model.to_string(),
        messages,
        response_format: ResponseFormat {
            format_type: "json_schema".to_string(),
            json_schema: JsonSchemaFormat {
                name: schema_name.to_string(),
                strict: false,
                schema,
            },
        },
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn body_carries_json_schema_response_format() {
        let request = build_request(
            "openai/gpt-5-nano",
            vec![
                ChatMessage::new("system", "Extract."),
                ChatMessage::new("user", "<p>Boot</p>"),
            ],
            "Category",
            json!({"type": "object", "required": ["name"]}),
        );

        let body = serde_json::to_value(&request).unwrap();
        assert_eq!(body["model"], "openai/gpt-5-nano");
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][1]["content"], "<p>Boot</p>");
        assert_eq!(body["response_format"]["type"], "json_schema");
        assert_eq!(body["response_format"]["json_schema"]["name"], "Category");
        assert_eq!(body["response_format"]["json_schema"]["strict"], false);
        assert_eq!(
            body["response_format"]["json_schema"]["schema"]["required"][0],
            "name"
        );
    }
}
