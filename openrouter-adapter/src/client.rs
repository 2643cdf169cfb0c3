//! HTTP calls against the OpenRouter API.

use crate::error::OpenRouterError;
use crate::types::{
    ChatCompletion, ChatRequest, ChatResponseRaw, KeyInfo, KeyInfoEnvelope, OpenRouterConfig,
};
use reqwest::header::AUTHORIZATION;
use std::time::Instant;

#[derive(Clone)]
pub struct OpenRouterClient {
    http: reqwest::Client,
    api_key: String,
    config: OpenRouterConfig,
}

impl std::fmt::Debug for OpenRouterClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenRouterClient")
            .field("base_url", &self.config.base_url)
            .field("timeout", &self.config.timeout)
            .finish_non_exhaustive()
    }
}

impl OpenRouterClient {
    /// Builds a client whose every request is bounded by `config.timeout`.
    ///
    /// # Errors
    /// Returns an error if the underlying HTTP client cannot be constructed.
    pub fn new(api_key: impl Into<String>, config: OpenRouterConfig) -> Result<Self, OpenRouterError> {
        let http = reqwest::Client::builder().timeout(config.timeout).build()?;
        Ok(Self {
            http,
            api_key: api_key.into(),
            config,
        })
    }

    #[must_use]
    pub const fn config(&self) -> &OpenRouterConfig {
        &self.config
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{path}", self.config.base_url.trim_end_matches('/'))
    }

    fn authorized(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        let builder = builder.header(AUTHORIZATION, format!("Bearer {}", self.api_key));
        match self.config.app_title {
            Some(ref title) => builder.header("X-Title", title),
            None => builder,
        }
    }

    /// Sends a structured chat completion and returns the raw content with usage.
    ///
    /// # Errors
    /// Returns an error on network failure, a non-2xx status, an undecodable
    /// body, or a reply without message content.
    pub async fn chat_json(&self, request: &ChatRequest) -> Result<ChatCompletion, OpenRouterError> {
        let start = Instant::now();
        let response = self
            .authorized(self.http.post(self.endpoint("chat/completions")))
            .json(request)
            .send()
            .await
            .map_err(|e| {
                tracing::warn!(error = %e, model = %request.model, "OpenRouter request failed");
                OpenRouterError::Http(e)
            })?;

        let body = read_success_body(response).await?;
        let raw: ChatResponseRaw = serde_json::from_str(&body)?;

        if raw.usage.is_none() {
            tracing::warn!(model = %request.model, "No usage data in response");
        }
        let content = raw
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or(OpenRouterError::EmptyResponse)?;

        tracing::debug!(
            model = %request.model,
            duration_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX),
            "OpenRouter chat completion"
        );

        Ok(ChatCompletion {
            content,
            usage: raw.usage.unwrap_or_default(),
            model: raw.model.unwrap_or_else(|| request.model.clone()),
        })
    }

    /// Fetches spend and limit information for the configured key.
    ///
    /// # Errors
    /// Returns an error on network failure, a non-2xx status or an undecodable body.
    pub async fn key_info(&self) -> Result<KeyInfo, OpenRouterError> {
        let response = self
            .authorized(self.http.get(self.endpoint("key")))
            .send()
            .await?;
        let body = read_success_body(response).await?;
        let envelope: KeyInfoEnvelope = serde_json::from_str(&body)?;
        Ok(envelope.data)
    }
}

async fn read_success_body(response: reqwest::Response) -> Result<String, OpenRouterError> {
    let status = response.status();
    let body = response.text().await?;
    if status.is_success() {
        Ok(body)
    } else {
        tracing::warn!(status = %status, body = %body, "OpenRouter API error");
        Err(OpenRouterError::Status {
            status: status.as_u16(),
            body,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_joins_without_double_slash() {
        let config = OpenRouterConfig {
            base_url: "http://localhost:9/api/v1/".to_string(),
            ..OpenRouterConfig::default()
        };
        let client = OpenRouterClient::new("sk-test", config).unwrap();
        assert_eq!(client.endpoint("key"), "http://localhost:9/api/v1/key");
    }

    #[test]
    fn debug_output_hides_the_key() {
        let client = OpenRouterClient::new("sk-secret", OpenRouterConfig::default()).unwrap();
        assert!(!format!("{client:?}").contains("sk-secret"));
    }
}
