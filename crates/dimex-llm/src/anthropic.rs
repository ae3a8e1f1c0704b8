//! Anthropic Messages API provider
//!
//! Sends the system prompt in the top-level `system` field and the rendered
//! user prompt as the only user message.

use crate::{check_bounds, LlmError};
use async_trait::async_trait;
use dimex_domain::traits::{LlmProvider, LlmRequest, LlmResponse};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// Messages API endpoint
pub const DEFAULT_ENDPOINT: &str = "https://api.anthropic.com/v1/messages";

/// API version header value
pub const API_VERSION: &str = "2023-06-01";

/// Default model
pub const DEFAULT_MODEL: &str = "claude-haiku-4-5";

/// Default sampling temperature
pub const DEFAULT_TEMPERATURE: f32 = 0.5;

/// Default cap on output tokens
pub const DEFAULT_MAX_TOKENS: u32 = 5000;

/// Default timeout for a single call (30 seconds)
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Provider backed by the Anthropic Messages API
pub struct AnthropicProvider {
    api_key: String,
    model: String,
    endpoint: String,
    temperature: f32,
    max_tokens: u32,
    client: reqwest::Client,
}

#[derive(Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    system: &'a str,
    messages: Vec<RequestMessage<'a>>,
}

#[derive(Serialize)]
struct RequestMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    content: Vec<ResponseBlock>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ResponseBlock {
    Text {
        text: String,
    },
    #[serde(other)]
    Other,
}

impl AnthropicProvider {
    /// Create a provider for `model` authenticated with `api_key`
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: model.into(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
            client: build_client(Duration::from_secs(DEFAULT_TIMEOUT_SECS)),
        }
    }

    /// Override the endpoint (proxies, gateways)
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Set the sampling temperature
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Cap the number of generated tokens
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Set the HTTP timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.client = build_client(timeout);
        self
    }

    async fn complete(&self, request: &LlmRequest) -> Result<String, LlmError> {
        check_bounds(request)?;

        let user_prompt = request.rendered_user_prompt();
        let body = MessagesRequest {
            model: &self.model,
            max_tokens: self.max_tokens,
            temperature: self.temperature,
            system: &request.system_prompt,
            messages: vec![RequestMessage {
                role: "user",
                content: &user_prompt,
            }],
        };

        debug!(model = %self.model, "Sending Anthropic messages request");

        let response = self
            .client
            .post(&self.endpoint)
            .header("x-api-key", self.api_key.trim())
            .header("anthropic-version", API_VERSION)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        match status {
            reqwest::StatusCode::UNAUTHORIZED | reqwest::StatusCode::FORBIDDEN => {
                let text = response.text().await.unwrap_or_default();
                return Err(LlmError::Authentication(text));
            }
            reqwest::StatusCode::NOT_FOUND => {
                return Err(LlmError::ModelNotAvailable(self.model.clone()));
            }
            reqwest::StatusCode::TOO_MANY_REQUESTS => return Err(LlmError::RateLimitExceeded),
            s if !s.is_success() => {
                let text = response
                    .text()
                    .await
                    .unwrap_or_else(|_| "<body unavailable>".to_string());
                return Err(LlmError::Communication(format!("HTTP {}: {}", s, text)));
            }
            _ => {}
        }

        let parsed: MessagesResponse = response
            .json()
            .await
            .map_err(|e| LlmError::InvalidResponse(format!("Failed to parse response: {}", e)))?;

        Ok(collect_text(parsed))
    }
}

fn collect_text(response: MessagesResponse) -> String {
    response
        .content
        .into_iter()
        .filter_map(|block| match block {
            ResponseBlock::Text { text } => Some(text),
            ResponseBlock::Other => None,
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn build_client(timeout: Duration) -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .unwrap_or_else(|_| reqwest::Client::new())
}

#[async_trait]
impl LlmProvider for AnthropicProvider {
    type Error = LlmError;

    fn model_name(&self) -> &str {
        &self.model
    }

    async fn invoke(&self, request: &LlmRequest) -> Result<LlmResponse, Self::Error> {
        self.complete(request).await.map(LlmResponse::Text)
    }
}
