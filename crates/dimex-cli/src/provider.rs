//! Model provider selection.

use crate::config::{Config, ProviderKind};
use crate::error::Result;
use async_trait::async_trait;
use dimex_domain::traits::{LlmProvider, LlmRequest, LlmResponse};
use dimex_llm::{AnthropicProvider, LlmError, MockProvider, OllamaProvider};
use tracing::debug;

/// Response of the mock provider when none is configured.
const MOCK_FALLBACK_RESPONSE: &str = "{}";

/// The provider chosen by configuration.
pub enum AnyProvider {
    /// Anthropic Messages API
    Anthropic(AnthropicProvider),
    /// Local Ollama server
    Ollama(OllamaProvider),
    /// Scripted responses
    Mock(MockProvider),
}

impl AnyProvider {
    /// Build the configured provider.
    ///
    /// Model, temperature, token cap and timeout come from the pipeline
    /// settings so every backend honors the same knobs.
    pub fn from_config(config: &Config) -> Result<Self> {
        let pipeline = &config.pipeline;
        debug!(kind = ?config.provider.kind, model = %pipeline.model, "Building provider");

        let provider = match config.provider.kind {
            ProviderKind::Anthropic => {
                let mut provider = AnthropicProvider::new(config.api_key()?, &pipeline.model)
                    .with_temperature(pipeline.temperature)
                    .with_max_tokens(pipeline.max_tokens)
                    .with_timeout(pipeline.timeout());
                if let Some(endpoint) = &config.provider.endpoint {
                    provider = provider.with_endpoint(endpoint);
                }
                AnyProvider::Anthropic(provider)
            }
            ProviderKind::Ollama => {
                let endpoint = config
                    .provider
                    .endpoint
                    .as_deref()
                    .unwrap_or(dimex_llm::ollama::DEFAULT_ENDPOINT);
                AnyProvider::Ollama(
                    OllamaProvider::new(endpoint, &pipeline.model)
                        .with_temperature(pipeline.temperature)
                        .with_max_tokens(pipeline.max_tokens)
                        .with_timeout(pipeline.timeout())
                        .with_json_mode(true),
                )
            }
            ProviderKind::Mock => {
                let response = config
                    .provider
                    .mock_response
                    .as_deref()
                    .unwrap_or(MOCK_FALLBACK_RESPONSE);
                AnyProvider::Mock(MockProvider::new(response).with_model(&pipeline.model))
            }
        };

        Ok(provider)
    }
}

#[async_trait]
impl LlmProvider for AnyProvider {
    type Error = LlmError;

    fn model_name(&self) -> &str {
        match self {
            AnyProvider::Anthropic(p) => p.model_name(),
            AnyProvider::Ollama(p) => p.model_name(),
            AnyProvider::Mock(p) => p.model_name(),
        }
    }

    async fn invoke(&self, request: &LlmRequest) -> std::result::Result<LlmResponse, LlmError> {
        match self {
            AnyProvider::Anthropic(p) => p.invoke(request).await,
            AnyProvider::Ollama(p) => p.invoke(request).await,
            AnyProvider::Mock(p) => p.invoke(request).await,
        }
    }
}
