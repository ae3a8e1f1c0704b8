//! Dimex LLM Provider Layer
//!
//! Pluggable implementations of the `LlmProvider` trait from `dimex-domain`.
//!
//! # Providers
//!
//! - `MockProvider`: Deterministic mock for testing
//! - `OllamaProvider`: Local Ollama chat API
//! - `AnthropicProvider`: Anthropic Messages API
//!
//! No provider retries. A failed or timed-out call is reported once and the
//! caller decides what to do with the document.
//!
//! # Examples
//!
//! ```
//! use dimex_llm::MockProvider;
//! use dimex_domain::traits::{LlmProvider, LlmRequest};
//!
//! # tokio_test::block_on(async {
//! let provider = MockProvider::new("Hello from LLM!");
//! let response = provider.invoke(&LlmRequest::new("system", "prompt")).await.unwrap();
//! assert_eq!(response.into_text(), "Hello from LLM!");
//! # });
//! ```

#![warn(missing_docs)]

pub mod anthropic;
pub mod ollama;

use async_trait::async_trait;
use dimex_domain::traits::{ChatMessage, LlmProvider, LlmRequest, LlmResponse, Role};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use thiserror::Error;

pub use anthropic::AnthropicProvider;
pub use ollama::OllamaProvider;

/// Errors that can occur during LLM operations
#[derive(Error, Debug)]
pub enum LlmError {
    /// Network or API communication error
    #[error("Communication error: {0}")]
    Communication(String),

    /// The HTTP request did not complete in time
    #[error("Request timed out")]
    Timeout,

    /// Invalid response from LLM
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Rate limit exceeded
    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    /// Credentials rejected
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Model not available
    #[error("Model not available: {0}")]
    ModelNotAvailable(String),

    /// The request asks for something the provider cannot honor
    #[error("Unsupported request: {0}")]
    Unsupported(String),

    /// Generic error
    #[error("LLM error: {0}")]
    Other(String),
}

impl From<reqwest::Error> for LlmError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            LlmError::Timeout
        } else {
            LlmError::Communication(format!("Request failed: {}", e))
        }
    }
}

/// Reject requests that leave no room for a single turn
///
/// None of the bundled providers registers tools, so a call always takes
/// exactly one turn and one sequential step.
pub(crate) fn check_bounds(request: &LlmRequest) -> Result<(), LlmError> {
    if request.max_turns == 0 {
        return Err(LlmError::Unsupported("max_turns must be at least 1".to_string()));
    }
    if request.concurrency_limit == 0 {
        return Err(LlmError::Unsupported("concurrency_limit must be at least 1".to_string()));
    }
    Ok(())
}

#[derive(Debug, Clone)]
enum Scripted {
    Text(String),
    Messages(Vec<ChatMessage>),
    Error,
}

#[derive(Debug, Default)]
struct MockState {
    triggers: Vec<(String, Scripted)>,
    requests: Vec<LlmRequest>,
}

/// Mock LLM provider for deterministic testing
///
/// Returns pre-configured responses without making any network calls. A
/// response registered with [`MockProvider::add_response`] is returned when
/// the rendered user prompt contains its trigger; otherwise the default
/// response is used. Every request is recorded.
///
/// # Examples
///
/// ```
/// use dimex_llm::MockProvider;
/// use dimex_domain::traits::{LlmProvider, LlmRequest};
///
/// # tokio_test::block_on(async {
/// let mut provider = MockProvider::default();
/// provider.add_response("paper-a", "response a");
/// let request = LlmRequest::new("sys", "chunks of paper-a");
/// assert_eq!(provider.invoke(&request).await.unwrap().into_text(), "response a");
/// assert_eq!(provider.call_count(), 1);
/// # });
/// ```
#[derive(Debug, Clone)]
pub struct MockProvider {
    model: String,
    default_response: String,
    delay: Option<Duration>,
    state: Arc<Mutex<MockState>>,
}

impl MockProvider {
    /// Create a new MockProvider with a fixed response for all prompts
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            model: "mock-model".to_string(),
            default_response: response.into(),
            delay: None,
            state: Arc::new(Mutex::new(MockState::default())),
        }
    }

    /// Set the reported model name
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Sleep before answering (for timeout tests)
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Return `response` when the prompt contains `trigger`
    pub fn add_response(&mut self, trigger: impl Into<String>, response: impl Into<String>) {
        self.lock()
            .triggers
            .push((trigger.into(), Scripted::Text(response.into())));
    }

    /// Return a conversation when the prompt contains `trigger`
    pub fn add_messages(&mut self, trigger: impl Into<String>, messages: Vec<ChatMessage>) {
        self.lock()
            .triggers
            .push((trigger.into(), Scripted::Messages(messages)));
    }

    /// Fail when the prompt contains `trigger`
    pub fn add_error(&mut self, trigger: impl Into<String>) {
        self.lock().triggers.push((trigger.into(), Scripted::Error));
    }

    /// Get the number of times the provider was invoked
    pub fn call_count(&self) -> usize {
        self.lock().requests.len()
    }

    /// Reset the call count and recorded requests
    pub fn reset_call_count(&self) {
        self.lock().requests.clear();
    }

    /// Requests received so far, oldest first
    pub fn requests(&self) -> Vec<LlmRequest> {
        self.lock().requests.clone()
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new("Default mock response")
    }
}

#[async_trait]
impl LlmProvider for MockProvider {
    type Error = LlmError;

    fn model_name(&self) -> &str {
        &self.model
    }

    async fn invoke(&self, request: &LlmRequest) -> Result<LlmResponse, Self::Error> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let scripted = {
            let mut state = self.lock();
            state.requests.push(request.clone());
            let prompt = request.rendered_user_prompt();
            state
                .triggers
                .iter()
                .find(|(trigger, _)| prompt.contains(trigger.as_str()))
                .map(|(_, scripted)| scripted.clone())
        };

        check_bounds(request)?;

        match scripted {
            Some(Scripted::Text(text)) => Ok(LlmResponse::Text(text)),
            Some(Scripted::Messages(messages)) => Ok(LlmResponse::Messages(messages)),
            Some(Scripted::Error) => Err(LlmError::Other("Mock error".to_string())),
            None => Ok(LlmResponse::Messages(vec![
                ChatMessage::new(Role::User, request.rendered_user_prompt()),
                ChatMessage::new(Role::Assistant, self.default_response.clone()),
            ])),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(prompt: &str) -> LlmRequest {
        LlmRequest::new("system", prompt)
    }

    #[tokio::test]
    async fn test_mock_provider_default() {
        let provider = MockProvider::new("Test response");
        let result = provider.invoke(&request("any prompt")).await;
        assert_eq!(result.unwrap().into_text(), "Test response");
    }

    #[tokio::test]
    async fn test_mock_provider_specific_responses() {
        let mut provider = MockProvider::default();
        provider.add_response("hello", "world");
        provider.add_response("foo", "bar");

        assert_eq!(provider.invoke(&request("say hello")).await.unwrap().into_text(), "world");
        assert_eq!(provider.invoke(&request("foo")).await.unwrap().into_text(), "bar");
        assert_eq!(
            provider.invoke(&request("unknown")).await.unwrap().into_text(),
            "Default mock response"
        );
    }

    #[tokio::test]
    async fn test_mock_provider_matches_format_instructions() {
        let mut provider = MockProvider::default();
        provider.add_response("JSON schema", "{}");
        let req = request("prompt").with_format_instructions("Use this JSON schema");
        assert_eq!(provider.invoke(&req).await.unwrap().into_text(), "{}");
    }

    #[tokio::test]
    async fn test_mock_provider_call_count() {
        let provider = MockProvider::new("test");
        assert_eq!(provider.call_count(), 0);

        provider.invoke(&request("prompt1")).await.unwrap();
        assert_eq!(provider.call_count(), 1);

        provider.invoke(&request("prompt2")).await.unwrap();
        assert_eq!(provider.call_count(), 2);
        assert_eq!(provider.requests()[1].user_prompt, "prompt2");

        provider.reset_call_count();
        assert_eq!(provider.call_count(), 0);
    }

    #[tokio::test]
    async fn test_mock_provider_error() {
        let mut provider = MockProvider::default();
        provider.add_error("bad prompt");

        let result = provider.invoke(&request("a bad prompt")).await;
        assert!(matches!(result, Err(LlmError::Other(_))));
    }

    #[tokio::test]
    async fn test_mock_provider_messages() {
        let mut provider = MockProvider::default();
        provider.add_messages(
            "chat",
            vec![
                ChatMessage::new(Role::Assistant, "draft"),
                ChatMessage::new(Role::Assistant, "final"),
            ],
        );
        let response = provider.invoke(&request("chat please")).await.unwrap();
        assert_eq!(response.into_text(), "final");
    }

    #[tokio::test]
    async fn test_mock_provider_rejects_zero_turns() {
        let provider = MockProvider::default();
        let result = provider.invoke(&request("x").with_max_turns(0)).await;
        assert!(matches!(result, Err(LlmError::Unsupported(_))));
    }

    #[tokio::test]
    async fn test_mock_provider_clone_shares_state() {
        let provider1 = MockProvider::new("test");
        let provider2 = provider1.clone();

        provider1.invoke(&request("test")).await.unwrap();

        assert_eq!(provider1.call_count(), 1);
        assert_eq!(provider2.call_count(), 1);
    }

    #[test]
    fn test_model_name() {
        let provider = MockProvider::default().with_model("scorer");
        assert_eq!(provider.model_name(), "scorer");
    }
}
