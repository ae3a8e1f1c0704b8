//! Trait definitions for external interactions
//!
//! These traits define the boundaries between the pipeline and the outside
//! world: the language model, text extraction from uploaded bytes, and
//! export of results. Implementations live in other crates.

use crate::document::ProcessedDocument;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// Upper bound on reasoning/tool turns a model may take per call
pub const DEFAULT_MAX_TURNS: u32 = 5;

/// Sub-steps inside one model call run strictly one at a time
pub const SEQUENTIAL_CONCURRENCY: u32 = 1;

/// Author of a chat message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// System instructions
    System,
    /// Caller input
    User,
    /// Model output
    Assistant,
    /// Tool result
    Tool,
}

/// A role-tagged message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Message author
    pub role: Role,
    /// Text content
    pub content: String,
}

impl ChatMessage {
    /// Create a message
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

/// One call to the language-model capability
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LlmRequest {
    /// System prompt
    pub system_prompt: String,

    /// User prompt, without the format instructions
    pub user_prompt: String,

    /// Description of the expected output shape
    pub format_instructions: Option<String>,

    /// Maximum reasoning/tool turns
    pub max_turns: u32,

    /// Maximum concurrent sub-steps
    pub concurrency_limit: u32,
}

impl LlmRequest {
    /// Create a request with the default turn bound and sequential sub-steps
    pub fn new(system_prompt: impl Into<String>, user_prompt: impl Into<String>) -> Self {
        Self {
            system_prompt: system_prompt.into(),
            user_prompt: user_prompt.into(),
            format_instructions: None,
            max_turns: DEFAULT_MAX_TURNS,
            concurrency_limit: SEQUENTIAL_CONCURRENCY,
        }
    }

    /// Attach format instructions
    pub fn with_format_instructions(mut self, instructions: impl Into<String>) -> Self {
        self.format_instructions = Some(instructions.into());
        self
    }

    /// Override the turn bound
    pub fn with_max_turns(mut self, max_turns: u32) -> Self {
        self.max_turns = max_turns;
        self
    }

    /// Override the sub-step concurrency limit
    pub fn with_concurrency_limit(mut self, limit: u32) -> Self {
        self.concurrency_limit = limit;
        self
    }

    /// User prompt followed by the format instructions, as sent to the model
    pub fn rendered_user_prompt(&self) -> String {
        match &self.format_instructions {
            Some(instructions) => format!("{}\n\n{}", self.user_prompt, instructions),
            None => self.user_prompt.clone(),
        }
    }
}

/// What a model call returns
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LlmResponse {
    /// Raw text
    Text(String),
    /// A conversation whose last message holds the candidate output
    Messages(Vec<ChatMessage>),
}

impl LlmResponse {
    /// Candidate output text: the raw text, or the last message's content
    pub fn into_text(self) -> String {
        match self {
            LlmResponse::Text(text) => text,
            LlmResponse::Messages(messages) => messages
                .into_iter()
                .last()
                .map(|m| m.content)
                .unwrap_or_default(),
        }
    }
}

/// Trait for LLM provider operations
///
/// Implemented by the infrastructure layer (dimex-llm). A call must be
/// cancel-safe: dropping the returned future abandons the request without
/// touching shared state.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Error type for LLM operations
    type Error: Display + Send;

    /// Identifier of the backing model, recorded in provenance
    fn model_name(&self) -> &str;

    /// Run one bounded model call
    async fn invoke(&self, request: &LlmRequest) -> Result<LlmResponse, Self::Error>;
}

/// Turns uploaded bytes into plain text (PDF extraction, decoding...)
pub trait TextSource {
    /// Error type for extraction
    type Error: Display;

    /// Extract text from raw bytes
    fn extract_text(&self, bytes: &[u8]) -> Result<String, Self::Error>;
}

/// Receives processed documents for display or export
pub trait ResultSink {
    /// Error type for export
    type Error: Display;

    /// Write the given documents
    fn write(&mut self, documents: &[ProcessedDocument]) -> Result<(), Self::Error>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_defaults() {
        let request = LlmRequest::new("sys", "user");
        assert_eq!(request.max_turns, DEFAULT_MAX_TURNS);
        assert_eq!(request.concurrency_limit, SEQUENTIAL_CONCURRENCY);
        assert_eq!(request.rendered_user_prompt(), "user");
    }

    #[test]
    fn test_rendered_prompt_appends_instructions() {
        let request = LlmRequest::new("sys", "analyze this").with_format_instructions("answer in JSON");
        assert_eq!(request.rendered_user_prompt(), "analyze this\n\nanswer in JSON");
    }

    #[test]
    fn test_response_text_from_last_message() {
        let response = LlmResponse::Messages(vec![
            ChatMessage::new(Role::User, "question"),
            ChatMessage::new(Role::Assistant, "thinking"),
            ChatMessage::new(Role::Assistant, "{\"a\": 1}"),
        ]);
        assert_eq!(response.into_text(), "{\"a\": 1}");
    }

    #[test]
    fn test_response_text_from_empty_conversation() {
        assert_eq!(LlmResponse::Messages(Vec::new()).into_text(), "");
        assert_eq!(LlmResponse::Text("raw".into()).into_text(), "raw");
    }
}
