//! Error types for the Extractor

use dimex_domain::DomainError;
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur while processing a document
///
/// Parse failures are not errors: they become degraded records. What remains
/// here are failures with no model text to keep.
#[derive(Error, Debug)]
pub enum ExtractorError {
    /// LLM provider error (transport, HTTP status, auth)
    #[error("LLM error: {0}")]
    Llm(String),

    /// The model call exceeded the per-call bound
    #[error("Model call timed out after {0:?}")]
    Timeout(Duration),

    /// Source text could not be obtained from the uploaded bytes
    #[error("Text extraction failed: {0}")]
    TextSource(String),

    /// Reading or writing a file failed
    #[error("I/O error: {0}")]
    Io(String),

    /// JSON parsing error on an input document
    #[error("JSON parse error: {0}")]
    JsonParse(String),

    /// An input document violates the domain model
    #[error("Invalid document: {0}")]
    Domain(#[from] DomainError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<serde_json::Error> for ExtractorError {
    fn from(e: serde_json::Error) -> Self {
        ExtractorError::JsonParse(e.to_string())
    }
}

impl From<std::io::Error> for ExtractorError {
    fn from(e: std::io::Error) -> Self {
        ExtractorError::Io(e.to_string())
    }
}
