//! Configuration for the extraction pipeline

use crate::error::ExtractorError;
use crate::prompt::{DEFAULT_INSTRUCTIONS, DEFAULT_SYSTEM_PROMPT, EVALUATOR_SYSTEM_PROMPT};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Default chunk size (characters)
pub const DEFAULT_CHUNK_SIZE: usize = 1600;

/// Default overlap between consecutive chunks (characters)
pub const DEFAULT_CHUNK_OVERLAP: usize = 200;

/// Configuration for the extraction pipeline
///
/// Every field has a default, so a TOML file only needs the keys it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Extraction system prompt; the built-in prompt is used when absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,

    /// Evaluator system prompt; the built-in prompt is used when absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub evaluator_prompt: Option<String>,

    /// Instructions placed before the chunk sequence in the user prompt
    pub instructions: String,

    /// Model identifier passed to the provider
    pub model: String,

    /// Sampling temperature
    pub temperature: f32,

    /// Cap on output tokens per call
    pub max_tokens: u32,

    /// Maximum time for a single model call (seconds)
    pub timeout_secs: u64,

    /// Maximum chunk size (characters)
    pub chunk_size: usize,

    /// Approximate overlap between consecutive chunks (characters)
    pub chunk_overlap: usize,

    /// Documents processed concurrently by the batch driver
    pub max_concurrent_documents: usize,

    /// Degrade records whose categorical fields fall outside the
    /// controlled vocabularies
    pub strict_vocabulary: bool,
}

impl PipelineConfig {
    /// Get the call timeout as a Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// The extraction system prompt to use
    pub fn effective_system_prompt(&self) -> &str {
        self.system_prompt.as_deref().unwrap_or(DEFAULT_SYSTEM_PROMPT)
    }

    /// The evaluator system prompt to use
    pub fn effective_evaluator_prompt(&self) -> &str {
        self.evaluator_prompt
            .as_deref()
            .unwrap_or(EVALUATOR_SYSTEM_PROMPT)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ExtractorError> {
        if self.chunk_size == 0 {
            return Err(config_error("chunk_size must be greater than 0"));
        }
        if self.chunk_overlap >= self.chunk_size {
            return Err(config_error("chunk_overlap must be smaller than chunk_size"));
        }
        if self.timeout_secs == 0 {
            return Err(config_error("timeout_secs must be greater than 0"));
        }
        if self.max_tokens == 0 {
            return Err(config_error("max_tokens must be greater than 0"));
        }
        if self.max_concurrent_documents == 0 {
            return Err(config_error(
                "max_concurrent_documents must be greater than 0",
            ));
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(config_error("temperature must be between 0.0 and 2.0"));
        }
        if self.model.trim().is_empty() {
            return Err(config_error("model must not be empty"));
        }
        Ok(())
    }

    /// Sequential preset: one document at a time with a longer timeout
    pub fn sequential() -> Self {
        Self {
            timeout_secs: 120,
            max_concurrent_documents: 1,
            ..Self::default()
        }
    }

    /// Load configuration from TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, ExtractorError> {
        toml::from_str(toml_str)
            .map_err(|e| ExtractorError::Config(format!("Failed to parse TOML: {}", e)))
    }

    /// Serialize configuration to TOML string
    pub fn to_toml(&self) -> Result<String, ExtractorError> {
        toml::to_string_pretty(self)
            .map_err(|e| ExtractorError::Config(format!("Failed to serialize to TOML: {}", e)))
    }

    /// Load and validate configuration from a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ExtractorError> {
        let contents = std::fs::read_to_string(path.as_ref())?;
        let config = Self::from_toml(&contents)?;
        config.validate()?;
        Ok(config)
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            system_prompt: None,
            evaluator_prompt: None,
            instructions: DEFAULT_INSTRUCTIONS.to_string(),
            model: "claude-haiku-4-5".to_string(),
            temperature: 0.5,
            max_tokens: 5000,
            timeout_secs: 30,
            chunk_size: DEFAULT_CHUNK_SIZE,
            chunk_overlap: DEFAULT_CHUNK_OVERLAP,
            max_concurrent_documents: 4,
            strict_vocabulary: false,
        }
    }
}

fn config_error(message: &str) -> ExtractorError {
    ExtractorError::Config(message.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config_is_valid() {
        let config = PipelineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.timeout(), Duration::from_secs(30));
        assert_eq!(config.chunk_size, 1600);
        assert_eq!(config.chunk_overlap, 200);
    }

    #[test]
    fn test_sequential_config_is_valid() {
        let config = PipelineConfig::sequential();
        assert!(config.validate().is_ok());
        assert_eq!(config.max_concurrent_documents, 1);
    }

    #[test]
    fn test_overlap_must_be_smaller_than_chunk_size() {
        let mut config = PipelineConfig::default();
        config.chunk_overlap = config.chunk_size;
        assert!(matches!(config.validate(), Err(ExtractorError::Config(_))));
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let mut config = PipelineConfig::default();
        config.timeout_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_system_prompt_fallback() {
        let mut config = PipelineConfig::default();
        assert_eq!(config.effective_system_prompt(), DEFAULT_SYSTEM_PROMPT);

        config.system_prompt = Some("custom".to_string());
        assert_eq!(config.effective_system_prompt(), "custom");
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = PipelineConfig::from_toml("chunk_size = 800\nstrict_vocabulary = true\n").unwrap();
        assert_eq!(config.chunk_size, 800);
        assert!(config.strict_vocabulary);
        assert_eq!(config.chunk_overlap, DEFAULT_CHUNK_OVERLAP);
        assert_eq!(config.model, "claude-haiku-4-5");
    }

    #[test]
    fn test_toml_round_trip() {
        let config = PipelineConfig::default();
        let toml_str = config.to_toml().unwrap();
        let parsed = PipelineConfig::from_toml(&toml_str).unwrap();
        assert_eq!(config, parsed);
    }

    #[test]
    fn test_from_file_validates() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "chunk_size = 100\nchunk_overlap = 100").unwrap();
        assert!(matches!(
            PipelineConfig::from_file(file.path()),
            Err(ExtractorError::Config(_))
        ));
    }

    #[test]
    fn test_from_file_missing() {
        let result = PipelineConfig::from_file("/nonexistent/dimex.toml");
        assert!(matches!(result, Err(ExtractorError::Io(_))));
    }
}
