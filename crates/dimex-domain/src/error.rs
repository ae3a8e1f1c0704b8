//! Error types for the domain layer

use thiserror::Error;

/// Errors raised when a value does not fit the domain model
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DomainError {
    /// A record does not satisfy its schema (range, vocabulary, shape)
    #[error("Schema violation: {0}")]
    SchemaViolation(String),

    /// A chunk sequence is not numbered `0..n` in order
    #[error("Chunk ids are not contiguous: expected {expected}, found {found}")]
    NonContiguousChunks {
        /// The id the position called for
        expected: usize,
        /// The id actually present
        found: usize,
    },

    /// `metadata.source.n_chunks` disagrees with the chunk list
    #[error("Chunk count mismatch: metadata says {declared}, document has {actual}")]
    ChunkCountMismatch {
        /// Count recorded in the metadata
        declared: usize,
        /// Number of chunks present
        actual: usize,
    },

    /// A JSON document could not be decoded
    #[error("JSON parse error: {0}")]
    JsonParse(String),
}

impl From<serde_json::Error> for DomainError {
    fn from(e: serde_json::Error) -> Self {
        DomainError::JsonParse(e.to_string())
    }
}
