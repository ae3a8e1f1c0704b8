//! Documents, chunks, and the record-carrying documents built from them

use crate::error::DomainError;
use crate::provenance::{sealed, EvaluationMetadata, ProvenanceLog, Provenanced};
use crate::schema::{EvaluationOutcome, ExtractionOutcome, ExtractionRecord};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Placeholder id for documents whose metadata carries none
pub const UNKNOWN_DOC_ID: &str = "unknown";

/// A bounded contiguous slice of a normalized document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    /// Zero-based position in the document
    pub chunk_id: usize,

    /// Chunk text
    pub text: String,
}

/// Where a document came from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceMetadata {
    /// Document identifier (base name of the source file)
    pub doc_id: String,

    /// When the document was chunked
    #[serde(with = "crate::timestamp")]
    pub timestamp: DateTime<Utc>,

    /// Number of chunks
    pub n_chunks: usize,

    /// Caller-supplied filename
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
}

/// Metadata block shared by every document shape
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    /// Source information, absent for hand-written references
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<SourceMetadata>,

    /// Audit trail of agent invocations; grows only through stamping
    #[serde(default, skip_serializing_if = "ProvenanceLog::is_empty")]
    pub(crate) agents: ProvenanceLog,

    /// Written by the evaluator
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evaluation: Option<EvaluationMetadata>,
}

impl DocumentMetadata {
    /// Metadata for a document with a known source and no history yet
    pub fn with_source(source: SourceMetadata) -> Self {
        Self {
            source: Some(source),
            ..Self::default()
        }
    }

    /// Agent events recorded so far, oldest first
    ///
    /// The log is read-only from outside; [`Provenanced::stamp`] is the way
    /// to add to it.
    ///
    /// ```compile_fail
    /// let mut metadata = dimex_domain::DocumentMetadata::default();
    /// metadata.agents = dimex_domain::ProvenanceLog::new();
    /// ```
    pub fn agents(&self) -> &ProvenanceLog {
        &self.agents
    }

    /// Document id, or [`UNKNOWN_DOC_ID`]
    pub fn doc_id(&self) -> &str {
        self.source
            .as_ref()
            .map(|s| s.doc_id.as_str())
            .unwrap_or(UNKNOWN_DOC_ID)
    }
}

/// A chunked document
///
/// Chunks are fixed once the document is built; only the metadata grows, and
/// only through stamping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    metadata: DocumentMetadata,
    chunks: Vec<Chunk>,
}

impl Document {
    /// Build a document from ordered chunk texts
    ///
    /// `doc_id` is the base name of `filename`; chunk ids are assigned by
    /// position.
    pub fn from_chunks(filename: &str, chunks: Vec<String>, timestamp: DateTime<Utc>) -> Self {
        let doc_id = Path::new(filename)
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| filename.to_string());

        let chunks: Vec<Chunk> = chunks
            .into_iter()
            .enumerate()
            .map(|(chunk_id, text)| Chunk { chunk_id, text })
            .collect();

        Self {
            metadata: DocumentMetadata {
                source: Some(SourceMetadata {
                    doc_id,
                    timestamp,
                    n_chunks: chunks.len(),
                    filename: Some(filename.to_string()),
                }),
                agents: ProvenanceLog::new(),
                evaluation: None,
            },
            chunks,
        }
    }

    /// Decode a document from JSON and check its chunk numbering
    pub fn from_json(json: &str) -> Result<Self, DomainError> {
        let document: Document = serde_json::from_str(json)?;
        document.validate()?;
        Ok(document)
    }

    /// Check that chunk ids are `0..n` and match `n_chunks`
    pub fn validate(&self) -> Result<(), DomainError> {
        for (expected, chunk) in self.chunks.iter().enumerate() {
            if chunk.chunk_id != expected {
                return Err(DomainError::NonContiguousChunks {
                    expected,
                    found: chunk.chunk_id,
                });
            }
        }
        if let Some(source) = &self.metadata.source {
            if source.n_chunks != self.chunks.len() {
                return Err(DomainError::ChunkCountMismatch {
                    declared: source.n_chunks,
                    actual: self.chunks.len(),
                });
            }
        }
        Ok(())
    }

    /// Document id
    pub fn doc_id(&self) -> &str {
        self.metadata.doc_id()
    }

    /// Source filename, if known
    pub fn filename(&self) -> Option<&str> {
        self.metadata
            .source
            .as_ref()
            .and_then(|s| s.filename.as_deref())
    }

    /// Chunks in reading order
    pub fn chunks(&self) -> &[Chunk] {
        &self.chunks
    }

    /// Number of chunks
    pub fn n_chunks(&self) -> usize {
        self.chunks.len()
    }

    /// Consume the document, keeping only its metadata
    pub fn into_metadata(self) -> DocumentMetadata {
        self.metadata
    }
}

impl Provenanced for Document {
    fn metadata(&self) -> &DocumentMetadata {
        &self.metadata
    }
}

impl sealed::Stampable for Document {
    fn metadata_mut(&mut self) -> &mut DocumentMetadata {
        &mut self.metadata
    }
}

/// A structured record together with the metadata of the document it came from
///
/// This is the shape of both predicted records and gold references.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordDocument {
    /// Metadata of the source document
    #[serde(default)]
    pub metadata: DocumentMetadata,

    /// The record
    #[serde(alias = "analysis")]
    pub content: ExtractionRecord,
}

impl Provenanced for RecordDocument {
    fn metadata(&self) -> &DocumentMetadata {
        &self.metadata
    }
}

impl sealed::Stampable for RecordDocument {
    fn metadata_mut(&mut self) -> &mut DocumentMetadata {
        &mut self.metadata
    }
}

/// Output of the evaluator: scores plus the predicted document's metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluatedDocument {
    /// Predicted document metadata, extended with the evaluation block
    pub metadata: DocumentMetadata,

    /// Scores or a degraded record
    pub content: EvaluationOutcome,
}

impl Provenanced for EvaluatedDocument {
    fn metadata(&self) -> &DocumentMetadata {
        &self.metadata
    }
}

impl sealed::Stampable for EvaluatedDocument {
    fn metadata_mut(&mut self) -> &mut DocumentMetadata {
        &mut self.metadata
    }
}

/// One processed file: what the batch driver hands to a result sink
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessedDocument {
    /// Uploaded filename
    pub filename: String,

    /// Document metadata after extraction
    pub metadata: DocumentMetadata,

    /// Extracted record or degraded record
    pub analysis: ExtractionOutcome,
}

impl ProcessedDocument {
    /// The record-carrying form, when extraction succeeded
    pub fn to_record_document(&self) -> Option<RecordDocument> {
        match &self.analysis {
            ExtractionOutcome::Parsed(record) => Some(RecordDocument {
                metadata: self.metadata.clone(),
                content: record.clone(),
            }),
            ExtractionOutcome::Degraded(_) => None,
        }
    }
}

/// Lifecycle of a single document through the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentState {
    /// Text received, not chunked
    Raw,
    /// Chunked into a [`Document`]
    Chunked,
    /// Extraction produced a record
    ExtractionSucceeded,
    /// Extraction produced a degraded record or failed outright
    ExtractionFailed,
    /// A record was scored against a reference
    Evaluated,
}

impl DocumentState {
    /// Whether `next` is a legal caller-initiated transition from `self`
    pub fn can_transition_to(self, next: DocumentState) -> bool {
        use DocumentState::*;
        matches!(
            (self, next),
            (Raw, Chunked)
                | (Chunked, ExtractionSucceeded)
                | (Chunked, ExtractionFailed)
                | (ExtractionFailed, Chunked)
                | (ExtractionSucceeded, Evaluated)
        )
    }

    /// Whether no further transition happens without the caller resubmitting
    pub fn is_terminal(self) -> bool {
        matches!(self, DocumentState::ExtractionFailed | DocumentState::Evaluated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_chunks_assigns_contiguous_ids() {
        let doc = Document::from_chunks(
            "/tmp/uploads/paper.pdf",
            vec!["a".into(), "b".into(), "c".into()],
            Utc::now(),
        );
        assert_eq!(doc.doc_id(), "paper.pdf");
        assert_eq!(doc.filename(), Some("/tmp/uploads/paper.pdf"));
        assert_eq!(doc.n_chunks(), 3);
        for (i, chunk) in doc.chunks().iter().enumerate() {
            assert_eq!(chunk.chunk_id, i);
        }
        assert_eq!(doc.metadata().source.as_ref().unwrap().n_chunks, 3);
    }

    #[test]
    fn test_json_layout() {
        let doc = Document::from_chunks("paper.pdf", vec!["hello".into()], Utc::now());
        let json = serde_json::to_value(&doc).unwrap();
        assert_eq!(json["metadata"]["source"]["doc_id"], "paper.pdf");
        assert_eq!(json["metadata"]["source"]["n_chunks"], 1);
        assert_eq!(json["chunks"][0]["chunk_id"], 0);
        assert_eq!(json["chunks"][0]["text"], "hello");
        assert!(json["metadata"].get("agents").is_none());
    }

    #[test]
    fn test_from_json_rejects_gaps() {
        let json = r#"{
            "metadata": {"source": {"doc_id": "x", "timestamp": "2025-01-01T00:00:00", "n_chunks": 2}},
            "chunks": [{"chunk_id": 0, "text": "a"}, {"chunk_id": 2, "text": "b"}]
        }"#;
        assert!(matches!(
            Document::from_json(json),
            Err(DomainError::NonContiguousChunks { expected: 1, found: 2 })
        ));
    }

    #[test]
    fn test_from_json_rejects_count_mismatch() {
        let json = r#"{
            "metadata": {"source": {"doc_id": "x", "timestamp": "2025-01-01T00:00:00Z", "n_chunks": 3}},
            "chunks": [{"chunk_id": 0, "text": "a"}]
        }"#;
        assert!(matches!(
            Document::from_json(json),
            Err(DomainError::ChunkCountMismatch { declared: 3, actual: 1 })
        ));
    }

    #[test]
    fn test_record_document_accepts_analysis_key() {
        let json = r#"{
            "metadata": {"source": {"doc_id": "gold.pdf", "timestamp": "2025-01-01T00:00:00Z", "n_chunks": 4}},
            "analysis": {
                "dcm_capability": "Smart Operations",
                "scor_process": "Make",
                "problem_description": "Machines break.",
                "ai_technology_nature": "Machine learning",
                "industry_sector": "Automotive"
            }
        }"#;
        let record: RecordDocument = serde_json::from_str(json).unwrap();
        assert_eq!(record.metadata.doc_id(), "gold.pdf");
        assert_eq!(record.content.scrm_area, None);
    }

    #[test]
    fn test_missing_metadata_has_unknown_id() {
        let metadata = DocumentMetadata::default();
        assert_eq!(metadata.doc_id(), UNKNOWN_DOC_ID);
    }

    #[test]
    fn test_state_transitions() {
        use DocumentState::*;
        assert!(Raw.can_transition_to(Chunked));
        assert!(Chunked.can_transition_to(ExtractionFailed));
        assert!(ExtractionSucceeded.can_transition_to(Evaluated));
        assert!(!ExtractionFailed.can_transition_to(Evaluated));
        assert!(!Raw.can_transition_to(Evaluated));
        assert!(Evaluated.is_terminal());
        assert!(!Chunked.is_terminal());
    }
}
