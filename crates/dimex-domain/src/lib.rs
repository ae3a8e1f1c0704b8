//! Dimex Domain Layer
//!
//! This crate holds the data model shared by every stage of the pipeline:
//! documents and their chunks, the closed record schemas the model is asked to
//! produce, the append-only provenance log, and the capability traits that
//! isolate the pipeline from model providers, text extraction and export.
//!
//! ## Key Concepts
//!
//! - **Document**: normalized text split into ordered, contiguous chunks
//! - **ExtractionRecord**: the six supply-chain "dimensions" of a paper
//! - **DegradedRecord**: what a failed parse turns into, raw text preserved
//! - **EvaluationRecord**: per-field scores against a gold reference
//! - **ProvenanceLog**: which agent touched a document, with which model
//!
//! ## Architecture
//!
//! No I/O lives here. Providers, chunking and agents are implemented in the
//! `dimex-llm` and `dimex-extractor` crates against the traits in [`traits`].

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod document;
pub mod error;
pub mod provenance;
pub mod schema;
pub mod timestamp;
pub mod traits;

// Re-exports for convenience
pub use document::{
    Chunk, Document, DocumentMetadata, DocumentState, EvaluatedDocument, ProcessedDocument,
    RecordDocument, SourceMetadata, UNKNOWN_DOC_ID,
};
pub use error::DomainError;
pub use provenance::{AgentDescriptor, AgentEvent, EvaluationMetadata, ProvenanceLog, Provenanced};
pub use schema::{
    DegradedRecord, EvaluationOutcome, EvaluationRecord, ExtractionOutcome, ExtractionRecord,
    FieldEvaluation, RecordSchema,
};
