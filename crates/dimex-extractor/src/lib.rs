//! Dimex Extractor
//!
//! Turns research papers into structured dimension records with one model
//! call per document, and scores records against gold references.
//!
//! # Architecture
//!
//! ```text
//! bytes → TextSource → Chunker → Document → DimensionExtractor → ExtractionOutcome
//!                                                                   ↓
//!                                         gold RecordDocument → Evaluator → EvaluatedDocument
//! ```
//!
//! # Key Features
//!
//! - **Overlapping chunking**: separator-preferring splits that reconstruct
//!   the normalized text exactly
//! - **Resilient parsing**: output that does not match the schema becomes a
//!   degraded record carrying the raw text, never an error
//! - **Provenance**: agents stamp documents through an append-only event log
//! - **Batch processing**: bounded concurrency with per-document failures
//!
//! # Example Usage
//!
//! ```no_run
//! use dimex_extractor::{Chunker, DimensionExtractor, PipelineConfig};
//! use dimex_llm::MockProvider;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = PipelineConfig::default();
//! let extractor = DimensionExtractor::new(MockProvider::new("{}"), config);
//!
//! let document = Chunker::default().chunk("Full text of the paper...", "paper.pdf");
//! let report = extractor.extract_document(document).await?;
//!
//! println!("Parsed: {}", report.outcome.is_parsed());
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

mod agent;
mod batch;
mod chunking;
mod config;
mod error;
mod evaluator;
mod extractor;
mod parser;
mod prompt;
mod tabular;


pub use agent::{Agent, AgentKind};
pub use batch::{BatchDriver, BatchReport, DocumentOutcome, SourceDocument};
pub use chunking::{chunk, normalize_text, Chunker, SEPARATORS};
pub use config::{PipelineConfig, DEFAULT_CHUNK_OVERLAP, DEFAULT_CHUNK_SIZE};
pub use error::ExtractorError;
pub use evaluator::{Evaluator, EVALUATOR_NAME, EVALUATOR_VERSION};
pub use extractor::{DimensionExtractor, ExtractionReport, EXTRACTOR_NAME, EXTRACTOR_VERSION};
pub use parser::{extract_json, parse_evaluation, parse_extraction, PARSE_FAILURE_PREFIX};
pub use prompt::{
    EvaluationPromptBuilder, ExtractionPromptBuilder, DEFAULT_INSTRUCTIONS,
    DEFAULT_SYSTEM_PROMPT, EVALUATOR_SYSTEM_PROMPT,
};
pub use tabular::{project, TabularRow, COLUMNS};
