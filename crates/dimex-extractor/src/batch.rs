//! Batch driver: text source, chunking and extraction for many documents
//!
//! Documents are independent. Each one runs as its own task, at most
//! `max_concurrent_documents` at a time, and a failure stays with its
//! document. Outcomes are reported in input order.

use crate::chunking::Chunker;
use crate::error::ExtractorError;
use crate::extractor::DimensionExtractor;
use dimex_domain::traits::{LlmProvider, TextSource};
use dimex_domain::{DocumentState, ProcessedDocument};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{info, warn};

/// One uploaded file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceDocument {
    /// Name the results are reported under
    pub filename: String,
    /// Raw file contents
    pub bytes: Vec<u8>,
}

impl SourceDocument {
    /// Create a source document from memory
    pub fn new(filename: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            filename: filename.into(),
            bytes: bytes.into(),
        }
    }

    /// Read a source document from disk
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ExtractorError> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)
            .map_err(|e| ExtractorError::Io(format!("{}: {}", path.display(), e)))?;
        Ok(Self::new(path.display().to_string(), bytes))
    }
}

/// What happened to one document in a batch
#[derive(Debug, Clone, PartialEq)]
pub enum DocumentOutcome {
    /// A record was extracted
    Extracted(ProcessedDocument),
    /// The model answered but its output did not parse
    Degraded(ProcessedDocument),
    /// No model output to keep
    Failed {
        /// Uploaded filename
        filename: String,
        /// State the document was left in
        state: DocumentState,
        /// Failure reason
        error: String,
    },
}

impl DocumentOutcome {
    /// Filename of the document
    pub fn filename(&self) -> &str {
        match self {
            DocumentOutcome::Extracted(doc) | DocumentOutcome::Degraded(doc) => &doc.filename,
            DocumentOutcome::Failed { filename, .. } => filename,
        }
    }

    /// Lifecycle state the document ended in
    pub fn state(&self) -> DocumentState {
        match self {
            DocumentOutcome::Extracted(_) => DocumentState::ExtractionSucceeded,
            DocumentOutcome::Degraded(_) => DocumentState::ExtractionFailed,
            DocumentOutcome::Failed { state, .. } => *state,
        }
    }

    /// The processed document, unless the document failed outright
    pub fn processed(&self) -> Option<&ProcessedDocument> {
        match self {
            DocumentOutcome::Extracted(doc) | DocumentOutcome::Degraded(doc) => Some(doc),
            DocumentOutcome::Failed { .. } => None,
        }
    }

    fn failed(filename: String, state: DocumentState, error: impl ToString) -> Self {
        DocumentOutcome::Failed {
            filename,
            state,
            error: error.to_string(),
        }
    }
}

/// Outcomes of a batch, in input order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchReport {
    /// One outcome per input document
    pub outcomes: Vec<DocumentOutcome>,
}

impl BatchReport {
    /// Number of documents with an extracted record
    pub fn extracted_count(&self) -> usize {
        self.count(|o| matches!(o, DocumentOutcome::Extracted(_)))
    }

    /// Number of documents with a degraded record
    pub fn degraded_count(&self) -> usize {
        self.count(|o| matches!(o, DocumentOutcome::Degraded(_)))
    }

    /// Number of documents that failed outright
    pub fn failed_count(&self) -> usize {
        self.count(|o| matches!(o, DocumentOutcome::Failed { .. }))
    }

    /// Processed documents (extracted and degraded), in input order
    pub fn processed(&self) -> Vec<ProcessedDocument> {
        self.outcomes
            .iter()
            .filter_map(DocumentOutcome::processed)
            .cloned()
            .collect()
    }

    fn count(&self, predicate: impl Fn(&DocumentOutcome) -> bool) -> usize {
        self.outcomes.iter().filter(|o| predicate(o)).count()
    }
}

/// Runs extraction over many documents concurrently
pub struct BatchDriver<L: LlmProvider> {
    extractor: Arc<DimensionExtractor<L>>,
    chunker: Chunker,
    max_concurrent: usize,
}

impl<L: LlmProvider + 'static> BatchDriver<L> {
    /// Create a driver using the extractor's settings for chunking and
    /// concurrency
    ///
    /// # Errors
    ///
    /// Returns `ExtractorError::Config` if those settings are invalid.
    pub fn new(extractor: DimensionExtractor<L>) -> Result<Self, ExtractorError> {
        let config = extractor.config();
        config.validate()?;
        let chunker = Chunker::from_config(config)?;
        let max_concurrent = config.max_concurrent_documents;

        Ok(Self {
            extractor: Arc::new(extractor),
            chunker,
            max_concurrent,
        })
    }

    /// The chunker applied to every document
    pub fn chunker(&self) -> &Chunker {
        &self.chunker
    }

    /// Extract text from each input, chunk it and extract dimensions
    ///
    /// Dropping the returned future aborts the documents still running.
    pub async fn run<T: TextSource>(&self, source: &T, inputs: Vec<SourceDocument>) -> BatchReport {
        let total = inputs.len();
        info!(documents = total, max_concurrent = self.max_concurrent, "Starting batch");

        let semaphore = Arc::new(Semaphore::new(self.max_concurrent));
        let mut join_set = JoinSet::new();
        let mut filenames = Vec::with_capacity(total);
        let mut outcomes: Vec<Option<DocumentOutcome>> = vec![None; total];

        for (index, input) in inputs.into_iter().enumerate() {
            filenames.push(input.filename.clone());

            let text = match source.extract_text(&input.bytes) {
                Ok(text) if text.trim().is_empty() => Err(ExtractorError::TextSource(
                    format!("{}: no text found", input.filename),
                )),
                Ok(text) => Ok(text),
                Err(e) => Err(ExtractorError::TextSource(e.to_string())),
            };
            let text = match text {
                Ok(text) => text,
                Err(error) => {
                    warn!(filename = %input.filename, error = %error, "Text extraction failed");
                    outcomes[index] = Some(DocumentOutcome::failed(
                        input.filename,
                        DocumentState::Raw,
                        error,
                    ));
                    continue;
                }
            };

            let document = self.chunker.chunk(&text, &input.filename);
            let extractor = Arc::clone(&self.extractor);
            let semaphore = Arc::clone(&semaphore);
            let filename = input.filename;

            join_set.spawn(async move {
                let outcome = match semaphore.acquire_owned().await {
                    Ok(_permit) => match extractor.extract_document(document).await {
                        Ok(report) if report.outcome.is_parsed() => {
                            DocumentOutcome::Extracted(report.into_processed(filename))
                        }
                        Ok(report) => DocumentOutcome::Degraded(report.into_processed(filename)),
                        Err(e) => {
                            warn!(filename = %filename, error = %e, "Extraction failed");
                            DocumentOutcome::failed(filename, DocumentState::ExtractionFailed, e)
                        }
                    },
                    Err(e) => DocumentOutcome::failed(filename, DocumentState::Chunked, e),
                };
                (index, outcome)
            });
        }

        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok((index, outcome)) => outcomes[index] = Some(outcome),
                Err(e) => warn!(error = %e, "Extraction task did not complete"),
            }
        }

        let outcomes: Vec<DocumentOutcome> = outcomes
            .into_iter()
            .zip(filenames)
            .map(|(outcome, filename)| {
                outcome.unwrap_or_else(|| {
                    DocumentOutcome::failed(
                        filename,
                        DocumentState::ExtractionFailed,
                        "extraction task did not complete",
                    )
                })
            })
            .collect();

        let report = BatchReport { outcomes };
        info!(
            extracted = report.extracted_count(),
            degraded = report.degraded_count(),
            failed = report.failed_count(),
            "Batch complete"
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PipelineConfig;
    use dimex_llm::MockProvider;
    use std::time::Duration;

    struct Utf8Source;

    impl TextSource for Utf8Source {
        type Error = std::str::Utf8Error;

        fn extract_text(&self, bytes: &[u8]) -> Result<String, Self::Error> {
            std::str::from_utf8(bytes).map(str::to_string)
        }
    }

    const RECORD: &str = r#"{"dcm_capability": "Smart Operations", "scor_process": "Make",
        "scrm_area": "Operational Risk", "problem_description": "Machine breakdowns.",
        "ai_technology_nature": "Anomaly detection; not agentic", "industry_sector": "Aerospace"}"#;

    fn driver(llm: MockProvider, config: PipelineConfig) -> BatchDriver<MockProvider> {
        BatchDriver::new(DimensionExtractor::new(llm, config)).unwrap()
    }

    #[tokio::test]
    async fn test_mixed_outcomes_in_input_order() {
        let mut llm = MockProvider::new(RECORD);
        llm.add_response("refusal paper", "I cannot comply.");
        llm.add_error("broken paper");

        let inputs = vec![
            SourceDocument::new("a.txt", "A good paper about machines."),
            SourceDocument::new("b.txt", vec![0xffu8, 0xfe, 0x00]),
            SourceDocument::new("c.txt", "A refusal paper."),
            SourceDocument::new("d.txt", "A broken paper."),
        ];

        let report = driver(llm, PipelineConfig::default()).run(&Utf8Source, inputs).await;

        let names: Vec<&str> = report.outcomes.iter().map(DocumentOutcome::filename).collect();
        assert_eq!(names, vec!["a.txt", "b.txt", "c.txt", "d.txt"]);

        assert!(matches!(report.outcomes[0], DocumentOutcome::Extracted(_)));
        assert_eq!(report.outcomes[1].state(), DocumentState::Raw);
        assert!(matches!(report.outcomes[2], DocumentOutcome::Degraded(_)));
        assert_eq!(report.outcomes[3].state(), DocumentState::ExtractionFailed);
        assert!(matches!(report.outcomes[3], DocumentOutcome::Failed { .. }));

        assert_eq!(report.extracted_count(), 1);
        assert_eq!(report.degraded_count(), 1);
        assert_eq!(report.failed_count(), 2);
        assert_eq!(report.processed().len(), 2);
    }

    #[tokio::test]
    async fn test_degraded_document_is_stamped() {
        let report = driver(MockProvider::new("no json"), PipelineConfig::default())
            .run(&Utf8Source, vec![SourceDocument::new("x.txt", "Some text.")])
            .await;

        let processed = report.outcomes[0].processed().unwrap();
        assert_eq!(processed.metadata.agents().len(), 1);
        assert_eq!(processed.metadata.doc_id(), "x.txt");
    }

    #[tokio::test]
    async fn test_each_document_gets_one_call() {
        let llm = MockProvider::new(RECORD);
        let inputs: Vec<SourceDocument> = (0..10)
            .map(|i| SourceDocument::new(format!("paper-{}.txt", i), format!("Paper number {}.", i)))
            .collect();

        let report = driver(llm.clone(), PipelineConfig::default())
            .run(&Utf8Source, inputs)
            .await;

        assert_eq!(report.extracted_count(), 10);
        assert_eq!(llm.call_count(), 10);
        for (i, outcome) in report.outcomes.iter().enumerate() {
            assert_eq!(outcome.filename(), format!("paper-{}.txt", i));
        }
    }

    #[tokio::test]
    async fn test_timeout_isolated_to_document() {
        let mut config = PipelineConfig::default();
        config.timeout_secs = 1;
        let llm = MockProvider::new(RECORD).with_delay(Duration::from_secs(2));

        let report = driver(llm, config)
            .run(&Utf8Source, vec![SourceDocument::new("slow.txt", "Slow paper.")])
            .await;

        match &report.outcomes[0] {
            DocumentOutcome::Failed { error, state, .. } => {
                assert!(error.contains("timed out"));
                assert_eq!(*state, DocumentState::ExtractionFailed);
            }
            other => panic!("expected failure, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_blank_text_skips_model_call() {
        let llm = MockProvider::new(RECORD);
        let inputs = vec![
            SourceDocument::new("scanned.pdf", " \n\t "),
            SourceDocument::new("real.txt", "A paper with words."),
        ];

        let report = driver(llm.clone(), PipelineConfig::default())
            .run(&Utf8Source, inputs)
            .await;

        match &report.outcomes[0] {
            DocumentOutcome::Failed { error, state, .. } => {
                assert_eq!(*state, DocumentState::Raw);
                assert!(error.contains("no text found"));
            }
            other => panic!("expected failure, got {:?}", other),
        }
        assert!(matches!(report.outcomes[1], DocumentOutcome::Extracted(_)));
        assert_eq!(llm.call_count(), 1);
    }

    #[tokio::test]
    async fn test_empty_batch() {
        let report = driver(MockProvider::default(), PipelineConfig::default())
            .run(&Utf8Source, Vec::new())
            .await;
        assert!(report.outcomes.is_empty());
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut config = PipelineConfig::default();
        config.max_concurrent_documents = 0;
        let result = BatchDriver::new(DimensionExtractor::new(MockProvider::default(), config));
        assert!(matches!(result, Err(ExtractorError::Config(_))));
    }

    #[test]
    fn test_source_document_from_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("paper.txt");
        std::fs::write(&path, "hello").unwrap();

        let source = SourceDocument::from_path(&path).unwrap();
        assert_eq!(source.bytes, b"hello");
        assert!(source.filename.ends_with("paper.txt"));

        assert!(matches!(
            SourceDocument::from_path(dir.path().join("missing.txt")),
            Err(ExtractorError::Io(_))
        ));
    }
}
