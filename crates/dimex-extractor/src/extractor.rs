//! Dimension extraction agent

use crate::agent::{call_model, Agent, AgentKind};
use crate::config::PipelineConfig;
use crate::error::ExtractorError;
use crate::parser::parse_extraction;
use crate::prompt::ExtractionPromptBuilder;
use dimex_domain::traits::{LlmProvider, LlmRequest, DEFAULT_MAX_TURNS, SEQUENTIAL_CONCURRENCY};
use dimex_domain::{
    AgentDescriptor, Document, ExtractionOutcome, ProcessedDocument, Provenanced, RecordSchema,
};
use std::sync::Arc;
use tracing::{info, warn};

/// Name recorded in provenance by the extractor
pub const EXTRACTOR_NAME: &str = "Dimension Extractor Agent";

/// Version recorded in provenance by the extractor
pub const EXTRACTOR_VERSION: &str = "1.0";

/// Result of one extraction: the outcome and the (possibly stamped) document
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractionReport {
    /// Extracted record or degraded record
    pub outcome: ExtractionOutcome,
    /// The input document; stamped when the outcome is degraded
    pub document: Document,
}

impl ExtractionReport {
    /// Shape the report for a result sink
    pub fn into_processed(self, filename: impl Into<String>) -> ProcessedDocument {
        ProcessedDocument {
            filename: filename.into(),
            metadata: self.document.into_metadata(),
            analysis: self.outcome,
        }
    }
}

/// Extracts research dimensions from chunked documents with one model call
pub struct DimensionExtractor<L: LlmProvider> {
    llm: Arc<L>,
    config: PipelineConfig,
    descriptor: AgentDescriptor,
}

impl<L: LlmProvider> DimensionExtractor<L> {
    /// Create a new extractor
    pub fn new(llm: L, config: PipelineConfig) -> Self {
        Self::from_shared(Arc::new(llm), config)
    }

    /// Create an extractor over a provider shared with other agents
    pub fn from_shared(llm: Arc<L>, config: PipelineConfig) -> Self {
        let descriptor = AgentDescriptor::new(EXTRACTOR_NAME, EXTRACTOR_VERSION, llm.model_name());
        Self {
            llm,
            config,
            descriptor,
        }
    }

    /// Pipeline settings in use
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Extract using the configured instructions and system prompt
    pub async fn extract_document(
        &self,
        document: Document,
    ) -> Result<ExtractionReport, ExtractorError> {
        self.extract(
            &self.config.instructions,
            document,
            self.config.effective_system_prompt(),
        )
        .await
    }

    /// Extract dimensions from `document`
    ///
    /// The prompt holds `instructions`, every chunk in order, and the output
    /// schema. Output that does not parse becomes a degraded record and the
    /// document is stamped to show extraction was attempted; a parsed record
    /// leaves the document untouched.
    ///
    /// # Errors
    ///
    /// Returns `ExtractorError::Timeout` or `ExtractorError::Llm` when the
    /// model call itself fails. No retry is attempted.
    pub async fn extract(
        &self,
        instructions: &str,
        document: Document,
        system_prompt: &str,
    ) -> Result<ExtractionReport, ExtractorError> {
        let doc_id = document.doc_id().to_string();
        info!(doc_id = %doc_id, n_chunks = document.n_chunks(), "Starting extraction");

        let user_prompt = ExtractionPromptBuilder::new(instructions, document.chunks()).build();
        let request = LlmRequest::new(system_prompt, user_prompt)
            .with_format_instructions(RecordSchema::Extraction.format_instructions())
            .with_max_turns(DEFAULT_MAX_TURNS)
            .with_concurrency_limit(SEQUENTIAL_CONCURRENCY);

        let raw = call_model(self.llm.as_ref(), &request, self.config.timeout()).await?;
        let outcome = parse_extraction(&raw, self.config.strict_vocabulary);

        let document = match &outcome {
            ExtractionOutcome::Parsed(_) => {
                info!(doc_id = %doc_id, "Extraction succeeded");
                document
            }
            ExtractionOutcome::Degraded(degraded) => {
                warn!(doc_id = %doc_id, error = %degraded.error, "Extraction degraded");
                document.stamp(&self.descriptor)
            }
        };

        Ok(ExtractionReport { outcome, document })
    }
}

impl<L: LlmProvider> Agent for DimensionExtractor<L> {
    fn kind(&self) -> AgentKind {
        AgentKind::DimensionExtraction
    }

    fn descriptor(&self) -> &AgentDescriptor {
        &self.descriptor
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunking::Chunker;
    use crate::prompt::DEFAULT_INSTRUCTIONS;
    use dimex_llm::MockProvider;

    const RECORD: &str = r#"{"dcm_capability": "Dynamic Fulfillment", "scor_process": "Deliver",
        "scrm_area": "None", "problem_description": "Late deliveries in urban networks.",
        "ai_technology_nature": "Multi-agent reinforcement learning; agentic",
        "industry_sector": "Retail"}"#;

    fn document() -> Document {
        Chunker::new(40, 8)
            .unwrap()
            .chunk("Routing vans in cities. Agents learn to reroute. Results improve OTIF.", "vans.pdf")
    }

    #[test]
    fn test_descriptor() {
        let extractor = DimensionExtractor::new(
            MockProvider::default().with_model("test-model"),
            PipelineConfig::default(),
        );
        assert_eq!(extractor.kind(), AgentKind::DimensionExtraction);
        assert_eq!(extractor.descriptor().name, "Dimension Extractor Agent");
        assert_eq!(extractor.descriptor().version, "1.0");
        assert_eq!(extractor.descriptor().model, "test-model");
    }

    #[tokio::test]
    async fn test_success_leaves_document_unstamped() {
        let llm = MockProvider::new(RECORD);
        let extractor = DimensionExtractor::new(llm.clone(), PipelineConfig::default());
        let input = document();

        let report = extractor.extract_document(input.clone()).await.unwrap();
        assert!(report.outcome.is_parsed());
        assert_eq!(report.document, input);
        assert_eq!(llm.call_count(), 1);
    }

    #[tokio::test]
    async fn test_request_shape() {
        let llm = MockProvider::new(RECORD);
        let extractor = DimensionExtractor::new(llm.clone(), PipelineConfig::default());
        let input = document();

        extractor
            .extract("Extract these:", input.clone(), "custom system prompt")
            .await
            .unwrap();

        let requests = llm.requests();
        assert_eq!(requests.len(), 1);
        let request = &requests[0];
        assert_eq!(request.system_prompt, "custom system prompt");
        assert_eq!(request.max_turns, 5);
        assert_eq!(request.concurrency_limit, 1);
        assert!(request.user_prompt.starts_with("Extract these:"));
        for chunk in input.chunks() {
            assert!(request.user_prompt.contains(&chunk.text));
        }
        let rendered = request.rendered_user_prompt();
        assert!(rendered.contains("dcm_capability"));
        assert!(rendered.contains("Synchronized Planning"));
    }

    #[tokio::test]
    async fn test_default_prompts_used() {
        let llm = MockProvider::new(RECORD);
        let extractor = DimensionExtractor::new(llm.clone(), PipelineConfig::default());
        extractor.extract_document(document()).await.unwrap();

        let request = &llm.requests()[0];
        assert_eq!(request.system_prompt, crate::prompt::DEFAULT_SYSTEM_PROMPT);
        assert!(request.user_prompt.starts_with(DEFAULT_INSTRUCTIONS));
    }

    #[tokio::test]
    async fn test_degraded_stamps_document() {
        let extractor = DimensionExtractor::new(
            MockProvider::new("I cannot comply.").with_model("small-model"),
            PipelineConfig::default(),
        );
        let report = extractor.extract_document(document()).await.unwrap();

        match &report.outcome {
            ExtractionOutcome::Degraded(degraded) => {
                assert!(degraded.error.starts_with("Parser failed: "));
                assert_eq!(degraded.raw_output, "I cannot comply.");
            }
            other => panic!("expected degraded outcome, got {:?}", other),
        }

        let agents = report.document.metadata().agents();
        assert_eq!(agents.len(), 1);
        let event = agents.last().unwrap();
        assert_eq!(event.name, EXTRACTOR_NAME);
        assert_eq!(event.model, "small-model");
    }

    #[tokio::test]
    async fn test_provider_failure_is_error() {
        let mut llm = MockProvider::default();
        llm.add_error("Routing vans");
        let extractor = DimensionExtractor::new(llm, PipelineConfig::default());

        let result = extractor.extract_document(document()).await;
        assert!(matches!(result, Err(ExtractorError::Llm(_))));
    }

    #[tokio::test]
    async fn test_timeout_is_error() {
        let mut config = PipelineConfig::default();
        config.timeout_secs = 1;
        let llm = MockProvider::new(RECORD).with_delay(std::time::Duration::from_secs(3));
        let extractor = DimensionExtractor::new(llm, config);

        let result = extractor.extract_document(document()).await;
        assert!(matches!(result, Err(ExtractorError::Timeout(_))));
    }

    #[tokio::test]
    async fn test_into_processed() {
        let extractor = DimensionExtractor::new(MockProvider::new(RECORD), PipelineConfig::default());
        let processed = extractor
            .extract_document(document())
            .await
            .unwrap()
            .into_processed("vans.pdf");

        assert_eq!(processed.filename, "vans.pdf");
        assert_eq!(processed.metadata.doc_id(), "vans.pdf");
        assert_eq!(
            processed.analysis.record().unwrap().industry_sector,
            "Retail"
        );
    }
}
