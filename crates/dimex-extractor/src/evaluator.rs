//! Evaluation agent: scores a predicted record against a gold reference

use crate::agent::{call_model, Agent, AgentKind};
use crate::config::PipelineConfig;
use crate::error::ExtractorError;
use crate::parser::parse_evaluation;
use crate::prompt::EvaluationPromptBuilder;
use chrono::Utc;
use dimex_domain::traits::{LlmProvider, LlmRequest, DEFAULT_MAX_TURNS, SEQUENTIAL_CONCURRENCY};
use dimex_domain::{
    AgentDescriptor, EvaluatedDocument, EvaluationMetadata, EvaluationOutcome, Provenanced,
    RecordDocument, RecordSchema,
};
use std::sync::Arc;
use tracing::{info, warn};

/// Name recorded in provenance by the evaluator
pub const EVALUATOR_NAME: &str = "Evaluator";

/// Version recorded in provenance by the evaluator
pub const EVALUATOR_VERSION: &str = "1.0";

/// Scores predicted records field by field against gold references
pub struct Evaluator<L: LlmProvider> {
    llm: Arc<L>,
    config: PipelineConfig,
    descriptor: AgentDescriptor,
}

impl<L: LlmProvider> Evaluator<L> {
    /// Create a new evaluator
    pub fn new(llm: L, config: PipelineConfig) -> Self {
        Self::from_shared(Arc::new(llm), config)
    }

    /// Create an evaluator over a provider shared with other agents
    pub fn from_shared(llm: Arc<L>, config: PipelineConfig) -> Self {
        let descriptor = AgentDescriptor::new(EVALUATOR_NAME, EVALUATOR_VERSION, llm.model_name());
        Self {
            llm,
            config,
            descriptor,
        }
    }

    /// Score `predicted` against `gold`
    ///
    /// The result carries the predicted document's metadata plus an
    /// evaluation block naming both documents, and one more agent event.
    /// Output that does not parse, or scores outside [0, 1], give a degraded
    /// evaluation rather than an error.
    ///
    /// # Errors
    ///
    /// Returns `ExtractorError::Timeout` or `ExtractorError::Llm` when the
    /// model call itself fails.
    pub async fn evaluate(
        &self,
        predicted: &RecordDocument,
        gold: &RecordDocument,
    ) -> Result<EvaluatedDocument, ExtractorError> {
        let evaluated_doc_id = predicted.metadata.doc_id().to_string();
        let reference_doc_id = gold.metadata.doc_id().to_string();
        info!(
            evaluated = %evaluated_doc_id,
            reference = %reference_doc_id,
            "Starting evaluation"
        );

        let user_prompt = EvaluationPromptBuilder::new(&predicted.content, &gold.content).build();
        let request = LlmRequest::new(self.config.effective_evaluator_prompt(), user_prompt)
            .with_format_instructions(RecordSchema::Evaluation.format_instructions())
            .with_max_turns(DEFAULT_MAX_TURNS)
            .with_concurrency_limit(SEQUENTIAL_CONCURRENCY);

        let raw = call_model(self.llm.as_ref(), &request, self.config.timeout()).await?;
        let content = parse_evaluation(&raw);

        match &content {
            EvaluationOutcome::Scored(record) => {
                info!(
                    evaluated = %evaluated_doc_id,
                    overall_score = ?record.overall_score,
                    fields = record.fields.len(),
                    "Evaluation complete"
                );
            }
            EvaluationOutcome::Degraded(degraded) => {
                warn!(evaluated = %evaluated_doc_id, error = %degraded.error, "Evaluation degraded");
            }
        }

        let mut metadata = predicted.metadata.clone();
        let timestamp = Utc::now();
        metadata.evaluation = Some(EvaluationMetadata {
            model: self.descriptor.model.clone(),
            reference_doc_id,
            evaluated_doc_id,
            timestamp,
        });

        Ok(EvaluatedDocument { metadata, content }.stamp_at(&self.descriptor, timestamp))
    }
}

impl<L: LlmProvider> Agent for Evaluator<L> {
    fn kind(&self) -> AgentKind {
        AgentKind::Evaluation
    }

    fn descriptor(&self) -> &AgentDescriptor {
        &self.descriptor
    }
}
