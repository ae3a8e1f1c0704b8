//! Agent identity and the bounded model call shared by all agents

use crate::error::ExtractorError;
use dimex_domain::traits::{LlmProvider, LlmRequest};
use dimex_domain::AgentDescriptor;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, warn};

/// The kinds of agent in the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgentKind {
    /// Extracts dimensions from a chunked document
    DimensionExtraction,
    /// Scores a predicted record against a reference
    Evaluation,
}

/// An agent: a named, versioned capability backed by one model
///
/// Each kind adds its own capability method
/// ([`crate::DimensionExtractor::extract`], [`crate::Evaluator::evaluate`]).
pub trait Agent {
    /// What this agent does
    fn kind(&self) -> AgentKind;

    /// Name, version and model recorded when the agent stamps a document
    fn descriptor(&self) -> &AgentDescriptor;
}

/// Invoke the model once, bounded by `limit`, and return the candidate text
pub(crate) async fn call_model<L: LlmProvider>(
    llm: &L,
    request: &LlmRequest,
    limit: Duration,
) -> Result<String, ExtractorError> {
    debug!(
        model = %llm.model_name(),
        max_turns = request.max_turns,
        concurrency_limit = request.concurrency_limit,
        "Invoking model"
    );

    let response = timeout(limit, llm.invoke(request))
        .await
        .map_err(|_| {
            warn!(model = %llm.model_name(), timeout = ?limit, "Model call timed out");
            ExtractorError::Timeout(limit)
        })?
        .map_err(|e| ExtractorError::Llm(e.to_string()))?;

    Ok(response.into_text())
}
