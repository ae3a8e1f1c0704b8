//! Provenance tracking
//!
//! Every stage that should be auditable appends an [`AgentEvent`] to the
//! document it touched. The log is append-only: [`ProvenanceLog::append`] is
//! its only mutator, so events recorded earlier are never rewritten.

use crate::document::DocumentMetadata;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single agent invocation recorded against a document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentEvent {
    /// Agent name (e.g., "Dimension Extractor Agent")
    pub name: String,

    /// Agent version
    pub version: String,

    /// Model that backed the agent
    pub model: String,

    /// When the event was recorded
    #[serde(with = "crate::timestamp")]
    pub timestamp: DateTime<Utc>,
}

/// Identity of an agent: what gets written into an [`AgentEvent`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentDescriptor {
    /// Agent name
    pub name: String,
    /// Agent version
    pub version: String,
    /// Model identifier
    pub model: String,
}

impl AgentDescriptor {
    /// Create a new descriptor
    pub fn new(name: impl Into<String>, version: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            model: model.into(),
        }
    }

    /// Build the event this agent records at `timestamp`
    pub fn event_at(&self, timestamp: DateTime<Utc>) -> AgentEvent {
        AgentEvent {
            name: self.name.clone(),
            version: self.version.clone(),
            model: self.model.clone(),
            timestamp,
        }
    }
}

/// Ordered, append-only sequence of agent events
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProvenanceLog(Vec<AgentEvent>);

impl ProvenanceLog {
    /// Create an empty log
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an event at the end of the log
    pub fn append(&mut self, event: AgentEvent) {
        self.0.push(event);
    }

    /// Number of recorded events
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether nothing has been recorded yet
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate events in the order they were recorded
    pub fn iter(&self) -> impl Iterator<Item = &AgentEvent> {
        self.0.iter()
    }

    /// Most recent event
    pub fn last(&self) -> Option<&AgentEvent> {
        self.0.last()
    }

    /// Events as a slice
    pub fn as_slice(&self) -> &[AgentEvent] {
        &self.0
    }
}

/// Evaluation block written by the evaluator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationMetadata {
    /// Model that scored the record
    pub model: String,

    /// Document id of the gold reference
    pub reference_doc_id: String,

    /// Document id of the predicted record
    pub evaluated_doc_id: String,

    /// When the evaluation ran
    #[serde(with = "crate::timestamp")]
    pub timestamp: DateTime<Utc>,
}

pub(crate) mod sealed {
    use crate::document::DocumentMetadata;

    /// Write access to the metadata, reachable only from this crate
    pub trait Stampable {
        fn metadata_mut(&mut self) -> &mut DocumentMetadata;
    }
}

/// Values that carry document metadata and can therefore be stamped
///
/// Stamping consumes the value and hands it back, so a document has a single
/// writer at a time. The trait is sealed: only this crate's document types
/// implement it.
pub trait Provenanced: Sized + sealed::Stampable {
    /// Metadata carried by the value
    fn metadata(&self) -> &DocumentMetadata;

    /// Append an event for `agent` with the current time
    fn stamp(self, agent: &AgentDescriptor) -> Self {
        self.stamp_at(agent, Utc::now())
    }

    /// Append an event for `agent` with an explicit time
    fn stamp_at(mut self, agent: &AgentDescriptor, timestamp: DateTime<Utc>) -> Self {
        sealed::Stampable::metadata_mut(&mut self)
            .agents
            .append(agent.event_at(timestamp));
        self
    }
}

/// Append one agent event to `document`
pub fn stamp<D: Provenanced>(
    document: D,
    agent_name: &str,
    agent_version: &str,
    agent_model: &str,
) -> D {
    document.stamp(&AgentDescriptor::new(agent_name, agent_version, agent_model))
}
