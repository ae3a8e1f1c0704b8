//! Schema registry
//!
//! The closed record shapes that prompts advertise and parsers target, plus
//! the vocabularies of the enum-like extraction fields.
//!
//! Vocabulary membership is advisory: records carry plain strings and
//! [`ExtractionRecord::vocabulary_violations`] is available for callers that
//! want to enforce it.

use crate::error::DomainError;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{json, Value};
use std::collections::BTreeMap;

/// The six DCM capabilities
pub const DCM_CAPABILITIES: [&str; 6] = [
    "Connected Customer",
    "Product Development",
    "Synchronized Planning",
    "Intelligent Supply",
    "Smart Operations",
    "Dynamic Fulfillment",
];

/// The six SCOR processes
pub const SCOR_PROCESSES: [&str; 6] = ["Plan", "Source", "Make", "Deliver", "Return", "Enable"];

/// SCRM risk areas, including the "None" sentinel
pub const SCRM_AREAS: [&str; 6] = [
    "Supply Risk",
    "Demand Risk",
    "Operational Risk",
    "Cyber/Information Risk",
    "Sustainability/Regulatory Risk",
    "None",
];

/// Sector used when a paper has no specific industry application
pub const GENERAL_SECTOR: &str = "General";

/// Dimensions extracted from one research paper
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionRecord {
    /// One of [`DCM_CAPABILITIES`]
    pub dcm_capability: String,

    /// One of [`SCOR_PROCESSES`]
    pub scor_process: String,

    /// One of [`SCRM_AREAS`], if the paper addresses risk at all
    #[serde(default)]
    pub scrm_area: Option<String>,

    /// One-sentence problem statement
    pub problem_description: String,

    /// Nature of the AI technology used
    pub ai_technology_nature: String,

    /// Industry of application, or [`GENERAL_SECTOR`]
    pub industry_sector: String,
}

impl ExtractionRecord {
    /// Enum-like fields whose values fall outside their vocabulary
    ///
    /// Matching ignores ASCII case and surrounding whitespace.
    pub fn vocabulary_violations(&self) -> Vec<String> {
        let mut violations = Vec::new();
        if !in_vocabulary(&self.dcm_capability, &DCM_CAPABILITIES) {
            violations.push(format!("dcm_capability '{}' is not a DCM capability", self.dcm_capability));
        }
        if !in_vocabulary(&self.scor_process, &SCOR_PROCESSES) {
            violations.push(format!("scor_process '{}' is not a SCOR process", self.scor_process));
        }
        if let Some(area) = &self.scrm_area {
            if !in_vocabulary(area, &SCRM_AREAS) {
                violations.push(format!("scrm_area '{}' is not an SCRM area", area));
            }
        }
        violations
    }
}

fn in_vocabulary(value: &str, vocabulary: &[&str]) -> bool {
    let value = value.trim();
    vocabulary.iter().any(|v| v.eq_ignore_ascii_case(value))
}

/// Failure-shaped output: why parsing failed and what the model said
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DegradedRecord {
    /// Failure reason
    pub error: String,

    /// Model text exactly as received
    pub raw_output: String,
}

impl DegradedRecord {
    /// Create a degraded record
    pub fn new(error: impl Into<String>, raw_output: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            raw_output: raw_output.into(),
        }
    }
}

/// Result of an extraction: exactly one of a record or a degraded record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ExtractionOutcome {
    /// The response matched the schema
    Parsed(ExtractionRecord),
    /// The response did not match the schema
    Degraded(DegradedRecord),
}

impl ExtractionOutcome {
    /// Whether a record was produced
    pub fn is_parsed(&self) -> bool {
        matches!(self, ExtractionOutcome::Parsed(_))
    }

    /// The record, if any
    pub fn record(&self) -> Option<&ExtractionRecord> {
        match self {
            ExtractionOutcome::Parsed(record) => Some(record),
            ExtractionOutcome::Degraded(_) => None,
        }
    }
}

/// Score for one field of a predicted record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldEvaluation {
    /// Agreement with the reference, in [0, 1]
    pub score: f64,

    /// Optional qualitative sub-scores (semantic, factual, completeness...)
    #[serde(default, deserialize_with = "null_as_default")]
    pub subdimension_scores: BTreeMap<String, f64>,

    /// Free-text notes, typically when the score is below 1
    #[serde(default, deserialize_with = "null_as_default")]
    pub notes: Vec<String>,
}

impl FieldEvaluation {
    /// A bare score with no sub-scores or notes
    pub fn new(score: f64) -> Self {
        Self {
            score,
            subdimension_scores: BTreeMap::new(),
            notes: Vec::new(),
        }
    }
}

/// Field-by-field evaluation of a predicted record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationRecord {
    /// Mean of the field scores; absent when there are no fields
    #[serde(default)]
    pub overall_score: Option<f64>,

    /// Scores keyed by field name
    pub fields: BTreeMap<String, FieldEvaluation>,
}

impl EvaluationRecord {
    /// Build a record from field scores, computing the overall score
    pub fn from_fields(fields: BTreeMap<String, FieldEvaluation>) -> Self {
        let mut record = Self {
            overall_score: None,
            fields,
        };
        record.compute_overall_score();
        record
    }

    /// Recompute `overall_score` as the arithmetic mean of the field scores
    pub fn compute_overall_score(&mut self) {
        self.overall_score = if self.fields.is_empty() {
            None
        } else {
            let total: f64 = self.fields.values().map(|f| f.score).sum();
            Some(total / self.fields.len() as f64)
        };
    }

    /// Check every score (and sub-score) is a finite value in [0, 1]
    pub fn validate(&self) -> Result<(), DomainError> {
        for (name, field) in &self.fields {
            if !unit_interval(field.score) {
                return Err(DomainError::SchemaViolation(format!(
                    "score for '{}' is {}, expected a value in [0, 1]",
                    name, field.score
                )));
            }
            for (sub, score) in &field.subdimension_scores {
                if !unit_interval(*score) {
                    return Err(DomainError::SchemaViolation(format!(
                        "subdimension '{}' of '{}' is {}, expected a value in [0, 1]",
                        sub, name, score
                    )));
                }
            }
        }
        Ok(())
    }
}

fn unit_interval(value: f64) -> bool {
    value.is_finite() && (0.0..=1.0).contains(&value)
}

/// Result of an evaluation: scores or a degraded record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EvaluationOutcome {
    /// The response matched the schema
    Scored(EvaluationRecord),
    /// The response did not match the schema
    Degraded(DegradedRecord),
}

impl EvaluationOutcome {
    /// The scores, if any
    pub fn record(&self) -> Option<&EvaluationRecord> {
        match self {
            EvaluationOutcome::Scored(record) => Some(record),
            EvaluationOutcome::Degraded(_) => None,
        }
    }
}

/// The record shapes a model can be asked to produce
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordSchema {
    /// [`ExtractionRecord`]
    Extraction,
    /// [`EvaluationRecord`]
    Evaluation,
}

impl RecordSchema {
    /// Schema title
    pub fn title(self) -> &'static str {
        match self {
            RecordSchema::Extraction => "Dimensions",
            RecordSchema::Evaluation => "EvaluationResult",
        }
    }

    /// JSON Schema description of the record
    pub fn json_schema(self) -> Value {
        match self {
            RecordSchema::Extraction => {
                let scrm_area: Vec<Value> = SCRM_AREAS
                    .iter()
                    .map(|area| Value::from(*area))
                    .chain(std::iter::once(Value::Null))
                    .collect();
                json!({
                    "title": self.title(),
                    "type": "object",
                    "properties": {
                        "dcm_capability": {
                            "type": "string",
                            "enum": DCM_CAPABILITIES,
                            "description": "The DCM capability that is the paper's main focus"
                        },
                        "scor_process": {
                            "type": "string",
                            "enum": SCOR_PROCESSES,
                            "description": "Primary process addressed, per the SCOR model"
                        },
                        "scrm_area": {
                            "type": ["string", "null"],
                            "enum": scrm_area,
                            "description": "Type of supply chain risk management addressed, if any"
                        },
                        "problem_description": {
                            "type": "string",
                            "description": "One sentence describing the problem or research gap addressed"
                        },
                        "ai_technology_nature": {
                            "type": "string",
                            "description": "Nature of the AI technology used (e.g., machine learning, optimization, simulation)"
                        },
                        "industry_sector": {
                            "type": "string",
                            "description": "Industry of application (e.g., automotive, pharmaceutical), or \"General\""
                        }
                    },
                    "required": [
                        "dcm_capability",
                        "scor_process",
                        "problem_description",
                        "ai_technology_nature",
                        "industry_sector"
                    ]
                })
            }
            RecordSchema::Evaluation => json!({
                "title": self.title(),
                "type": "object",
                "properties": {
                    "overall_score": {
                        "type": ["number", "null"],
                        "description": "Average score across fields"
                    },
                    "fields": {
                        "type": "object",
                        "description": "Evaluation per field of the evaluated document",
                        "additionalProperties": {
                            "type": "object",
                            "properties": {
                                "score": {
                                    "type": "number",
                                    "minimum": 0.0,
                                    "maximum": 1.0,
                                    "description": "Score between 0 and 1"
                                },
                                "subdimension_scores": {
                                    "type": "object",
                                    "additionalProperties": {"type": "number"},
                                    "description": "Optional scores per subdimension, e.g., semantic, factual, completeness"
                                },
                                "notes": {
                                    "type": "array",
                                    "items": {"type": "string"},
                                    "description": "Optional list of notes if score < 1"
                                }
                            },
                            "required": ["score"]
                        }
                    }
                },
                "required": ["fields"]
            }),
        }
    }

    /// Instructions appended to a prompt telling the model how to answer
    pub fn format_instructions(self) -> String {
        // Pretty printing a json! value cannot fail
        let schema = serde_json::to_string_pretty(&self.json_schema()).unwrap_or_default();
        format!(
            "The output must be a single JSON object that conforms to the JSON schema below. \
             Do not add commentary before or after the object.\n\n\
             Here is the output schema:\n```\n{}\n```",
            schema
        )
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
